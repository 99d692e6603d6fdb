//! Constraint definitions and descriptor construction.
//!
//! A [`ConstraintDefinition`] plays the role of a constraint annotation type:
//! it names the attributes with their defaults, the default message, the
//! validators implementing the constraint and the constraints it is composed
//! of. [`ConstraintDefinitions::build_descriptor`] turns a declared
//! [`ConstraintAnnotation`] into a resolved [`ConstraintDescriptor`].

use crate::builtin;
use crate::constraint_validator::{ValidatorDescriptor, ValidatorTarget};
use constraints_core::{
    AttributeValue, CompositionType, ConstraintAnnotation, ConstraintDescriptor, ConstraintLocationKind,
    ConstraintTarget, Group, Result, ValidationError, attributes,
};
use constraints_mapping::ConstraintDefinitionMapping;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

const MAX_COMPOSITION_DEPTH: usize = 16;

/// Pushes a composer attribute down into a composing constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeOverride {
    /// Attribute of the composed constraint
    pub name: String,
    /// Attribute of the composing constraint receiving the value
    pub target: String,
}

impl AttributeOverride {
    /// Overrides `target` on the composing constraint with `name`.
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

/// A constraint a definition is composed of.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposingConstraint {
    /// The composing constraint as declared on the definition
    pub annotation: ConstraintAnnotation,
    /// Attributes taken from the composed constraint
    pub overrides: Vec<AttributeOverride>,
}

/// Definition of a constraint kind.
///
/// # Example
///
/// ```rust
/// use constraints_core::ConstraintAnnotation;
/// use constraints_validator::{AttributeOverride, ConstraintDefinition};
///
/// let zip = ConstraintDefinition::new("ZipCode", "{zip.invalid}")
///     .attribute("length", 5)
///     .composed_of(ConstraintAnnotation::new("NotNull"))
///     .composed_of_with_overrides(
///         ConstraintAnnotation::new("Size"),
///         vec![
///             AttributeOverride::new("length", "min"),
///             AttributeOverride::new("length", "max"),
///         ],
///     )
///     .report_as_single_violation();
/// assert_eq!(zip.composing.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ConstraintDefinition {
    /// Constraint kind
    pub kind: String,
    /// Default message template
    pub default_message: String,
    /// Declared attributes with their defaults
    pub default_attributes: BTreeMap<String, AttributeValue>,
    /// Attributes without default that must be given
    pub required_attributes: Vec<String>,
    /// Composing constraints
    pub composing: Vec<ComposingConstraint>,
    /// Report composing failures as one violation
    pub report_as_single_violation: bool,
    /// How composing results are combined
    pub composition_type: CompositionType,
    /// Implementations
    pub validators: Vec<ValidatorDescriptor>,
}

impl ConstraintDefinition {
    /// Creates a definition with a default message and no attributes.
    pub fn new(kind: impl Into<String>, default_message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            default_message: default_message.into(),
            default_attributes: BTreeMap::new(),
            required_attributes: Vec::new(),
            composing: Vec::new(),
            report_as_single_violation: false,
            composition_type: CompositionType::And,
            validators: Vec::new(),
        }
    }

    /// Declares an attribute with its default.
    pub fn attribute(mut self, name: impl Into<String>, default: impl Into<AttributeValue>) -> Self {
        self.default_attributes.insert(name.into(), default.into());
        self
    }

    /// Declares an attribute that must be given explicitly.
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.required_attributes.push(name.into());
        self
    }

    /// Adds an implementation.
    pub fn validated_by(mut self, validator: ValidatorDescriptor) -> Self {
        self.validators.push(validator);
        self
    }

    /// Adds a composing constraint.
    pub fn composed_of(self, annotation: ConstraintAnnotation) -> Self {
        self.composed_of_with_overrides(annotation, Vec::new())
    }

    /// Adds a composing constraint receiving attributes of this one.
    pub fn composed_of_with_overrides(
        mut self,
        annotation: ConstraintAnnotation,
        overrides: Vec<AttributeOverride>,
    ) -> Self {
        self.composing.push(ComposingConstraint { annotation, overrides });
        self
    }

    /// Reports composing failures as a single violation of this constraint.
    pub fn report_as_single_violation(mut self) -> Self {
        self.report_as_single_violation = true;
        self
    }

    /// Sets how composing results are combined.
    pub fn composition(mut self, composition_type: CompositionType) -> Self {
        self.composition_type = composition_type;
        self
    }

    /// Implementations for one target.
    pub fn validators_for(&self, target: ValidatorTarget) -> impl Iterator<Item = &ValidatorDescriptor> {
        self.validators.iter().filter(move |v| v.target() == target)
    }

    /// Returns true if the definition has implementations for `target`.
    pub fn has_validators_for(&self, target: ValidatorTarget) -> bool {
        self.validators_for(target).next().is_some()
    }

    fn declares(&self, attribute: &str) -> bool {
        self.default_attributes.contains_key(attribute) || self.required_attributes.iter().any(|a| a == attribute)
    }
}

/// All known constraint definitions and the validators registered by id.
#[derive(Debug, Clone, Default)]
pub struct ConstraintDefinitions {
    definitions: HashMap<String, Arc<ConstraintDefinition>>,
    validators: HashMap<String, ValidatorDescriptor>,
}

impl ConstraintDefinitions {
    /// Creates an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in constraints.
    pub fn with_builtins() -> Self {
        let mut definitions = Self::new();
        for definition in builtin::definitions() {
            definitions.register(definition);
        }
        definitions
    }

    /// Registers or replaces a definition. Its validators become
    /// addressable by id.
    pub fn register(&mut self, definition: ConstraintDefinition) {
        for validator in &definition.validators {
            self.validators.insert(validator.id().to_string(), validator.clone());
        }
        self.definitions.insert(definition.kind.clone(), Arc::new(definition));
    }

    /// Registers a validator so mappings can reference it by id.
    pub fn register_validator(&mut self, validator: ValidatorDescriptor) {
        self.validators.insert(validator.id().to_string(), validator);
    }

    /// Looks up a definition.
    pub fn get(&self, kind: &str) -> Result<&Arc<ConstraintDefinition>> {
        self.definitions
            .get(kind)
            .ok_or_else(|| ValidationError::declaration(format!("Unknown constraint '{}'", kind)))
    }

    /// Returns true if `kind` is defined.
    pub fn contains(&self, kind: &str) -> bool {
        self.definitions.contains_key(kind)
    }

    /// Applies a validator redefinition from a mapping.
    pub fn apply_mapping(&mut self, mapping: &ConstraintDefinitionMapping) -> Result<()> {
        let mut definition = ConstraintDefinition::clone(self.get(&mapping.annotation)?);
        if !mapping.include_existing_validators {
            definition.validators.clear();
        }
        for id in &mapping.validators {
            let validator = self.validators.get(id).ok_or_else(|| {
                ValidationError::declaration(format!(
                    "Unknown validator '{}' referenced by the definition of '{}'",
                    id, mapping.annotation
                ))
            })?;
            if !definition.validators.contains(validator) {
                definition.validators.push(validator.clone());
            }
        }
        debug!(
            constraint = %mapping.annotation,
            validators = definition.validators.len(),
            "Redefined constraint validators"
        );
        self.register(definition);
        Ok(())
    }

    /// Resolves a declared constraint into a descriptor.
    ///
    /// # Arguments
    ///
    /// * `annotation` - The declared constraint
    /// * `location_kind` - Kind of element the constraint is declared on
    /// * `hosting_class` - Class declaring the constraint; its group is added
    ///   to constraints of the `Default` group
    pub fn build_descriptor(
        &self,
        annotation: &ConstraintAnnotation,
        location_kind: ConstraintLocationKind,
        hosting_class: &str,
    ) -> Result<Arc<ConstraintDescriptor>> {
        let mut groups = if annotation.groups.is_empty() {
            vec![Group::default_group()]
        } else {
            annotation.groups.clone()
        };
        if groups.iter().any(Group::is_default) && !groups.iter().any(|g| g.name() == hosting_class) {
            groups.push(Group::new(hosting_class));
        }
        let target = self.validation_target(annotation, location_kind)?;
        self.descriptor(annotation, location_kind, target, groups, annotation.payload.clone(), 0)
    }

    fn validation_target(
        &self,
        annotation: &ConstraintAnnotation,
        location_kind: ConstraintLocationKind,
    ) -> Result<ConstraintTarget> {
        let cross_parameter = location_kind == ConstraintLocationKind::CrossParameter;
        match (annotation.validation_applies_to, cross_parameter) {
            (ConstraintTarget::Implicit, true) | (ConstraintTarget::Parameters, true) => Ok(ConstraintTarget::Parameters),
            (ConstraintTarget::Implicit, false) | (ConstraintTarget::AnnotatedElement, false) => {
                Ok(ConstraintTarget::AnnotatedElement)
            }
            (declared, _) => Err(ValidationError::declaration(format!(
                "Constraint '{}' declares validation target {:?} on a {:?} location",
                annotation.kind, declared, location_kind
            ))),
        }
    }

    fn descriptor(
        &self,
        annotation: &ConstraintAnnotation,
        location_kind: ConstraintLocationKind,
        target: ConstraintTarget,
        groups: Vec<Group>,
        payload: Vec<String>,
        depth: usize,
    ) -> Result<Arc<ConstraintDescriptor>> {
        if depth > MAX_COMPOSITION_DEPTH {
            return Err(ValidationError::declaration(format!(
                "Constraint '{}' is composed of itself",
                annotation.kind
            )));
        }
        let definition = self.get(&annotation.kind)?;

        // 1. Attributes: defaults, then explicit values
        let mut attributes = definition.default_attributes.clone();
        for (name, value) in &annotation.attributes {
            if name != attributes::MESSAGE && !definition.declares(name) {
                return Err(ValidationError::declaration(format!(
                    "Constraint '{}' has no attribute '{}'",
                    annotation.kind, name
                )));
            }
            attributes.insert(name.clone(), value.clone());
        }
        if let Some(missing) = definition
            .required_attributes
            .iter()
            .find(|a| !attributes.contains_key(*a))
        {
            return Err(ValidationError::declaration(format!(
                "Constraint '{}' requires attribute '{}'",
                annotation.kind, missing
            )));
        }

        // 2. Validators for the target, unless purely composed
        let validator_target = match target {
            ConstraintTarget::Parameters => ValidatorTarget::CrossParameter,
            _ => ValidatorTarget::Generic,
        };
        if !definition.validators.is_empty() && !definition.has_validators_for(validator_target) {
            return Err(ValidationError::declaration(format!(
                "Constraint '{}' has no {} validator",
                annotation.kind,
                match validator_target {
                    ValidatorTarget::CrossParameter => "cross-parameter",
                    ValidatorTarget::Generic => "generic",
                }
            )));
        }

        // 3. Composition
        if definition.composition_type != CompositionType::And && !definition.report_as_single_violation {
            return Err(ValidationError::declaration(format!(
                "Constraint '{}' combines its composing constraints with {:?} and must report a single violation",
                annotation.kind, definition.composition_type
            )));
        }
        let mut composing = Vec::with_capacity(definition.composing.len());
        for part in &definition.composing {
            let child = self.composing_annotation(definition, part, &attributes)?;
            composing.push(self.descriptor(&child, location_kind, target, groups.clone(), payload.clone(), depth + 1)?);
        }

        let message_template = annotation
            .message
            .clone()
            .or_else(|| attributes.get(attributes::MESSAGE).and_then(|m| m.as_text().map(String::from)))
            .unwrap_or_else(|| definition.default_message.clone());

        Ok(Arc::new(ConstraintDescriptor {
            kind: annotation.kind.clone(),
            attributes,
            message_template,
            groups,
            payload,
            validation_applies_to: target,
            composing,
            report_as_single_violation: definition.report_as_single_violation,
            composition_type: definition.composition_type,
            location_kind,
        }))
    }

    fn composing_annotation(
        &self,
        composer: &ConstraintDefinition,
        part: &ComposingConstraint,
        composer_attributes: &BTreeMap<String, AttributeValue>,
    ) -> Result<ConstraintAnnotation> {
        let mut child = part.annotation.clone();
        let child_definition = self.get(&child.kind)?;
        for o in &part.overrides {
            let value = composer_attributes.get(&o.name).ok_or_else(|| {
                ValidationError::declaration(format!(
                    "Override of '{}' on '{}' refers to unknown attribute '{}' of '{}'",
                    o.target, child.kind, o.name, composer.kind
                ))
            })?;
            if o.target == attributes::MESSAGE {
                child.message = value.as_text().map(String::from);
                continue;
            }
            if !child_definition.declares(&o.target) {
                return Err(ValidationError::declaration(format!(
                    "Override of '{}' on '{}' refers to an unknown attribute",
                    o.target, child.kind
                )));
            }
            child.attributes.insert(o.target.clone(), value.clone());
        }
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn zip_code() -> ConstraintDefinition {
        ConstraintDefinition::new("ZipCode", "{zip.invalid}")
            .attribute("length", 5)
            .composed_of(ConstraintAnnotation::new("NotNull"))
            .composed_of_with_overrides(
                ConstraintAnnotation::new("Size"),
                vec![
                    AttributeOverride::new("length", "min"),
                    AttributeOverride::new("length", "max"),
                ],
            )
            .report_as_single_violation()
    }

    #[test]
    fn test_defaults_and_implicit_group() {
        let definitions = ConstraintDefinitions::with_builtins();
        let descriptor = definitions
            .build_descriptor(
                &ConstraintAnnotation::new("Size").attr("max", 3),
                ConstraintLocationKind::Field,
                "Order",
            )
            .unwrap();

        assert_eq!(descriptor.int_attribute("min"), Some(0));
        assert_eq!(descriptor.int_attribute("max"), Some(3));
        assert_eq!(descriptor.groups, vec![Group::default_group(), Group::new("Order")]);
        assert_eq!(descriptor.message_template, "{javax.validation.constraints.Size.message}");
        assert_eq!(descriptor.validation_applies_to, ConstraintTarget::AnnotatedElement);
    }

    #[test]
    fn test_explicit_groups_get_no_implicit_group() {
        let definitions = ConstraintDefinitions::with_builtins();
        let descriptor = definitions
            .build_descriptor(
                &ConstraintAnnotation::new("NotNull").groups(["Expensive"]),
                ConstraintLocationKind::Field,
                "Order",
            )
            .unwrap();
        assert_eq!(descriptor.groups, vec![Group::new("Expensive")]);
    }

    #[test]
    fn test_composing_overrides() {
        let mut definitions = ConstraintDefinitions::with_builtins();
        definitions.register(zip_code());

        let descriptor = definitions
            .build_descriptor(
                &ConstraintAnnotation::new("ZipCode").attr("length", 4).groups(["Postal"]),
                ConstraintLocationKind::Field,
                "Address",
            )
            .unwrap();

        assert!(descriptor.report_as_single_violation);
        let size = &descriptor.composing[1];
        assert_eq!(size.int_attribute("min"), Some(4));
        assert_eq!(size.int_attribute("max"), Some(4));
        assert_eq!(size.groups, vec![Group::new("Postal")]);
    }

    #[test]
    fn test_unknown_override_target_is_rejected() {
        let mut definitions = ConstraintDefinitions::with_builtins();
        definitions.register(
            ConstraintDefinition::new("Broken", "{broken}")
                .attribute("length", 5)
                .composed_of_with_overrides(
                    ConstraintAnnotation::new("Size"),
                    vec![AttributeOverride::new("length", "width")],
                ),
        );
        let result = definitions.build_descriptor(
            &ConstraintAnnotation::new("Broken"),
            ConstraintLocationKind::Field,
            "Address",
        );
        assert!(matches!(result, Err(ValidationError::ConstraintDeclaration(_))));
    }

    #[test]
    fn test_unknown_attribute_and_missing_required() {
        let definitions = ConstraintDefinitions::with_builtins();
        let unknown = definitions.build_descriptor(
            &ConstraintAnnotation::new("NotNull").attr("max", 1),
            ConstraintLocationKind::Field,
            "Order",
        );
        assert!(matches!(unknown, Err(ValidationError::ConstraintDeclaration(_))));

        let missing = definitions.build_descriptor(
            &ConstraintAnnotation::new("Pattern"),
            ConstraintLocationKind::Field,
            "Order",
        );
        assert!(matches!(missing, Err(ValidationError::ConstraintDeclaration(_))));
    }

    #[test]
    fn test_or_composition_requires_single_violation() {
        let mut definitions = ConstraintDefinitions::with_builtins();
        definitions.register(
            ConstraintDefinition::new("EitherOr", "{either}")
                .composed_of(ConstraintAnnotation::new("Null"))
                .composed_of(ConstraintAnnotation::new("NotBlank"))
                .composition(CompositionType::Or),
        );
        let result = definitions.build_descriptor(
            &ConstraintAnnotation::new("EitherOr"),
            ConstraintLocationKind::Field,
            "Order",
        );
        assert!(matches!(result, Err(ValidationError::ConstraintDeclaration(_))));
    }

    #[test]
    fn test_cross_parameter_target() {
        let definitions = ConstraintDefinitions::with_builtins();
        let script = ConstraintAnnotation::new("ParameterScriptAssert")
            .attr("lang", "expression")
            .attr("script", "start < end");
        let descriptor = definitions
            .build_descriptor(&script, ConstraintLocationKind::CrossParameter, "Rental")
            .unwrap();
        assert!(descriptor.is_cross_parameter());

        let not_null_on_arguments =
            definitions.build_descriptor(&ConstraintAnnotation::new("NotNull"), ConstraintLocationKind::CrossParameter, "Rental");
        assert!(matches!(not_null_on_arguments, Err(ValidationError::ConstraintDeclaration(_))));

        let explicit_parameters_on_field = definitions.build_descriptor(
            &ConstraintAnnotation::new("NotNull").applies_to(ConstraintTarget::Parameters),
            ConstraintLocationKind::Field,
            "Rental",
        );
        assert!(explicit_parameters_on_field.is_err());
    }

    #[test]
    fn test_apply_mapping() {
        let mut definitions = ConstraintDefinitions::with_builtins();
        let before = definitions.get("Positive").unwrap().validators.len();
        definitions
            .apply_mapping(&ConstraintDefinitionMapping::new("Positive").include_existing_validators(false))
            .unwrap();
        assert_eq!(definitions.get("Positive").unwrap().validators.len(), 0);
        assert!(before > 0);

        let unknown = definitions.apply_mapping(&ConstraintDefinitionMapping::new("Positive").validated_by("nope"));
        assert!(matches!(unknown, Err(ValidationError::ConstraintDeclaration(_))));
    }
}
