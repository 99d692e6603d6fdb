//! Constraint mappings.
//!
//! A [`TypeMapping`] adds constraints, cascades and group conversions to an
//! existing class and can switch off the declarations made on the class
//! itself (`ignore_annotations`). The same structure is produced by parsing
//! a [`crate::MappingDocument`] and by building a [`ConstraintMapping`] in
//! code.

use constraints_core::{
    ConstraintAnnotation, ContainerElementDecl, ElementDecl, Group, GroupConversion, TypeRef,
};
use serde::{Deserialize, Serialize};

/// Redefinition of the validators of a constraint kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDefinitionMapping {
    /// Constraint kind
    pub annotation: String,

    /// Keep the validators already registered for the kind
    #[serde(default = "default_true")]
    pub include_existing_validators: bool,

    /// Ids of registered validators to add
    #[serde(default)]
    pub validators: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl ConstraintDefinitionMapping {
    /// Creates a definition mapping that keeps the existing validators.
    pub fn new(annotation: impl Into<String>) -> Self {
        Self {
            annotation: annotation.into(),
            include_existing_validators: true,
            validators: Vec::new(),
        }
    }

    /// Adds a validator id.
    pub fn validated_by(mut self, validator: impl Into<String>) -> Self {
        self.validators.push(validator.into());
        self
    }

    /// Sets whether existing validators are kept.
    pub fn include_existing_validators(mut self, include: bool) -> Self {
        self.include_existing_validators = include;
        self
    }
}

/// Class-level part of a type mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassLevelMapping {
    /// Ignore class-level constraints declared on the class
    #[serde(default)]
    pub ignore_annotations: Option<bool>,

    /// Class-level constraints
    #[serde(default)]
    pub constraints: Vec<ConstraintAnnotation>,

    /// Redefined default group sequence
    #[serde(default)]
    pub group_sequence: Option<Vec<Group>>,
}

/// Mapping of a field or getter property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMapping {
    /// Field or property name
    pub name: String,

    /// Ignore declarations made on the member itself
    #[serde(default)]
    pub ignore_annotations: Option<bool>,

    /// Constraints, cascading and conversions
    #[serde(flatten)]
    pub element: ElementDecl,
}

impl PropertyMapping {
    /// Creates an empty property mapping.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the ignore-annotations flag.
    pub fn ignore_annotations(mut self, ignore: bool) -> Self {
        self.ignore_annotations = Some(ignore);
        self
    }

    /// Adds a constraint.
    pub fn constraint(mut self, constraint: ConstraintAnnotation) -> Self {
        self.element.constraints.push(constraint);
        self
    }

    /// Marks the property as cascaded.
    pub fn valid(mut self) -> Self {
        self.element.cascade = true;
        self
    }

    /// Adds a group conversion.
    pub fn convert_group(mut self, from: impl Into<Group>, to: impl Into<Group>) -> Self {
        self.element.group_conversions.push(GroupConversion::new(from, to));
        self
    }

    /// Adds a type-argument declaration.
    pub fn container_element(mut self, element: ContainerElementDecl) -> Self {
        self.element.container_elements.push(element);
        self
    }
}

/// Mapping of one parameter, identified by its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMapping {
    /// Declared type, used to find the executable
    #[serde(rename = "type")]
    pub declared_type: TypeRef,

    /// Ignore declarations made on the parameter itself
    #[serde(default)]
    pub ignore_annotations: Option<bool>,

    /// Constraints, cascading and conversions
    #[serde(flatten)]
    pub element: ElementDecl,
}

/// Mapping of a return value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnValueMapping {
    /// Ignore declarations made on the return value itself
    #[serde(default)]
    pub ignore_annotations: Option<bool>,

    /// Constraints, cascading and conversions
    #[serde(flatten)]
    pub element: ElementDecl,
}

/// Mapping of cross-parameter constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossParameterMapping {
    /// Ignore cross-parameter constraints declared on the executable
    #[serde(default)]
    pub ignore_annotations: Option<bool>,

    /// Cross-parameter constraints
    #[serde(default)]
    pub constraints: Vec<ConstraintAnnotation>,
}

/// Mapping of a method or constructor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutableMapping {
    /// Method name; absent for constructors
    #[serde(default)]
    pub name: Option<String>,

    /// Ignore declarations made on the executable itself
    #[serde(default)]
    pub ignore_annotations: Option<bool>,

    /// One entry per parameter, in order
    #[serde(default)]
    pub parameters: Vec<ParameterMapping>,

    /// Return value mapping
    #[serde(default)]
    pub return_value: Option<ReturnValueMapping>,

    /// Cross-parameter mapping
    #[serde(default)]
    pub cross_parameter: Option<CrossParameterMapping>,
}

impl ExecutableMapping {
    /// Maps a method with the given parameter types.
    pub fn method(name: impl Into<String>, parameter_types: Vec<TypeRef>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::constructor(parameter_types)
        }
    }

    /// Maps a constructor with the given parameter types.
    pub fn constructor(parameter_types: Vec<TypeRef>) -> Self {
        Self {
            name: None,
            ignore_annotations: None,
            parameters: parameter_types
                .into_iter()
                .map(|declared_type| ParameterMapping {
                    declared_type,
                    ignore_annotations: None,
                    element: ElementDecl::default(),
                })
                .collect(),
            return_value: None,
            cross_parameter: None,
        }
    }

    /// Parameter types of the mapped executable.
    pub fn parameter_types(&self) -> Vec<TypeRef> {
        self.parameters
            .iter()
            .map(|p| p.declared_type.clone())
            .collect()
    }

    /// Sets the ignore-annotations flag.
    pub fn ignore_annotations(mut self, ignore: bool) -> Self {
        self.ignore_annotations = Some(ignore);
        self
    }

    fn parameter_mut(&mut self, index: usize) -> Option<&mut ParameterMapping> {
        let parameter = self.parameters.get_mut(index);
        if parameter.is_none() {
            tracing::warn!(index, "Ignoring mapping of a parameter beyond the executable's arity");
        }
        parameter
    }

    /// Adds a constraint to a parameter.
    pub fn parameter_constraint(mut self, index: usize, constraint: ConstraintAnnotation) -> Self {
        if let Some(parameter) = self.parameter_mut(index) {
            parameter.element.constraints.push(constraint);
        }
        self
    }

    /// Marks a parameter as cascaded.
    pub fn parameter_valid(mut self, index: usize) -> Self {
        if let Some(parameter) = self.parameter_mut(index) {
            parameter.element.cascade = true;
        }
        self
    }

    /// Sets the ignore-annotations flag of a parameter.
    pub fn parameter_ignore_annotations(mut self, index: usize, ignore: bool) -> Self {
        if let Some(parameter) = self.parameter_mut(index) {
            parameter.ignore_annotations = Some(ignore);
        }
        self
    }

    /// Adds a return value constraint.
    pub fn return_constraint(mut self, constraint: ConstraintAnnotation) -> Self {
        self.return_value
            .get_or_insert_with(ReturnValueMapping::default)
            .element
            .constraints
            .push(constraint);
        self
    }

    /// Marks the return value as cascaded.
    pub fn return_valid(mut self) -> Self {
        self.return_value
            .get_or_insert_with(ReturnValueMapping::default)
            .element
            .cascade = true;
        self
    }

    /// Adds a group conversion on the return value.
    pub fn return_convert_group(mut self, from: impl Into<Group>, to: impl Into<Group>) -> Self {
        self.return_value
            .get_or_insert_with(ReturnValueMapping::default)
            .element
            .group_conversions
            .push(GroupConversion::new(from, to));
        self
    }

    /// Adds a cross-parameter constraint.
    pub fn cross_parameter(mut self, constraint: ConstraintAnnotation) -> Self {
        self.cross_parameter
            .get_or_insert_with(CrossParameterMapping::default)
            .constraints
            .push(constraint);
        self
    }
}

/// Mapping of one class.
///
/// # Example
///
/// ```rust
/// use constraints_core::ConstraintAnnotation;
/// use constraints_mapping::{PropertyMapping, TypeMapping};
///
/// let order = TypeMapping::new("Order")
///     .field(PropertyMapping::new("amount").constraint(
///         ConstraintAnnotation::new("DecimalMin").attr("value", "0"),
///     ))
///     .default_group_sequence(["Order", "Expensive"]);
/// assert_eq!(order.fields.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeMapping {
    /// Mapped class
    #[serde(rename = "class")]
    pub class: String,

    /// Default for ignoring declarations made on the class's members
    #[serde(default)]
    pub ignore_annotations: Option<bool>,

    /// Class-level mapping
    #[serde(default)]
    pub class_level: Option<ClassLevelMapping>,

    /// Field mappings
    #[serde(default)]
    pub fields: Vec<PropertyMapping>,

    /// Getter mappings, by property name
    #[serde(default)]
    pub getters: Vec<PropertyMapping>,

    /// Constructor mappings
    #[serde(default)]
    pub constructors: Vec<ExecutableMapping>,

    /// Method mappings
    #[serde(default)]
    pub methods: Vec<ExecutableMapping>,
}

impl TypeMapping {
    /// Creates an empty mapping for `class`.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            ..Default::default()
        }
    }

    /// Sets the default ignore-annotations flag for the class.
    pub fn ignore_annotations(mut self, ignore: bool) -> Self {
        self.ignore_annotations = Some(ignore);
        self
    }

    /// Ignores class-level constraints declared on the class.
    pub fn ignore_class_level_annotations(mut self, ignore: bool) -> Self {
        self.class_level
            .get_or_insert_with(ClassLevelMapping::default)
            .ignore_annotations = Some(ignore);
        self
    }

    /// Adds a class-level constraint.
    pub fn class_constraint(mut self, constraint: ConstraintAnnotation) -> Self {
        self.class_level
            .get_or_insert_with(ClassLevelMapping::default)
            .constraints
            .push(constraint);
        self
    }

    /// Redefines the default group sequence.
    pub fn default_group_sequence<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Group>,
    {
        self.class_level
            .get_or_insert_with(ClassLevelMapping::default)
            .group_sequence = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a field mapping.
    pub fn field(mut self, field: PropertyMapping) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a getter mapping.
    pub fn getter(mut self, getter: PropertyMapping) -> Self {
        self.getters.push(getter);
        self
    }

    /// Adds a method mapping.
    pub fn method(mut self, method: ExecutableMapping) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a constructor mapping.
    pub fn constructor(mut self, constructor: ExecutableMapping) -> Self {
        self.constructors.push(constructor);
        self
    }
}

/// A set of mappings built in code.
///
/// # Example
///
/// ```rust
/// use constraints_core::ConstraintAnnotation;
/// use constraints_mapping::{ConstraintMapping, PropertyMapping, TypeMapping};
///
/// let mapping = ConstraintMapping::new().type_mapping(
///     TypeMapping::new("Customer")
///         .field(PropertyMapping::new("name").constraint(ConstraintAnnotation::new("NotBlank"))),
/// );
/// assert_eq!(mapping.types().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintMapping {
    types: Vec<TypeMapping>,
    definitions: Vec<ConstraintDefinitionMapping>,
}

impl ConstraintMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type mapping.
    pub fn type_mapping(mut self, mapping: TypeMapping) -> Self {
        self.types.push(mapping);
        self
    }

    /// Adds a constraint definition mapping.
    pub fn constraint_definition(mut self, definition: ConstraintDefinitionMapping) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Type mappings.
    pub fn types(&self) -> &[TypeMapping] {
        &self.types
    }

    /// Constraint definition mappings.
    pub fn definitions(&self) -> &[ConstraintDefinitionMapping] {
        &self.definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_executable_mapping_builder() {
        let mapping = ExecutableMapping::method("rent", vec![TypeRef::Text, TypeRef::Integer])
            .parameter_constraint(1, ConstraintAnnotation::new("Min").attr("value", 1))
            .parameter_valid(0)
            .parameter_constraint(5, ConstraintAnnotation::new("NotNull"))
            .return_constraint(ConstraintAnnotation::new("NotNull"))
            .cross_parameter(ConstraintAnnotation::new("ParameterScriptAssert"));

        assert_eq!(mapping.parameter_types(), vec![TypeRef::Text, TypeRef::Integer]);
        assert!(mapping.parameters[0].element.cascade);
        assert_eq!(mapping.parameters[1].element.constraints.len(), 1);
        assert_eq!(
            mapping.return_value.as_ref().map(|r| r.element.constraints.len()),
            Some(1)
        );
        assert_eq!(mapping.cross_parameter.map(|c| c.constraints.len()), Some(1));
    }

    #[test]
    fn test_type_mapping_builder() {
        let mapping = TypeMapping::new("Order")
            .ignore_annotations(true)
            .class_constraint(ConstraintAnnotation::new("ScriptAssert"))
            .default_group_sequence(["Order", "Expensive"])
            .getter(PropertyMapping::new("total").valid());

        let class_level = mapping.class_level.as_ref().unwrap();
        assert_eq!(class_level.constraints.len(), 1);
        assert_eq!(
            class_level.group_sequence,
            Some(vec![Group::new("Order"), Group::new("Expensive")])
        );
        assert_eq!(mapping.ignore_annotations, Some(true));
        assert!(mapping.getters[0].element.cascade);
    }
}
