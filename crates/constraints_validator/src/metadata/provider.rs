//! Metadata providers.
//!
//! A provider contributes a [`BeanConfiguration`] per class. The declared
//! provider reads class declarations from the [`ClassRegistry`]; the mapping
//! provider reads external and programmatic [`TypeMapping`]s. Mappings may
//! also switch off the declarations of the classes they map, which is
//! expressed through [`AnnotationProcessingOptions`].

use crate::metadata::{
    BeanConfiguration, CascadingMetadata, ConfigurationSource, ConstrainedExecutable, ConstrainedField,
    ConstrainedParameter, MetaConstraintBuilder,
};
use crate::plugins::GetterPropertySelectionStrategy;
use constraints_core::{
    ClassDescriptor, ClassRegistry, ConstraintLocation, ElementDecl, ExecutableDecl, ExecutableKind, Result,
    Signature, TypeRef, ValidationError,
};
use constraints_mapping::{ExecutableMapping, TypeMapping};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// A class member addressed by annotation processing options.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberKey {
    /// Field by name
    Field(String),
    /// Getter by property name
    Getter(String),
    /// Method or constructor by signature
    Executable(Signature),
}

/// Which declarations on classes are ignored.
///
/// A setting on a specific element wins over the setting of its member,
/// which wins over the setting of the type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationProcessingOptions {
    ignore_for_type: HashMap<String, bool>,
    ignore_class_level: HashMap<String, bool>,
    ignore_members: HashMap<(String, MemberKey), bool>,
    ignore_return_values: HashMap<(String, Signature), bool>,
    ignore_cross_parameter: HashMap<(String, Signature), bool>,
    ignore_parameters: HashMap<(String, Signature, usize), bool>,
}

impl AnnotationProcessingOptions {
    /// Ignores (or honours) every declaration on `class`.
    pub fn ignore_annotations_on_type(&mut self, class: &str, ignore: bool) {
        self.ignore_for_type.insert(class.to_string(), ignore);
    }

    /// Ignores (or honours) the class-level constraints of `class`.
    pub fn ignore_class_level_constraints(&mut self, class: &str, ignore: bool) {
        self.ignore_class_level.insert(class.to_string(), ignore);
    }

    /// Ignores (or honours) the declarations on a member.
    pub fn ignore_annotations_on_member(&mut self, class: &str, member: MemberKey, ignore: bool) {
        self.ignore_members.insert((class.to_string(), member), ignore);
    }

    /// Ignores (or honours) the return value declarations of an executable.
    pub fn ignore_annotations_on_return_value(&mut self, class: &str, executable: Signature, ignore: bool) {
        self.ignore_return_values.insert((class.to_string(), executable), ignore);
    }

    /// Ignores (or honours) the cross-parameter constraints of an executable.
    pub fn ignore_annotations_on_cross_parameter(&mut self, class: &str, executable: Signature, ignore: bool) {
        self.ignore_cross_parameter.insert((class.to_string(), executable), ignore);
    }

    /// Ignores (or honours) the declarations on a parameter.
    pub fn ignore_annotations_on_parameter(&mut self, class: &str, executable: Signature, index: usize, ignore: bool) {
        self.ignore_parameters.insert((class.to_string(), executable, index), ignore);
    }

    fn type_ignored(&self, class: &str) -> bool {
        self.ignore_for_type.get(class).copied().unwrap_or(false)
    }

    /// Returns true if the class-level constraints of `class` are ignored.
    pub fn are_class_level_constraints_ignored(&self, class: &str) -> bool {
        self.ignore_class_level
            .get(class)
            .copied()
            .unwrap_or_else(|| self.type_ignored(class))
    }

    /// Returns true if the declarations on a member are ignored.
    pub fn are_member_constraints_ignored(&self, class: &str, member: &MemberKey) -> bool {
        self.ignore_members
            .get(&(class.to_string(), member.clone()))
            .copied()
            .unwrap_or_else(|| self.type_ignored(class))
    }

    /// Returns true if the return value declarations are ignored.
    pub fn are_return_value_constraints_ignored(&self, class: &str, executable: &Signature) -> bool {
        self.ignore_return_values
            .get(&(class.to_string(), executable.clone()))
            .copied()
            .unwrap_or_else(|| self.are_member_constraints_ignored(class, &MemberKey::Executable(executable.clone())))
    }

    /// Returns true if the cross-parameter constraints are ignored.
    pub fn are_cross_parameter_constraints_ignored(&self, class: &str, executable: &Signature) -> bool {
        self.ignore_cross_parameter
            .get(&(class.to_string(), executable.clone()))
            .copied()
            .unwrap_or_else(|| self.are_member_constraints_ignored(class, &MemberKey::Executable(executable.clone())))
    }

    /// Returns true if the declarations on a parameter are ignored.
    pub fn are_parameter_constraints_ignored(&self, class: &str, executable: &Signature, index: usize) -> bool {
        self.ignore_parameters
            .get(&(class.to_string(), executable.clone(), index))
            .copied()
            .unwrap_or_else(|| self.are_member_constraints_ignored(class, &MemberKey::Executable(executable.clone())))
    }

    /// Merges `other` into `self`; settings of `other` win.
    pub fn merge(&mut self, other: &AnnotationProcessingOptions) {
        self.ignore_for_type.extend(other.ignore_for_type.clone());
        self.ignore_class_level.extend(other.ignore_class_level.clone());
        self.ignore_members.extend(other.ignore_members.clone());
        self.ignore_return_values.extend(other.ignore_return_values.clone());
        self.ignore_cross_parameter.extend(other.ignore_cross_parameter.clone());
        self.ignore_parameters.extend(other.ignore_parameters.clone());
    }
}

/// Source of bean configurations.
pub trait MetadataProvider: Send + Sync {
    /// Kind of configuration this provider contributes.
    fn source(&self) -> ConfigurationSource;

    /// Configuration of `class`, if this provider knows the class.
    fn configuration_for_class(&self, class: &str) -> Result<Option<BeanConfiguration>>;

    /// Declarations this provider switches off.
    fn annotation_processing_options(&self) -> AnnotationProcessingOptions {
        AnnotationProcessingOptions::default()
    }
}

fn constructor_signature(class: &ClassDescriptor, parameter_types: &[TypeRef]) -> Signature {
    let name = class
        .constructors()
        .map(|c| c.name.clone())
        .next()
        .unwrap_or_else(|| class.simple_name().to_string());
    Signature::new(name, parameter_types)
}

fn return_type_of(class: &ClassDescriptor, executable: &ExecutableDecl) -> Option<TypeRef> {
    match executable.kind {
        ExecutableKind::Constructor => Some(TypeRef::bean(class.name.clone())),
        ExecutableKind::Method => executable.return_type.clone(),
    }
}

/// Shared construction of constrained members.
struct ElementFactory<'a> {
    builder: &'a MetaConstraintBuilder,
    getters: &'a dyn GetterPropertySelectionStrategy,
    class: &'a ClassDescriptor,
}

impl ElementFactory<'_> {
    fn field(&self, name: &str, declared_type: &TypeRef, element: &ElementDecl) -> Result<ConstrainedField> {
        let location = ConstraintLocation::field(self.class.name.clone(), name, declared_type.clone());
        let (constraints, cascading) = self.builder.for_element(element, &location)?;
        Ok(ConstrainedField {
            name: name.to_string(),
            declared_type: declared_type.clone(),
            constraints,
            cascading,
        })
    }

    /// Builds a constrained executable. `None` elements are left empty.
    fn executable(
        &self,
        executable: &ExecutableDecl,
        parameters: &[Option<&ElementDecl>],
        cross_parameter: Option<&[constraints_core::ConstraintAnnotation]>,
        return_value: Option<&ElementDecl>,
    ) -> Result<ConstrainedExecutable> {
        let class = &self.class.name;
        let signature = executable.signature();
        let getter_property = self.getters.property_name(executable);
        let return_type = return_type_of(self.class, executable);

        let mut constrained_parameters = Vec::with_capacity(executable.parameters.len());
        for (index, parameter) in executable.parameters.iter().enumerate() {
            let (constraints, cascading) = match parameters.get(index).copied().flatten() {
                Some(element) => {
                    let location =
                        ConstraintLocation::parameter(class.clone(), signature.clone(), index, parameter.declared_type.clone());
                    self.builder.for_element(element, &location)?
                }
                None => (Vec::new(), CascadingMetadata::default()),
            };
            constrained_parameters.push(ConstrainedParameter {
                index,
                name: parameter.name.clone(),
                declared_type: parameter.declared_type.clone(),
                constraints,
                cascading,
            });
        }

        let cross_parameter = cross_parameter
            .unwrap_or_default()
            .iter()
            .map(|annotation| {
                self.builder
                    .create(annotation, ConstraintLocation::cross_parameter(class.clone(), signature.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let (return_constraints, return_cascading) = match return_value {
            Some(element) if !element.is_empty() => {
                let declared = return_type.clone().unwrap_or(TypeRef::Any);
                let location = match &getter_property {
                    Some(property) => ConstraintLocation::getter(class.clone(), signature.clone(), property, declared),
                    None => ConstraintLocation::return_value(class.clone(), signature.clone(), declared),
                };
                self.builder.for_element(element, &location)?
            }
            _ => (Vec::new(), CascadingMetadata::default()),
        };

        Ok(ConstrainedExecutable {
            kind: executable.kind,
            name: executable.name.clone(),
            signature,
            parameters: constrained_parameters,
            cross_parameter,
            return_type,
            return_constraints,
            return_cascading,
            getter_property,
        })
    }
}

/// Reads declarations from the class registry.
pub struct DeclaredMetadataProvider {
    registry: Arc<ClassRegistry>,
    builder: MetaConstraintBuilder,
    getters: Arc<dyn GetterPropertySelectionStrategy>,
    options: AnnotationProcessingOptions,
}

impl DeclaredMetadataProvider {
    /// Creates a provider honouring `options`.
    pub fn new(
        registry: Arc<ClassRegistry>,
        builder: MetaConstraintBuilder,
        getters: Arc<dyn GetterPropertySelectionStrategy>,
        options: AnnotationProcessingOptions,
    ) -> Self {
        Self {
            registry,
            builder,
            getters,
            options,
        }
    }
}

impl MetadataProvider for DeclaredMetadataProvider {
    fn source(&self) -> ConfigurationSource {
        ConfigurationSource::Annotation
    }

    fn configuration_for_class(&self, class_name: &str) -> Result<Option<BeanConfiguration>> {
        let Some(class) = self.registry.get(class_name) else {
            return Ok(None);
        };
        let options = &self.options;
        let factory = ElementFactory {
            builder: &self.builder,
            getters: self.getters.as_ref(),
            class,
        };
        let mut configuration = BeanConfiguration::new(ConfigurationSource::Annotation, class_name);

        // 1. Class level
        if !options.are_class_level_constraints_ignored(class_name) {
            configuration.class_constraints = class
                .class_constraints
                .iter()
                .map(|annotation| self.builder.create(annotation, ConstraintLocation::class(class_name)))
                .collect::<Result<Vec<_>>>()?;
        }

        // 2. Fields
        for field in &class.fields {
            if options.are_member_constraints_ignored(class_name, &MemberKey::Field(field.name.clone())) {
                continue;
            }
            configuration
                .fields
                .push(factory.field(&field.name, &field.declared_type, &field.element)?);
        }

        // 3. Methods and constructors
        for executable in &class.executables {
            let signature = executable.signature();
            let getter_ignored = self
                .getters
                .property_name(executable)
                .is_some_and(|p| options.are_member_constraints_ignored(class_name, &MemberKey::Getter(p)));
            let parameters: Vec<Option<&ElementDecl>> = executable
                .parameters
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    (!options.are_parameter_constraints_ignored(class_name, &signature, i)).then_some(&p.element)
                })
                .collect();
            let cross_parameter = (!options.are_cross_parameter_constraints_ignored(class_name, &signature))
                .then_some(executable.cross_parameter.as_slice());
            let return_value = (!getter_ignored
                && !options.are_return_value_constraints_ignored(class_name, &signature))
            .then_some(&executable.return_value);

            configuration
                .executables
                .push(factory.executable(executable, &parameters, cross_parameter, return_value)?);
        }

        configuration.default_group_sequence = class.default_group_sequence.clone();
        configuration.group_sequence_provider = class.group_sequence_provider.clone();
        Ok(Some(configuration))
    }
}

/// Reads external or programmatic mappings.
pub struct MappingMetadataProvider {
    source: ConfigurationSource,
    registry: Arc<ClassRegistry>,
    builder: MetaConstraintBuilder,
    getters: Arc<dyn GetterPropertySelectionStrategy>,
    mappings: HashMap<String, TypeMapping>,
}

impl MappingMetadataProvider {
    /// Creates a provider over `mappings`.
    ///
    /// Mapping a class twice, mapping a member twice or mapping a class or
    /// member that does not exist is a declaration error.
    pub fn new(
        source: ConfigurationSource,
        mappings: Vec<TypeMapping>,
        registry: Arc<ClassRegistry>,
        builder: MetaConstraintBuilder,
        getters: Arc<dyn GetterPropertySelectionStrategy>,
    ) -> Result<Self> {
        let mut by_class = HashMap::with_capacity(mappings.len());
        for mapping in mappings {
            let class = registry.get(&mapping.class).ok_or_else(|| {
                ValidationError::declaration(format!("The {} maps unknown class '{}'", source, mapping.class))
            })?;
            check_members(&mapping, class, getters.as_ref())?;
            if by_class.contains_key(&mapping.class) {
                return Err(ValidationError::declaration(format!(
                    "Class '{}' is configured more than once in {} configuration",
                    mapping.class, source
                )));
            }
            debug!(class = %mapping.class, %source, "Registered constraint mapping");
            by_class.insert(mapping.class.clone(), mapping);
        }
        Ok(Self {
            source,
            registry,
            builder,
            getters,
            mappings: by_class,
        })
    }

    fn executable_decl<'c>(
        class: &'c ClassDescriptor,
        mapping: &ExecutableMapping,
        kind: ExecutableKind,
    ) -> Result<&'c ExecutableDecl> {
        find_executable(class, mapping, kind).ok_or_else(|| {
            ValidationError::declaration(format!(
                "Class '{}' has no {} {}",
                class.name,
                executable_noun(kind),
                mapping_signature(class, mapping, kind)
            ))
        })
    }
}

fn executable_noun(kind: ExecutableKind) -> &'static str {
    match kind {
        ExecutableKind::Method => "method",
        ExecutableKind::Constructor => "constructor",
    }
}

fn mapping_signature(class: &ClassDescriptor, mapping: &ExecutableMapping, kind: ExecutableKind) -> Signature {
    match (kind, &mapping.name) {
        (ExecutableKind::Method, Some(name)) => Signature::new(name.clone(), &mapping.parameter_types()),
        _ => constructor_signature(class, &mapping.parameter_types()),
    }
}

fn find_executable<'c>(
    class: &'c ClassDescriptor,
    mapping: &ExecutableMapping,
    kind: ExecutableKind,
) -> Option<&'c ExecutableDecl> {
    let types: Vec<String> = mapping.parameter_types().iter().map(ToString::to_string).collect();
    class.executables.iter().find(|e| {
        e.kind == kind
            && e.signature().parameter_types == types
            && (kind == ExecutableKind::Constructor || mapping.name.as_deref() == Some(e.name.as_str()))
    })
}

fn find_getter<'c>(
    class: &'c ClassDescriptor,
    property: &str,
    getters: &dyn GetterPropertySelectionStrategy,
) -> Option<&'c ExecutableDecl> {
    class
        .methods()
        .find(|m| getters.property_name(m).as_deref() == Some(property))
}

fn check_members(
    mapping: &TypeMapping,
    class: &ClassDescriptor,
    getters: &dyn GetterPropertySelectionStrategy,
) -> Result<()> {
    let duplicate = |what: String| {
        ValidationError::declaration(format!("{} of class '{}' is configured more than once", what, class.name))
    };
    let unknown = |what: String| ValidationError::declaration(format!("Class '{}' has no {}", class.name, what));

    let mut fields = HashSet::new();
    for field in &mapping.fields {
        if class.field(&field.name).is_none() {
            return Err(unknown(format!("field '{}'", field.name)));
        }
        if !fields.insert(field.name.as_str()) {
            return Err(duplicate(format!("Field '{}'", field.name)));
        }
    }

    let mut properties = HashSet::new();
    for getter in &mapping.getters {
        if find_getter(class, &getter.name, getters).is_none() {
            return Err(unknown(format!("getter for property '{}'", getter.name)));
        }
        if !properties.insert(getter.name.as_str()) {
            return Err(duplicate(format!("Getter for '{}'", getter.name)));
        }
    }

    let mut executables = HashSet::new();
    for (kind, list) in [
        (ExecutableKind::Method, &mapping.methods),
        (ExecutableKind::Constructor, &mapping.constructors),
    ] {
        for executable in list {
            if kind == ExecutableKind::Method && executable.name.is_none() {
                return Err(ValidationError::declaration(format!(
                    "A method mapping of class '{}' has no name",
                    class.name
                )));
            }
            let signature = mapping_signature(class, executable, kind);
            if find_executable(class, executable, kind).is_none() {
                return Err(unknown(format!("{} {}", executable_noun(kind), signature)));
            }
            if !executables.insert((kind, signature.clone())) {
                return Err(duplicate(format!("Executable {}", signature)));
            }
        }
    }
    Ok(())
}

impl MetadataProvider for MappingMetadataProvider {
    fn source(&self) -> ConfigurationSource {
        self.source
    }

    fn configuration_for_class(&self, class_name: &str) -> Result<Option<BeanConfiguration>> {
        let Some(mapping) = self.mappings.get(class_name) else {
            return Ok(None);
        };
        let Some(class) = self.registry.get(class_name) else {
            return Ok(None);
        };
        let factory = ElementFactory {
            builder: &self.builder,
            getters: self.getters.as_ref(),
            class,
        };
        let mut configuration = BeanConfiguration::new(self.source, class_name);

        if let Some(class_level) = &mapping.class_level {
            configuration.class_constraints = class_level
                .constraints
                .iter()
                .map(|annotation| self.builder.create(annotation, ConstraintLocation::class(class_name)))
                .collect::<Result<Vec<_>>>()?;
            configuration.default_group_sequence = class_level.group_sequence.clone();
        }

        for field in &mapping.fields {
            if let Some(decl) = class.field(&field.name) {
                configuration
                    .fields
                    .push(factory.field(&field.name, &decl.declared_type, &field.element)?);
            }
        }

        for getter in &mapping.getters {
            if let Some(decl) = find_getter(class, &getter.name, self.getters.as_ref()) {
                configuration
                    .executables
                    .push(factory.executable(decl, &[], None, Some(&getter.element))?);
            }
        }

        for (kind, list) in [
            (ExecutableKind::Method, &mapping.methods),
            (ExecutableKind::Constructor, &mapping.constructors),
        ] {
            for executable in list {
                let decl = Self::executable_decl(class, executable, kind)?;
                let parameters: Vec<Option<&ElementDecl>> =
                    executable.parameters.iter().map(|p| Some(&p.element)).collect();
                let cross_parameter = executable.cross_parameter.as_ref().map(|c| c.constraints.as_slice());
                let return_value = executable.return_value.as_ref().map(|r| &r.element);
                configuration
                    .executables
                    .push(factory.executable(decl, &parameters, cross_parameter, return_value)?);
            }
        }

        Ok(Some(configuration))
    }

    fn annotation_processing_options(&self) -> AnnotationProcessingOptions {
        let mut options = AnnotationProcessingOptions::default();
        for (class_name, mapping) in &self.mappings {
            let Some(class) = self.registry.get(class_name) else {
                continue;
            };
            if let Some(ignore) = mapping.ignore_annotations {
                options.ignore_annotations_on_type(class_name, ignore);
            }
            if let Some(ignore) = mapping.class_level.as_ref().and_then(|c| c.ignore_annotations) {
                options.ignore_class_level_constraints(class_name, ignore);
            }
            for field in &mapping.fields {
                if let Some(ignore) = field.ignore_annotations {
                    options.ignore_annotations_on_member(class_name, MemberKey::Field(field.name.clone()), ignore);
                }
            }
            for getter in &mapping.getters {
                if let Some(ignore) = getter.ignore_annotations {
                    options.ignore_annotations_on_member(class_name, MemberKey::Getter(getter.name.clone()), ignore);
                }
            }
            for (kind, list) in [
                (ExecutableKind::Method, &mapping.methods),
                (ExecutableKind::Constructor, &mapping.constructors),
            ] {
                for executable in list {
                    let Some(decl) = find_executable(class, executable, kind) else {
                        warn!(class = %class_name, "Skipping options of an unknown executable");
                        continue;
                    };
                    let signature = decl.signature();
                    if let Some(ignore) = executable.ignore_annotations {
                        options.ignore_annotations_on_member(
                            class_name,
                            MemberKey::Executable(signature.clone()),
                            ignore,
                        );
                    }
                    for (index, parameter) in executable.parameters.iter().enumerate() {
                        if let Some(ignore) = parameter.ignore_annotations {
                            options.ignore_annotations_on_parameter(class_name, signature.clone(), index, ignore);
                        }
                    }
                    if let Some(ignore) = executable.return_value.as_ref().and_then(|r| r.ignore_annotations) {
                        options.ignore_annotations_on_return_value(class_name, signature.clone(), ignore);
                    }
                    if let Some(ignore) = executable.cross_parameter.as_ref().and_then(|c| c.ignore_annotations) {
                        options.ignore_annotations_on_cross_parameter(class_name, signature.clone(), ignore);
                    }
                }
            }
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ConstraintDefinitions;
    use crate::plugins::DefaultGetterPropertySelectionStrategy;
    use crate::resolver::ValidatorResolver;
    use constraints_core::{ClassBuilder, ConstraintAnnotation, FieldBuilder, MethodBuilder};
    use constraints_mapping::PropertyMapping;
    use pretty_assertions::assert_eq;

    fn registry() -> Arc<ClassRegistry> {
        Arc::new(
            ClassRegistry::new().with_class(
                ClassBuilder::new("Customer")
                    .constraint(ConstraintAnnotation::new("NotNull"))
                    .field(
                        FieldBuilder::new("name", TypeRef::Text)
                            .constraint(ConstraintAnnotation::new("NotBlank"))
                            .build(),
                    )
                    .field(FieldBuilder::new("age", TypeRef::Integer).build())
                    .method(
                        MethodBuilder::getter("getEmail", TypeRef::Text)
                            .return_constraint(ConstraintAnnotation::new("NotNull"))
                            .build(),
                    )
                    .build(),
            ),
        )
    }

    fn builder(registry: &Arc<ClassRegistry>) -> MetaConstraintBuilder {
        let resolver = ValidatorResolver::new(Arc::new(ConstraintDefinitions::with_builtins()), registry.clone());
        MetaConstraintBuilder::new(Arc::new(resolver))
    }

    fn mapping_provider(mappings: Vec<TypeMapping>) -> Result<MappingMetadataProvider> {
        let registry = registry();
        MappingMetadataProvider::new(
            ConfigurationSource::Programmatic,
            mappings,
            registry.clone(),
            builder(&registry),
            Arc::new(DefaultGetterPropertySelectionStrategy),
        )
    }

    #[test]
    fn test_declared_configuration() {
        let registry = registry();
        let provider = DeclaredMetadataProvider::new(
            registry.clone(),
            builder(&registry),
            Arc::new(DefaultGetterPropertySelectionStrategy),
            AnnotationProcessingOptions::default(),
        );
        let config = provider.configuration_for_class("Customer").unwrap().unwrap();
        assert_eq!(config.class_constraints.len(), 1);
        assert_eq!(config.fields[0].constraints.len(), 1);
        assert_eq!(config.executables[0].getter_property.as_deref(), Some("email"));
        assert!(provider.configuration_for_class("Unknown").unwrap().is_none());
    }

    #[test]
    fn test_ignored_declarations() {
        let mapping = mapping_provider(vec![
            TypeMapping::new("Customer")
                .ignore_class_level_annotations(true)
                .field(PropertyMapping::new("name").ignore_annotations(true))
                .getter(PropertyMapping::new("email").ignore_annotations(true)),
        ])
        .unwrap();
        let options = mapping.annotation_processing_options();
        assert!(options.are_class_level_constraints_ignored("Customer"));

        let registry = registry();
        let declared = DeclaredMetadataProvider::new(
            registry.clone(),
            builder(&registry),
            Arc::new(DefaultGetterPropertySelectionStrategy),
            options,
        );
        let config = declared.configuration_for_class("Customer").unwrap().unwrap();
        assert!(config.class_constraints.is_empty());
        assert_eq!(config.fields.len(), 1);
        assert_eq!(config.fields[0].name, "age");
        assert!(config.executables[0].return_constraints.is_empty());
    }

    #[test]
    fn test_member_setting_wins_over_type_setting() {
        let mut options = AnnotationProcessingOptions::default();
        options.ignore_annotations_on_type("Customer", true);
        options.ignore_annotations_on_member("Customer", MemberKey::Field("age".into()), false);
        assert!(options.are_member_constraints_ignored("Customer", &MemberKey::Field("name".into())));
        assert!(!options.are_member_constraints_ignored("Customer", &MemberKey::Field("age".into())));
    }

    #[test]
    fn test_mapping_errors() {
        let twice = mapping_provider(vec![TypeMapping::new("Customer"), TypeMapping::new("Customer")]);
        assert!(matches!(twice, Err(ValidationError::ConstraintDeclaration(_))));

        let unknown_class = mapping_provider(vec![TypeMapping::new("Ghost")]);
        assert!(matches!(unknown_class, Err(ValidationError::ConstraintDeclaration(_))));

        let unknown_field = mapping_provider(vec![TypeMapping::new("Customer").field(PropertyMapping::new("nope"))]);
        assert!(matches!(unknown_field, Err(ValidationError::ConstraintDeclaration(_))));

        let member_twice = mapping_provider(vec![
            TypeMapping::new("Customer")
                .field(PropertyMapping::new("name"))
                .field(PropertyMapping::new("name")),
        ]);
        assert!(matches!(member_twice, Err(ValidationError::ConstraintDeclaration(_))));
    }

    #[test]
    fn test_mapping_configuration() {
        let provider = mapping_provider(vec![
            TypeMapping::new("Customer").field(PropertyMapping::new("age").constraint(ConstraintAnnotation::new("Positive"))),
        ])
        .unwrap();
        let config = provider.configuration_for_class("Customer").unwrap().unwrap();
        assert_eq!(config.source, ConfigurationSource::Programmatic);
        assert_eq!(config.fields[0].constraints[0].descriptor().kind, "Positive");
    }
}
