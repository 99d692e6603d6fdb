//! Aggregated bean metadata.
//!
//! [`BeanMetadataBuilder`] collects the configurations every provider holds
//! for a class and for each of its supertypes, merges them member by member
//! and checks the rules that keep method constraints sound under
//! overriding. The result is an immutable [`BeanMetadata`].

use super::raw::extend_unique;
use crate::metadata::{
    BeanConfiguration, CascadingMetadata, ConfigurationSource, ConstrainedExecutable, MetaConstraint,
    MetadataProvider,
};
use crate::plugins::ParameterNameProvider;
use constraints_core::{
    BeanRef, ClassRegistry, DefaultGroupSequenceProvider, ElementType, ExecutableKind, FactorySettings, Group,
    Result, Signature, TypeHierarchy, TypeRef, ValidationError,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Rules relaxing the checks on overriding and parallel methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodValidationConfiguration {
    /// Overriding methods may alter parameter constraints
    pub allow_overriding_method_alter_parameter_constraint: bool,
    /// A return value may be cascaded more than once per hierarchy line
    pub allow_multiple_cascaded_validation_on_return_values: bool,
    /// Parallel methods may define parameter constraints
    pub allow_parallel_methods_define_parameter_constraints: bool,
}

impl From<&FactorySettings> for MethodValidationConfiguration {
    fn from(settings: &FactorySettings) -> Self {
        Self {
            allow_overriding_method_alter_parameter_constraint: settings
                .allow_overriding_method_alter_parameter_constraint,
            allow_multiple_cascaded_validation_on_return_values: settings
                .allow_multiple_cascaded_validation_on_return_values,
            allow_parallel_methods_define_parameter_constraints: settings
                .allow_parallel_methods_define_parameter_constraints,
        }
    }
}

/// Constraints and cascading of one property, merged from fields and
/// getters of the whole hierarchy.
#[derive(Debug, Clone)]
pub struct PropertyMetadata {
    /// Property name
    pub name: String,
    /// Element kind first declaring the property
    pub element_type: ElementType,
    /// Constraints on the property and its type arguments
    pub constraints: Vec<Arc<MetaConstraint>>,
    /// Cascading
    pub cascading: CascadingMetadata,
}

/// A parameter of an executable.
#[derive(Debug, Clone)]
pub struct ParameterMetadata {
    /// Position
    pub index: usize,
    /// Name used in paths
    pub name: String,
    /// Declared type
    pub declared_type: TypeRef,
    /// Constraints
    pub constraints: Vec<Arc<MetaConstraint>>,
    /// Cascading
    pub cascading: CascadingMetadata,
}

/// Return value of an executable.
#[derive(Debug, Clone, Default)]
pub struct ReturnValueMetadata {
    /// Declared type; `None` for void methods
    pub declared_type: Option<TypeRef>,
    /// Constraints
    pub constraints: Vec<Arc<MetaConstraint>>,
    /// Cascading
    pub cascading: CascadingMetadata,
}

/// A method or constructor merged over its overriding chain.
#[derive(Debug, Clone)]
pub struct ExecutableMetadata {
    /// Method or constructor
    pub kind: ExecutableKind,
    /// Name
    pub name: String,
    /// Signature
    pub signature: Signature,
    /// Parameters
    pub parameters: Vec<ParameterMetadata>,
    /// Cross-parameter constraints
    pub cross_parameter: Vec<Arc<MetaConstraint>>,
    /// Return value
    pub return_value: ReturnValueMetadata,
}

impl ExecutableMetadata {
    /// Parameter names in order.
    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    /// Declared parameter types in order.
    pub fn parameter_types(&self) -> Vec<TypeRef> {
        self.parameters.iter().map(|p| p.declared_type.clone()).collect()
    }
}

/// Everything known about validating instances of one class.
#[derive(Clone)]
pub struct BeanMetadata {
    class: String,
    hierarchy: Vec<String>,
    class_constraints: Vec<Arc<MetaConstraint>>,
    properties: Vec<PropertyMetadata>,
    executables: HashMap<Signature, ExecutableMetadata>,
    default_group_sequence: Option<Vec<Group>>,
    sequence_provider: Option<Arc<dyn DefaultGroupSequenceProvider>>,
}

impl BeanMetadata {
    /// Metadata of a class nothing is known about.
    pub fn unconstrained(class: impl Into<String>) -> Self {
        let class = class.into();
        Self {
            hierarchy: vec![class.clone()],
            class,
            class_constraints: Vec::new(),
            properties: Vec::new(),
            executables: HashMap::new(),
            default_group_sequence: None,
            sequence_provider: None,
        }
    }

    /// Class name.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The class followed by its supertypes.
    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    /// Class-level constraints of the class and its supertypes.
    pub fn class_constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.class_constraints
    }

    /// Constrained or cascaded properties.
    pub fn properties(&self) -> &[PropertyMetadata] {
        &self.properties
    }

    /// Looks up a property.
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Looks up a method or constructor.
    pub fn executable(&self, signature: &Signature) -> Option<&ExecutableMetadata> {
        self.executables.get(signature)
    }

    /// Every class-level and property constraint.
    pub fn all_meta_constraints(&self) -> impl Iterator<Item = &Arc<MetaConstraint>> {
        self.class_constraints
            .iter()
            .chain(self.properties.iter().flat_map(|p| p.constraints.iter()))
    }

    /// Class-level and property constraints declared by `class` itself.
    pub fn direct_meta_constraints<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Arc<MetaConstraint>> {
        self.all_meta_constraints().filter(move |c| c.declaring_class() == class)
    }

    /// Returns true if any class-level or property constraint is declared.
    /// Cascades are not counted.
    pub fn has_constraints(&self) -> bool {
        self.all_meta_constraints().next().is_some()
    }

    /// Returns true if any constraint or cascade applies to instances.
    pub fn is_constrained(&self) -> bool {
        !self.class_constraints.is_empty()
            || self
                .properties
                .iter()
                .any(|p| !p.constraints.is_empty() || p.cascading.is_cascading())
    }

    /// Returns true if the class redefines its default group sequence.
    pub fn redefines_default_group_sequence(&self) -> bool {
        self.default_group_sequence.is_some() || self.sequence_provider.is_some()
    }

    /// The default group sequence, with the class group replaced by
    /// `Default`.
    ///
    /// A dynamic sequence is asked for `bean` and checked like a static one.
    pub fn default_validation_sequence(&self, bean: Option<&BeanRef>) -> Result<Vec<Group>> {
        if let Some(provider) = &self.sequence_provider {
            return check_default_sequence(&self.class, &self.hierarchy, provider.group_sequence(bean), None);
        }
        Ok(self
            .default_group_sequence
            .clone()
            .unwrap_or_else(|| vec![Group::default_group()]))
    }
}

impl fmt::Debug for BeanMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanMetadata")
            .field("class", &self.class)
            .field("hierarchy", &self.hierarchy)
            .field("class_constraints", &self.class_constraints.len())
            .field("properties", &self.properties.len())
            .field("executables", &self.executables.len())
            .field("default_group_sequence", &self.default_group_sequence)
            .field("dynamic_sequence", &self.sequence_provider.is_some())
            .finish()
    }
}

/// Checks a default group sequence and replaces the class group by
/// `Default`.
fn check_default_sequence(
    class: &str,
    hierarchy: &[String],
    sequence: Vec<Group>,
    registry: Option<&ClassRegistry>,
) -> Result<Vec<Group>> {
    let own = Group::new(class);
    if !sequence.contains(&own) {
        return Err(ValidationError::group_definition(format!(
            "The default group sequence of '{}' must contain the class itself",
            class
        )));
    }
    let mut checked = Vec::with_capacity(sequence.len());
    for group in sequence {
        if group.is_default() {
            return Err(ValidationError::group_definition(format!(
                "The default group sequence of '{}' must not contain the Default group",
                class
            )));
        }
        if let Some(registry) = registry {
            if registry.contains(group.name()) && !hierarchy.iter().any(|c| c == group.name()) {
                return Err(ValidationError::group_definition(format!(
                    "The default group sequence of '{}' names '{}', which is not part of its hierarchy",
                    class, group
                )));
            }
            if registry.is_sequence(&group) {
                return Err(ValidationError::group_definition(format!(
                    "The default group sequence of '{}' contains the sequence '{}'",
                    class, group
                )));
            }
        }
        checked.push(if group == own { Group::default_group() } else { group });
    }
    Ok(checked)
}

/// Configuration of one class merged over all providers.
struct ClassConfiguration {
    class: String,
    class_constraints: Vec<Arc<MetaConstraint>>,
    fields: Vec<crate::metadata::ConstrainedField>,
    executables: Vec<ConstrainedExecutable>,
}

/// Builds [`BeanMetadata`] from metadata providers.
pub struct BeanMetadataBuilder {
    registry: Arc<ClassRegistry>,
    providers: Vec<Arc<dyn MetadataProvider>>,
    parameter_names: Arc<dyn ParameterNameProvider>,
    rules: MethodValidationConfiguration,
}

impl BeanMetadataBuilder {
    /// Creates a builder.
    ///
    /// # Arguments
    ///
    /// * `providers` - Providers in merge order
    /// * `parameter_names` - Names parameters of executables
    /// * `rules` - Relaxations of the overriding rules
    pub fn new(
        registry: Arc<ClassRegistry>,
        providers: Vec<Arc<dyn MetadataProvider>>,
        parameter_names: Arc<dyn ParameterNameProvider>,
        rules: MethodValidationConfiguration,
    ) -> Self {
        Self {
            registry,
            providers,
            parameter_names,
            rules,
        }
    }

    /// The class registry in use.
    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    /// Builds the metadata of `class`.
    pub fn build(&self, class: &str) -> Result<BeanMetadata> {
        if !self.registry.contains(class) {
            debug!(class, "Class is not registered, treating it as unconstrained");
            return Ok(BeanMetadata::unconstrained(class));
        }

        // 1. Collect and merge per class, supertypes first
        let ordered: Vec<String> = self
            .registry
            .hierarchy(class)
            .into_iter()
            .map(|c| c.name.clone())
            .collect();
        let mut per_class = Vec::with_capacity(ordered.len());
        let mut own_configurations = Vec::new();
        for name in &ordered {
            let mut configurations = Vec::new();
            for provider in &self.providers {
                if let Some(configuration) = provider.configuration_for_class(name)? {
                    debug!(class = %name, source = %configuration.source, "Collected bean configuration");
                    configurations.push(configuration);
                }
            }
            per_class.push(merge_class(name, &configurations)?);
            if name == class {
                own_configurations = configurations;
            }
        }

        // 2. Properties and class-level constraints
        let mut class_constraints = Vec::new();
        let mut properties: Vec<PropertyMetadata> = Vec::new();
        for configuration in &per_class {
            extend_unique(&mut class_constraints, &configuration.class_constraints);
            for field in &configuration.fields {
                add_property(&mut properties, &field.name, ElementType::Field, &field.constraints, &field.cascading)?;
            }
            for executable in &configuration.executables {
                if let Some(property) = &executable.getter_property {
                    add_property(
                        &mut properties,
                        property,
                        ElementType::Method,
                        &executable.return_constraints,
                        &executable.return_cascading,
                    )?;
                }
            }
        }

        // 3. Executables with the overriding rules
        let executables = self.merge_executables(class, &per_class)?;

        // 4. Default group sequence
        let mut hierarchy = ordered;
        hierarchy.reverse();
        let (default_group_sequence, sequence_provider) = default_sequence(&own_configurations);
        if default_group_sequence.is_some() && sequence_provider.is_some() {
            return Err(ValidationError::group_definition(format!(
                "Class '{}' defines both a default group sequence and a default group sequence provider",
                class
            )));
        }
        let default_group_sequence = default_group_sequence
            .map(|sequence| check_default_sequence(class, &hierarchy, sequence, Some(&self.registry)))
            .transpose()?;

        debug!(
            class,
            class_constraints = class_constraints.len(),
            properties = properties.len(),
            executables = executables.len(),
            "Built bean metadata"
        );
        Ok(BeanMetadata {
            class: class.to_string(),
            hierarchy,
            class_constraints,
            properties,
            executables,
            default_group_sequence,
            sequence_provider,
        })
    }

    fn merge_executables(
        &self,
        class: &str,
        per_class: &[ClassConfiguration],
    ) -> Result<HashMap<Signature, ExecutableMetadata>> {
        let mut chains: Vec<(Signature, Vec<(&str, &ConstrainedExecutable)>)> = Vec::new();
        for configuration in per_class {
            for executable in &configuration.executables {
                if executable.kind == ExecutableKind::Constructor && configuration.class != class {
                    continue;
                }
                if executable.kind == ExecutableKind::Method
                    && executable.return_type.is_none()
                    && executable.has_return_value_declarations()
                {
                    return Err(ValidationError::declaration(format!(
                        "Void method {} of '{}' must not have return value constraints or be cascaded",
                        executable.signature, configuration.class
                    )));
                }
                match chains.iter_mut().find(|(s, _)| *s == executable.signature) {
                    Some((_, chain)) => chain.push((&configuration.class, executable)),
                    None => chains.push((executable.signature.clone(), vec![(&configuration.class, executable)])),
                }
            }
        }

        let mut merged = HashMap::with_capacity(chains.len());
        for (signature, chain) in chains {
            self.check_overriding_rules(&chain)?;
            merged.insert(signature, self.merge_chain(&chain)?);
        }
        Ok(merged)
    }

    fn check_overriding_rules(&self, chain: &[(&str, &ConstrainedExecutable)]) -> Result<()> {
        let registry = self.registry.as_ref();
        let rules = &self.rules;
        for (i, (super_class, overridden)) in chain.iter().enumerate() {
            for (sub_class, overriding) in &chain[i + 1..] {
                if super_class == sub_class {
                    continue;
                }
                let is_override = registry.is_subclass_of(sub_class, super_class);
                let is_parallel = !is_override && !registry.is_subclass_of(super_class, sub_class);
                let signature = &overriding.signature;

                if is_override
                    && !rules.allow_overriding_method_alter_parameter_constraint
                    && overriding.has_parameter_constraints()
                    && !overriding.is_equally_parameter_constrained(overridden)
                {
                    return Err(ValidationError::declaration(format!(
                        "{} of '{}' alters the parameter constraints of the method it overrides in '{}'",
                        signature, sub_class, super_class
                    )));
                }
                if is_parallel
                    && !rules.allow_parallel_methods_define_parameter_constraints
                    && (overriding.has_parameter_constraints() || overridden.has_parameter_constraints())
                {
                    return Err(ValidationError::declaration(format!(
                        "Parallel methods {} of '{}' and '{}' must not define parameter constraints",
                        signature, super_class, sub_class
                    )));
                }
                if !is_parallel
                    && !rules.allow_multiple_cascaded_validation_on_return_values
                    && overriding.return_cascading.cascade
                    && overridden.return_cascading.cascade
                {
                    return Err(ValidationError::declaration(format!(
                        "The return value of {} is cascaded in both '{}' and '{}'",
                        signature, super_class, sub_class
                    )));
                }
                let converts = |e: &ConstrainedExecutable| {
                    e.return_cascading.cascade && e.return_cascading.has_group_conversions()
                };
                if is_parallel && (converts(overriding) || converts(overridden)) {
                    return Err(ValidationError::declaration(format!(
                        "Parallel methods {} of '{}' and '{}' must not define group conversions on a cascaded return value",
                        signature, super_class, sub_class
                    )));
                }
            }
        }
        Ok(())
    }

    fn merge_chain(&self, chain: &[(&str, &ConstrainedExecutable)]) -> Result<ExecutableMetadata> {
        let (top_class, top) = chain[0];
        let names = self
            .registry
            .get(top_class)
            .and_then(|c| c.executable(&top.signature))
            .map(|decl| self.parameter_names.parameter_names(decl))
            .unwrap_or_default();

        let mut parameters: Vec<ParameterMetadata> = top
            .parameters
            .iter()
            .map(|p| ParameterMetadata {
                index: p.index,
                name: names.get(p.index).cloned().unwrap_or_else(|| format!("arg{}", p.index)),
                declared_type: p.declared_type.clone(),
                constraints: Vec::new(),
                cascading: CascadingMetadata::default(),
            })
            .collect();
        let mut cross_parameter = Vec::new();
        let mut return_value = ReturnValueMetadata {
            declared_type: top.return_type.clone(),
            ..Default::default()
        };

        for (_, executable) in chain {
            for (merged, parameter) in parameters.iter_mut().zip(&executable.parameters) {
                extend_unique(&mut merged.constraints, &parameter.constraints);
                merged.cascading.merge(&parameter.cascading)?;
            }
            extend_unique(&mut cross_parameter, &executable.cross_parameter);
            extend_unique(&mut return_value.constraints, &executable.return_constraints);
            return_value.cascading.merge(&executable.return_cascading)?;
        }

        Ok(ExecutableMetadata {
            kind: top.kind,
            name: top.name.clone(),
            signature: top.signature.clone(),
            parameters,
            cross_parameter,
            return_value,
        })
    }
}

fn merge_class(class: &str, configurations: &[BeanConfiguration]) -> Result<ClassConfiguration> {
    let mut merged = ClassConfiguration {
        class: class.to_string(),
        class_constraints: Vec::new(),
        fields: Vec::new(),
        executables: Vec::new(),
    };
    for configuration in configurations {
        extend_unique(&mut merged.class_constraints, &configuration.class_constraints);
        for field in &configuration.fields {
            match merged.fields.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => {
                    extend_unique(&mut existing.constraints, &field.constraints);
                    existing.cascading.merge(&field.cascading)?;
                }
                None => merged.fields.push(field.clone()),
            }
        }
        for executable in &configuration.executables {
            match merged
                .executables
                .iter_mut()
                .find(|e| e.signature == executable.signature)
            {
                Some(existing) => existing.merge(executable)?,
                None => merged.executables.push(executable.clone()),
            }
        }
    }
    Ok(merged)
}

fn add_property(
    properties: &mut Vec<PropertyMetadata>,
    name: &str,
    element_type: ElementType,
    constraints: &[Arc<MetaConstraint>],
    cascading: &CascadingMetadata,
) -> Result<()> {
    if constraints.is_empty() && !cascading.is_cascading() {
        return Ok(());
    }
    match properties.iter_mut().find(|p| p.name == name) {
        Some(existing) => {
            extend_unique(&mut existing.constraints, constraints);
            existing.cascading.merge(cascading)?;
        }
        None => properties.push(PropertyMetadata {
            name: name.to_string(),
            element_type,
            constraints: constraints.to_vec(),
            cascading: cascading.clone(),
        }),
    }
    Ok(())
}

type SequenceDeclaration = (Option<Vec<Group>>, Option<Arc<dyn DefaultGroupSequenceProvider>>);

/// Picks the sequence of the highest-priority source declaring one.
fn default_sequence(configurations: &[BeanConfiguration]) -> SequenceDeclaration {
    let mut by_priority: Vec<&BeanConfiguration> = configurations.iter().collect();
    by_priority.sort_by_key(|c| std::cmp::Reverse(c.source));

    let sequence = by_priority
        .iter()
        .find_map(|c| c.default_group_sequence.clone());
    let provider = configurations
        .iter()
        .filter(|c| c.source == ConfigurationSource::Annotation)
        .find_map(|c| c.group_sequence_provider.clone());
    (sequence, provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ConstraintDefinitions;
    use crate::metadata::{AnnotationProcessingOptions, DeclaredMetadataProvider, MetaConstraintBuilder};
    use crate::plugins::{DefaultGetterPropertySelectionStrategy, DefaultParameterNameProvider};
    use crate::resolver::ValidatorResolver;
    use constraints_core::{
        ClassBuilder, ClassDescriptor, ConstraintAnnotation, FieldBuilder, GroupDefinition, MethodBuilder,
        ParameterBuilder,
    };
    use pretty_assertions::assert_eq;

    fn builder_with(classes: Vec<ClassDescriptor>, rules: MethodValidationConfiguration) -> BeanMetadataBuilder {
        let mut registry = ClassRegistry::new().with_group(GroupDefinition::sequence("Ordered", vec![]));
        for class in classes {
            registry.register(class);
        }
        let registry = Arc::new(registry);
        let resolver = ValidatorResolver::new(Arc::new(ConstraintDefinitions::with_builtins()), registry.clone());
        let declared = DeclaredMetadataProvider::new(
            registry.clone(),
            MetaConstraintBuilder::new(Arc::new(resolver)),
            Arc::new(DefaultGetterPropertySelectionStrategy),
            AnnotationProcessingOptions::default(),
        );
        BeanMetadataBuilder::new(
            registry,
            vec![Arc::new(declared)],
            Arc::new(DefaultParameterNameProvider),
            rules,
        )
    }

    fn builder(classes: Vec<ClassDescriptor>) -> BeanMetadataBuilder {
        builder_with(classes, MethodValidationConfiguration::default())
    }

    fn place_order(constraint: Option<&str>) -> MethodBuilder {
        let mut parameter = ParameterBuilder::new(TypeRef::Text).named("customer");
        if let Some(kind) = constraint {
            parameter = parameter.constraint(ConstraintAnnotation::new(kind));
        }
        MethodBuilder::method("placeOrder").parameter(parameter.build())
    }

    #[test]
    fn test_hierarchy_merge() {
        let metadata = builder(vec![
            ClassBuilder::new("Vehicle")
                .field(
                    FieldBuilder::new("plate", TypeRef::Text)
                        .constraint(ConstraintAnnotation::new("NotNull"))
                        .build(),
                )
                .build(),
            ClassBuilder::new("Car")
                .extends("Vehicle")
                .field(
                    FieldBuilder::new("plate", TypeRef::Text)
                        .constraint(ConstraintAnnotation::new("Size").attr("min", 2))
                        .build(),
                )
                .method(
                    MethodBuilder::getter("getSeats", TypeRef::Integer)
                        .return_constraint(ConstraintAnnotation::new("Positive"))
                        .build(),
                )
                .build(),
        ])
        .build("Car")
        .unwrap();

        assert_eq!(metadata.hierarchy(), &["Car".to_string(), "Vehicle".to_string()]);
        let plate = metadata.property("plate").unwrap();
        let kinds: Vec<&str> = plate.constraints.iter().map(|c| c.descriptor().kind.as_str()).collect();
        assert_eq!(kinds, vec!["NotNull", "Size"]);
        assert_eq!(metadata.property("seats").unwrap().element_type, ElementType::Method);
        assert_eq!(metadata.direct_meta_constraints("Vehicle").count(), 1);
        assert!(metadata.executable(&Signature::new("getSeats", &[])).is_some());
    }

    #[test]
    fn test_overriding_method_must_not_alter_parameter_constraints() {
        let classes = || {
            vec![
                ClassBuilder::new("OrderService").method(place_order(None).build()).build(),
                ClassBuilder::new("StrictOrderService")
                    .extends("OrderService")
                    .method(place_order(Some("NotNull")).build())
                    .build(),
            ]
        };
        let err = builder(classes()).build("StrictOrderService").unwrap_err();
        assert!(matches!(err, ValidationError::ConstraintDeclaration(_)));

        let relaxed = builder_with(
            classes(),
            MethodValidationConfiguration {
                allow_overriding_method_alter_parameter_constraint: true,
                ..Default::default()
            },
        );
        let metadata = relaxed.build("StrictOrderService").unwrap();
        let signature = Signature::new("placeOrder", &[TypeRef::Text]);
        assert_eq!(metadata.executable(&signature).unwrap().parameters[0].constraints.len(), 1);
    }

    #[test]
    fn test_inherited_parameter_constraints_are_allowed() {
        let metadata = builder(vec![
            ClassBuilder::new("OrderService").method(place_order(Some("NotNull")).build()).build(),
            ClassBuilder::new("DefaultOrderService")
                .extends("OrderService")
                .method(place_order(None).build())
                .build(),
        ])
        .build("DefaultOrderService")
        .unwrap();
        let executable = metadata.executable(&Signature::new("placeOrder", &[TypeRef::Text])).unwrap();
        assert_eq!(executable.parameter_names(), vec!["customer".to_string()]);
        assert_eq!(executable.parameters[0].constraints.len(), 1);
    }

    #[test]
    fn test_parallel_methods_must_not_define_parameter_constraints() {
        let err = builder(vec![
            ClassBuilder::interface("Ordering").method(place_order(Some("NotNull")).build()).build(),
            ClassBuilder::interface("Shopping").method(place_order(None).build()).build(),
            ClassBuilder::new("Shop")
                .implements("Ordering")
                .implements("Shopping")
                .method(place_order(None).build())
                .build(),
        ])
        .build("Shop")
        .unwrap_err();
        assert!(matches!(err, ValidationError::ConstraintDeclaration(_)));
    }

    #[test]
    fn test_return_value_cascaded_once_per_line() {
        let find = || MethodBuilder::method("find").returns(TypeRef::bean("Order")).return_valid().build();
        let err = builder(vec![
            ClassBuilder::new("Repository").method(find()).build(),
            ClassBuilder::new("OrderRepository").extends("Repository").method(find()).build(),
        ])
        .build("OrderRepository")
        .unwrap_err();
        assert!(matches!(err, ValidationError::ConstraintDeclaration(_)));
    }

    #[test]
    fn test_void_method_with_return_constraint() {
        let err = builder(vec![
            ClassBuilder::new("Job")
                .method(
                    MethodBuilder::method("run")
                        .return_constraint(ConstraintAnnotation::new("NotNull"))
                        .build(),
                )
                .build(),
        ])
        .build("Job")
        .unwrap_err();
        assert!(matches!(err, ValidationError::ConstraintDeclaration(_)));
    }

    #[test]
    fn test_default_group_sequence() {
        let build = |sequence: Vec<&str>| {
            builder(vec![ClassBuilder::new("Car").default_group_sequence(sequence).build()]).build("Car")
        };
        let metadata = build(vec!["Car", "Expensive"]).unwrap();
        assert!(metadata.redefines_default_group_sequence());
        assert_eq!(
            metadata.default_validation_sequence(None).unwrap(),
            vec![Group::default_group(), Group::new("Expensive")]
        );

        assert!(matches!(build(vec!["Expensive"]), Err(ValidationError::GroupDefinition(_))));
        assert!(matches!(build(vec!["Car", "Default"]), Err(ValidationError::GroupDefinition(_))));
        assert!(matches!(build(vec!["Car", "Ordered"]), Err(ValidationError::GroupDefinition(_))));
    }

    #[test]
    fn test_unregistered_class() {
        let metadata = builder(Vec::new()).build("Ghost").unwrap();
        assert!(!metadata.is_constrained());
        assert_eq!(metadata.default_validation_sequence(None).unwrap(), vec![Group::default_group()]);
    }

    #[test]
    fn test_cascade_only_class_is_constrained_without_constraints() {
        let metadata = builder(vec![
            ClassBuilder::new("Garage")
                .field(FieldBuilder::new("car", TypeRef::bean("Car")).valid().build())
                .build(),
        ])
        .build("Garage")
        .unwrap();
        assert!(metadata.is_constrained());
        assert!(!metadata.has_constraints());
    }
}
