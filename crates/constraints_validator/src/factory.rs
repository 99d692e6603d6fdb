//! Validator configuration and factories.
//!
//! [`ValidatorConfiguration`] gathers the class registry, mapping documents,
//! programmatic mappings, constraint definitions, plug-ins and scalar
//! options. Building it wires the metadata providers, the metadata manager
//! and the engine together into a [`ValidatorFactory`] (metadata built on
//! demand) or a [`PredefinedScopeValidatorFactory`] (metadata built up front
//! for a fixed set of classes).

use crate::constraint_validator::{ConstraintValidatorFactory, DefaultConstraintValidatorFactory, ValidatorDescriptor};
use crate::definition::{ConstraintDefinition, ConstraintDefinitions};
use crate::engine::{Engine, Validator};
use crate::extraction::{ValueExtractor, ValueExtractors};
use crate::interpolation::{MessageBundle, MessageInterpolator, ResourceBundleMessageInterpolator};
use crate::metadata::{
    AnnotationProcessingOptions, BeanMetadataBuilder, BeanMetadataManager, ConfigurationSource,
    DeclaredMetadataProvider, MappingMetadataProvider, MetaConstraintBuilder, MetadataProvider,
    MethodValidationConfiguration, OpenBeanMetadataManager, PredefinedScopeBeanMetadataManager,
};
use crate::plugins::{
    ClockProvider, DefaultGetterPropertySelectionStrategy, DefaultParameterNameProvider,
    GetterPropertySelectionStrategy, ParameterNameProvider, SystemClockProvider, TraversableResolver,
    TraverseAllResolver,
};
use crate::resolver::ValidatorResolver;
use crate::script::{DefaultScriptEvaluatorFactory, ScriptEvaluatorFactory};
use constraints_core::{ClassRegistry, FactorySettings, LanguageRange, Locale, Result, ValidationError};
use constraints_mapping::{ConstraintMapping, MappingDocument, parse_file};
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builder for validator factories.
///
/// # Example
///
/// ```rust
/// use constraints_core::{ClassBuilder, ClassRegistry, Locale};
/// use constraints_validator::ValidatorConfiguration;
///
/// let registry = ClassRegistry::new().with_class(ClassBuilder::new("Order").build());
/// let factory = ValidatorConfiguration::new(registry)
///     .with_fail_fast(true)
///     .with_locales([Locale::new("fr", "FR")])
///     .build()
///     .unwrap();
/// assert!(factory.settings().fail_fast);
/// ```
pub struct ValidatorConfiguration {
    registry: ClassRegistry,
    settings: FactorySettings,
    definitions: ConstraintDefinitions,
    documents: Vec<MappingDocument>,
    mappings: Vec<ConstraintMapping>,
    extractors: Vec<Arc<dyn ValueExtractor>>,
    bundles: Vec<(String, String)>,
    message_interpolator: Option<Arc<dyn MessageInterpolator>>,
    traversable_resolver: Arc<dyn TraversableResolver>,
    constraint_validator_factory: Arc<dyn ConstraintValidatorFactory>,
    parameter_name_provider: Arc<dyn ParameterNameProvider>,
    clock_provider: Arc<dyn ClockProvider>,
    script_evaluator_factory: Arc<dyn ScriptEvaluatorFactory>,
    getter_strategy: Arc<dyn GetterPropertySelectionStrategy>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl ValidatorConfiguration {
    /// Creates a configuration over `registry` with the built-in constraints
    /// and default plug-ins.
    pub fn new(registry: ClassRegistry) -> Self {
        Self {
            registry,
            settings: FactorySettings::default(),
            definitions: ConstraintDefinitions::with_builtins(),
            documents: Vec::new(),
            mappings: Vec::new(),
            extractors: Vec::new(),
            bundles: Vec::new(),
            message_interpolator: None,
            traversable_resolver: Arc::new(TraverseAllResolver),
            constraint_validator_factory: Arc::new(DefaultConstraintValidatorFactory),
            parameter_name_provider: Arc::new(DefaultParameterNameProvider),
            clock_provider: Arc::new(SystemClockProvider),
            script_evaluator_factory: Arc::new(DefaultScriptEvaluatorFactory::default()),
            getter_strategy: Arc::new(DefaultGetterPropertySelectionStrategy),
            payload: None,
        }
    }

    /// Replaces all scalar options.
    pub fn with_settings(mut self, settings: FactorySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Loads scalar options from a TOML or YAML file.
    pub fn with_settings_file(self, path: &Path) -> Result<Self> {
        let settings = constraints_mapping::load_settings(path).map_err(|e| {
            ValidationError::declaration(format!("Invalid settings file '{}': {}", path.display(), e))
        })?;
        Ok(self.with_settings(settings))
    }

    /// Stops every call at its first violation.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.settings.fail_fast = fail_fast;
        self
    }

    /// Lets overriding methods alter parameter constraints.
    pub fn with_allow_overriding_method_alter_parameter_constraint(mut self, allow: bool) -> Self {
        self.settings.allow_overriding_method_alter_parameter_constraint = allow;
        self
    }

    /// Lets a return value be cascaded more than once per hierarchy line.
    pub fn with_allow_multiple_cascaded_validation_on_return_values(mut self, allow: bool) -> Self {
        self.settings.allow_multiple_cascaded_validation_on_return_values = allow;
        self
    }

    /// Lets parallel methods define parameter constraints.
    pub fn with_allow_parallel_methods_define_parameter_constraints(mut self, allow: bool) -> Self {
        self.settings.allow_parallel_methods_define_parameter_constraints = allow;
        self
    }

    /// Memoises traversable resolver answers within a call.
    pub fn with_traversable_resolver_result_cache(mut self, enabled: bool) -> Self {
        self.settings.traversable_resolver_result_cache_enabled = enabled;
        self
    }

    /// Locales messages are available in.
    pub fn with_locales<I>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = Locale>,
    {
        self.settings.locales = locales.into_iter().collect();
        self
    }

    /// Locale used when no preference matches.
    pub fn with_default_locale(mut self, locale: Locale) -> Self {
        self.settings.default_locale = locale;
        self
    }

    /// Slack granted to temporal constraints.
    pub fn with_temporal_validation_tolerance(mut self, tolerance: chrono::Duration) -> Self {
        self.settings.temporal_validation_tolerance_nanos =
            tolerance.num_nanoseconds().map_or(u64::MAX, |n| n.max(0) as u64);
        self
    }

    /// Classes a predefined-scope factory builds metadata for.
    pub fn with_bean_classes_to_initialize<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.bean_classes_to_initialize = classes.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a parsed mapping document.
    pub fn with_mapping_document(mut self, document: MappingDocument) -> Self {
        self.documents.push(document);
        self
    }

    /// Parses and adds a mapping document file (YAML, TOML or JSON).
    ///
    /// # Arguments
    ///
    /// * `path` - File to load; the format follows the extension
    pub fn with_mapping_file(self, path: &Path) -> Result<Self> {
        let document = parse_file(path).map_err(|e| {
            ValidationError::declaration(format!("Invalid mapping file '{}': {}", path.display(), e))
        })?;
        debug!(path = %path.display(), classes = document.beans.len(), "Loaded mapping file");
        Ok(self.with_mapping_document(document))
    }

    /// Adds a programmatic mapping.
    pub fn with_constraint_mapping(mut self, mapping: ConstraintMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Registers a custom constraint kind.
    pub fn with_constraint_definition(mut self, definition: ConstraintDefinition) -> Self {
        self.definitions.register(definition);
        self
    }

    /// Registers a validator that mappings may attach to constraint kinds by
    /// id.
    pub fn with_constraint_validator(mut self, validator: ValidatorDescriptor) -> Self {
        self.definitions.register_validator(validator);
        self
    }

    /// Adds a value extractor, replacing the built-in one for the same
    /// container and type argument.
    pub fn with_value_extractor(mut self, extractor: Arc<dyn ValueExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Adds user messages in `.properties` format for the locale `suffix`
    /// (`""` for the root bundle).
    pub fn with_message_bundle(mut self, suffix: impl Into<String>, content: impl Into<String>) -> Self {
        self.bundles.push((suffix.into(), content.into()));
        self
    }

    /// Directory holding `ValidationMessages*.properties` user bundles.
    pub fn with_message_bundle_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.settings.message_bundle_dir = Some(dir.into());
        self
    }

    /// Replaces the message interpolator.
    pub fn with_message_interpolator(mut self, interpolator: Arc<dyn MessageInterpolator>) -> Self {
        self.message_interpolator = Some(interpolator);
        self
    }

    /// Replaces the traversable resolver.
    pub fn with_traversable_resolver(mut self, resolver: Arc<dyn TraversableResolver>) -> Self {
        self.traversable_resolver = resolver;
        self
    }

    /// Replaces the factory creating validator instances.
    pub fn with_constraint_validator_factory(mut self, factory: Arc<dyn ConstraintValidatorFactory>) -> Self {
        self.constraint_validator_factory = factory;
        self
    }

    /// Replaces the parameter name provider.
    pub fn with_parameter_name_provider(mut self, provider: Arc<dyn ParameterNameProvider>) -> Self {
        self.parameter_name_provider = provider;
        self
    }

    /// Replaces the clock.
    pub fn with_clock_provider(mut self, clock: Arc<dyn ClockProvider>) -> Self {
        self.clock_provider = clock;
        self
    }

    /// Replaces the script evaluator factory.
    pub fn with_script_evaluator_factory(mut self, factory: Arc<dyn ScriptEvaluatorFactory>) -> Self {
        self.script_evaluator_factory = factory;
        self
    }

    /// Replaces the getter property selection strategy.
    pub fn with_getter_property_selection_strategy(mut self, strategy: Arc<dyn GetterPropertySelectionStrategy>) -> Self {
        self.getter_strategy = strategy;
        self
    }

    /// Payload handed to every constraint validator.
    pub fn with_constraint_validator_payload(mut self, payload: impl Any + Send + Sync) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Builds a factory whose metadata is built on first use.
    pub fn build(self) -> Result<ValidatorFactory> {
        if !self.settings.bean_classes_to_initialize.is_empty() {
            warn!(
                classes = self.settings.bean_classes_to_initialize.len(),
                "Classes to initialize are only used by predefined-scope factories"
            );
        }
        let settings = self.settings.clone();
        let (builder, engine_parts) = self.into_parts()?;
        let engine = engine_parts.finish(Arc::new(OpenBeanMetadataManager::new(builder)));
        info!(scope = "open", fail_fast = settings.fail_fast, "Built validator factory");
        Ok(ValidatorFactory {
            engine: Arc::new(engine),
            settings,
        })
    }

    /// Builds a factory for the classes set through
    /// [`Self::with_bean_classes_to_initialize`]; validating any other class
    /// is a precondition error.
    pub fn build_predefined_scope(self) -> Result<PredefinedScopeValidatorFactory> {
        let settings = self.settings.clone();
        let (builder, engine_parts) = self.into_parts()?;
        let manager = Arc::new(PredefinedScopeBeanMetadataManager::new(
            &builder,
            &settings.bean_classes_to_initialize,
        )?);
        let classes = manager.classes().into_iter().map(str::to_string).collect();
        let engine = engine_parts.finish(manager);
        info!(scope = "predefined", fail_fast = settings.fail_fast, "Built validator factory");
        Ok(PredefinedScopeValidatorFactory {
            inner: ValidatorFactory {
                engine: Arc::new(engine),
                settings,
            },
            classes,
        })
    }

    fn into_parts(self) -> Result<(BeanMetadataBuilder, EngineParts)> {
        let settings = self.settings;

        // 1. Constraint definitions, with redefinitions from mappings
        let mut definitions = self.definitions;
        for mapping in self
            .documents
            .iter()
            .flat_map(|d| d.constraint_definitions.iter())
            .chain(self.mappings.iter().flat_map(|m| m.definitions().iter()))
        {
            definitions.apply_mapping(mapping)?;
        }
        let registry = Arc::new(self.registry);
        let resolver = Arc::new(ValidatorResolver::new(Arc::new(definitions), registry.clone()));
        let meta_constraints = MetaConstraintBuilder::new(resolver.clone());

        // 2. Providers: external, programmatic, declared
        let external = MappingMetadataProvider::new(
            ConfigurationSource::External,
            self.documents.into_iter().flat_map(|d| d.beans).collect(),
            registry.clone(),
            meta_constraints.clone(),
            self.getter_strategy.clone(),
        )?;
        let programmatic = MappingMetadataProvider::new(
            ConfigurationSource::Programmatic,
            self.mappings.iter().flat_map(|m| m.types().iter().cloned()).collect(),
            registry.clone(),
            meta_constraints.clone(),
            self.getter_strategy.clone(),
        )?;
        let mut options = AnnotationProcessingOptions::default();
        options.merge(&external.annotation_processing_options());
        options.merge(&programmatic.annotation_processing_options());
        let declared = DeclaredMetadataProvider::new(
            registry.clone(),
            meta_constraints,
            self.getter_strategy.clone(),
            options,
        );
        let providers: Vec<Arc<dyn MetadataProvider>> =
            vec![Arc::new(external), Arc::new(programmatic), Arc::new(declared)];
        let builder = BeanMetadataBuilder::new(
            registry.clone(),
            providers,
            self.parameter_name_provider,
            MethodValidationConfiguration::from(&settings),
        );

        // 3. Messages
        let interpolator = match self.message_interpolator {
            Some(interpolator) => interpolator,
            None => {
                let mut bundle = match &settings.message_bundle_dir {
                    Some(dir) => MessageBundle::from_dir(dir)?,
                    None => MessageBundle::new(),
                };
                for (suffix, content) in &self.bundles {
                    bundle.add_properties(suffix, content);
                }
                Arc::new(ResourceBundleMessageInterpolator::new(
                    settings.locales.clone(),
                    settings.default_locale.clone(),
                    bundle,
                ))
            }
        };

        let tolerance = i64::try_from(settings.temporal_validation_tolerance_nanos)
            .map(chrono::Duration::nanoseconds)
            .map_err(|_| ValidationError::declaration("Temporal validation tolerance is out of range"))?;
        let parts = EngineParts {
            registry,
            resolver,
            extractors: ValueExtractors::with_user_extractors(&self.extractors)?,
            interpolator,
            traversable: self.traversable_resolver,
            validator_factory: self.constraint_validator_factory,
            clock: self.clock_provider,
            scripts: self.script_evaluator_factory,
            getters: self.getter_strategy,
            payload: self.payload,
            tolerance,
            fail_fast: settings.fail_fast,
            cache_traversable: settings.traversable_resolver_result_cache_enabled,
        };
        Ok((builder, parts))
    }
}

/// Engine collaborators waiting for their metadata manager.
struct EngineParts {
    registry: Arc<ClassRegistry>,
    resolver: Arc<ValidatorResolver>,
    extractors: ValueExtractors,
    interpolator: Arc<dyn MessageInterpolator>,
    traversable: Arc<dyn TraversableResolver>,
    validator_factory: Arc<dyn ConstraintValidatorFactory>,
    clock: Arc<dyn ClockProvider>,
    scripts: Arc<dyn ScriptEvaluatorFactory>,
    getters: Arc<dyn GetterPropertySelectionStrategy>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
    tolerance: chrono::Duration,
    fail_fast: bool,
    cache_traversable: bool,
}

impl EngineParts {
    fn finish(self, metadata: Arc<dyn BeanMetadataManager>) -> Engine {
        Engine {
            registry: self.registry,
            resolver: self.resolver,
            metadata,
            extractors: self.extractors,
            interpolator: self.interpolator,
            traversable: self.traversable,
            validator_factory: self.validator_factory,
            clock: self.clock,
            scripts: self.scripts,
            getters: self.getters,
            payload: self.payload,
            tolerance: self.tolerance,
            fail_fast: self.fail_fast,
            cache_traversable: self.cache_traversable,
        }
    }
}

/// Hands out validators sharing one metadata cache.
#[derive(Clone)]
pub struct ValidatorFactory {
    engine: Arc<Engine>,
    settings: FactorySettings,
}

impl ValidatorFactory {
    /// A validator using the default locale preferences.
    pub fn validator(&self) -> Validator {
        Validator::new(self.engine.clone())
    }

    /// A validator interpolating messages for `preferences`.
    pub fn validator_for(&self, preferences: Vec<LanguageRange>) -> Validator {
        self.validator().with_locale_preferences(preferences)
    }

    /// Scalar options the factory was built with.
    pub fn settings(&self) -> &FactorySettings {
        &self.settings
    }
}

/// Factory serving only the classes initialized when it was built.
#[derive(Clone)]
pub struct PredefinedScopeValidatorFactory {
    inner: ValidatorFactory,
    classes: Vec<String>,
}

impl PredefinedScopeValidatorFactory {
    /// A validator using the default locale preferences.
    pub fn validator(&self) -> Validator {
        self.inner.validator()
    }

    /// A validator interpolating messages for `preferences`.
    pub fn validator_for(&self, preferences: Vec<LanguageRange>) -> Validator {
        self.inner.validator_for(preferences)
    }

    /// Scalar options the factory was built with.
    pub fn settings(&self) -> &FactorySettings {
        self.inner.settings()
    }

    /// Classes with metadata, including the supertypes of the requested
    /// ones.
    pub fn initialized_classes(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constraints_core::{ClassBuilder, ConstraintAnnotation, DynamicBean, FieldBuilder, TypeRef};
    use constraints_mapping::{PropertyMapping, TypeMapping};
    use pretty_assertions::assert_eq;

    fn registry() -> ClassRegistry {
        ClassRegistry::new().with_class(
            ClassBuilder::new("Customer")
                .field(
                    FieldBuilder::new("name", TypeRef::Text)
                        .constraint(ConstraintAnnotation::new("NotNull"))
                        .build(),
                )
                .field(FieldBuilder::new("email", TypeRef::Text).build())
                .build(),
        )
    }

    #[test]
    fn test_programmatic_mapping_adds_constraints() {
        let mapping = ConstraintMapping::new().type_mapping(
            TypeMapping::new("Customer").field(
                PropertyMapping::new("email").constraint(ConstraintAnnotation::new("NotBlank")),
            ),
        );
        let validator = ValidatorConfiguration::new(registry())
            .with_constraint_mapping(mapping)
            .build()
            .unwrap()
            .validator();

        let customer = DynamicBean::new("Customer").with("email", "").into_ref();
        let violations = validator.validate(&customer, &[]).unwrap();
        let mut paths = violations.paths();
        paths.sort();
        assert_eq!(paths, vec!["email", "name"]);
    }

    #[test]
    fn test_ignore_annotations_from_mapping() {
        let mapping = ConstraintMapping::new().type_mapping(
            TypeMapping::new("Customer").field(PropertyMapping::new("name").ignore_annotations(true)),
        );
        let validator = ValidatorConfiguration::new(registry())
            .with_constraint_mapping(mapping)
            .build()
            .unwrap()
            .validator();

        let customer = DynamicBean::new("Customer").into_ref();
        assert!(validator.validate(&customer, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_mapped_class_is_rejected() {
        let mapping = ConstraintMapping::new().type_mapping(TypeMapping::new("Supplier"));
        let result = ValidatorConfiguration::new(registry())
            .with_constraint_mapping(mapping)
            .build();
        assert!(matches!(result, Err(ValidationError::ConstraintDeclaration(_))));
    }

    #[test]
    fn test_predefined_scope_lists_classes() {
        let factory = ValidatorConfiguration::new(registry())
            .with_bean_classes_to_initialize(["Customer"])
            .build_predefined_scope()
            .unwrap();
        assert_eq!(factory.initialized_classes().to_vec(), vec!["Customer".to_string()]);
    }

    #[test]
    fn test_temporal_tolerance_setting() {
        let factory = ValidatorConfiguration::new(registry())
            .with_temporal_validation_tolerance(chrono::Duration::milliseconds(5))
            .build()
            .unwrap();
        assert_eq!(factory.settings().temporal_validation_tolerance_nanos, 5_000_000);
    }
}
