//! Validation engine.
//!
//! A [`Validator`] walks a bean graph (or the arguments and return value of
//! an executable) and evaluates the meta-constraints of each element in the
//! requested group order. Every call gets its own state holding the
//! collected violations, the meta-constraints already evaluated, the beans
//! currently being cascaded into and the memoised traversable answers.

use crate::constraint_validator::ConstraintValidatorFactory;
use crate::context::{Services, ViolationDraft};
use crate::extraction::{ValueExtractors, mark_position};
use crate::interpolation::{InterpolationContext, MessageInterpolator};
use crate::metadata::{BeanMetadata, BeanMetadataManager, CascadingMetadata, ExecutableMetadata, MetaConstraint};
use crate::order::ValidationOrder;
use crate::plugins::{ClockProvider, GetterPropertySelectionStrategy, TraversableResolver};
use crate::resolver::ValidatorResolver;
use crate::script::ScriptEvaluatorFactory;
use constraints_core::{
    BeanRef, ClassRegistry, ConstraintLocation, ConstraintViolation, ConstraintViolations, ContainerKind,
    ElementType, ExecutableKind, Group, LanguageRange, LocationElement, Path, Result, Signature, TypeRef,
    ValidationError, Value,
};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// Everything a validator shares with the factory that created it.
pub(crate) struct Engine {
    pub(crate) registry: Arc<ClassRegistry>,
    pub(crate) resolver: Arc<ValidatorResolver>,
    pub(crate) metadata: Arc<dyn BeanMetadataManager>,
    pub(crate) extractors: ValueExtractors,
    pub(crate) interpolator: Arc<dyn MessageInterpolator>,
    pub(crate) traversable: Arc<dyn TraversableResolver>,
    pub(crate) validator_factory: Arc<dyn ConstraintValidatorFactory>,
    pub(crate) clock: Arc<dyn ClockProvider>,
    pub(crate) scripts: Arc<dyn ScriptEvaluatorFactory>,
    pub(crate) getters: Arc<dyn GetterPropertySelectionStrategy>,
    pub(crate) payload: Option<Arc<dyn Any + Send + Sync>>,
    pub(crate) tolerance: chrono::Duration,
    pub(crate) fail_fast: bool,
    pub(crate) cache_traversable: bool,
}

/// Validates beans, single properties, values and executable calls.
///
/// Validators are cheap to clone and can be shared between threads. Each
/// call is independent; the only shared state are the metadata and
/// validator resolution caches of the factory.
///
/// # Example
///
/// ```rust
/// use constraints_core::{ClassBuilder, ClassRegistry, ConstraintAnnotation, DynamicBean, FieldBuilder, TypeRef};
/// use constraints_validator::ValidatorConfiguration;
///
/// let registry = ClassRegistry::new().with_class(
///     ClassBuilder::new("Customer")
///         .field(
///             FieldBuilder::new("name", TypeRef::Text)
///                 .constraint(ConstraintAnnotation::new("NotBlank"))
///                 .build(),
///         )
///         .build(),
/// );
/// let validator = ValidatorConfiguration::new(registry)
///     .build()
///     .unwrap()
///     .validator();
///
/// let customer = DynamicBean::new("Customer").with("name", " ").into_ref();
/// let violations = validator.validate(&customer, &[]).unwrap();
/// assert_eq!(violations.paths(), vec!["name"]);
/// assert_eq!(violations.messages(), vec!["must not be blank"]);
/// ```
#[derive(Clone)]
pub struct Validator {
    engine: Arc<Engine>,
    preferences: Vec<LanguageRange>,
}

impl Validator {
    pub(crate) fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            preferences: Vec::new(),
        }
    }

    /// Returns a validator interpolating messages for `preferences`.
    pub fn with_locale_preferences(mut self, preferences: Vec<LanguageRange>) -> Self {
        self.preferences = preferences;
        self
    }

    /// Locale preferences used for messages.
    pub fn locale_preferences(&self) -> &[LanguageRange] {
        &self.preferences
    }

    /// Metadata of `class` as used by this validator.
    pub fn bean_metadata(&self, class: &str) -> Result<Arc<BeanMetadata>> {
        self.engine.metadata.bean_metadata(class)
    }

    /// Validates `bean` and everything it cascades to.
    ///
    /// # Arguments
    ///
    /// * `bean` - Root of the graph
    /// * `groups` - Groups to validate; `Default` when empty
    pub fn validate(&self, bean: &BeanRef, groups: &[Group]) -> Result<ConstraintViolations> {
        let engine = self.engine.as_ref();
        debug!(class = bean.class_name(), ?groups, "Validating bean");
        let metadata = engine.metadata.bean_metadata(bean.class_name())?;
        let order = ValidationOrder::build(groups, &engine.registry)?;

        let mut call = Call::new(engine, &self.preferences, Some(bean.clone()), bean.class_name());
        call.validate_bean(Some(bean), &metadata, &Path::root(), &order, Scope::Bean)?;
        Ok(call.finish())
    }

    /// Validates the constraints of one property of `bean` without
    /// cascading.
    ///
    /// `property` may be a dotted path through bean-valued properties, such
    /// as `address.street`. A null bean on the way yields no violations.
    pub fn validate_property(&self, bean: &BeanRef, property: &str, groups: &[Group]) -> Result<ConstraintViolations> {
        let engine = self.engine.as_ref();
        debug!(class = bean.class_name(), property, ?groups, "Validating property");
        let order = ValidationOrder::build(groups, &engine.registry)?;
        let mut call = Call::new(engine, &self.preferences, Some(bean.clone()), bean.class_name());

        let Some((host, metadata, path_to_bean, name)) = call.resolve_property(bean, property)? else {
            return Ok(call.finish());
        };
        call.validate_bean(Some(&host), &metadata, &path_to_bean, &order, Scope::Property(&name))?;
        Ok(call.finish())
    }

    /// Validates `value` against the constraints of `property` of `class`
    /// as if it were the value of that property.
    pub fn validate_value(
        &self,
        class: &str,
        property: &str,
        value: &Value,
        groups: &[Group],
    ) -> Result<ConstraintViolations> {
        let engine = self.engine.as_ref();
        debug!(class, property, ?groups, "Validating value");
        let metadata = engine.metadata.bean_metadata(class)?;
        let order = ValidationOrder::build(groups, &engine.registry)?;

        let mut call = Call::new(engine, &self.preferences, None, class);
        let declared = call.check_property(&metadata, property)?;
        if !value.conforms_to(&declared, engine.registry.as_ref()) {
            return Err(ValidationError::precondition(format!(
                "A {} does not conform to {}, the type of property '{}' of '{}'",
                value.type_name(),
                declared,
                property,
                class
            )));
        }
        call.fixed_value = Some((property.to_string(), value.clone()));
        call.validate_bean(None, &metadata, &Path::root(), &order, Scope::Property(property))?;
        Ok(call.finish())
    }

    /// Validates the arguments of a call to `method` on `bean`.
    pub fn validate_parameters(
        &self,
        bean: &BeanRef,
        method: &Signature,
        arguments: &[Value],
        groups: &[Group],
    ) -> Result<ConstraintViolations> {
        let engine = self.engine.as_ref();
        debug!(class = bean.class_name(), method = %method, ?groups, "Validating parameters");
        let metadata = engine.metadata.bean_metadata(bean.class_name())?;
        let executable = find_executable(&metadata, method, ExecutableKind::Method)?;
        check_arguments(engine, executable, arguments)?;
        let order = executable_order(engine, &metadata, Some(bean), groups)?;

        let mut call = Call::new(engine, &self.preferences, Some(bean.clone()), bean.class_name());
        call.executable_parameters = Some(arguments.to_vec());
        call.parameter_names = Some(executable.parameter_names());
        call.validate_parameters(executable, arguments, &order)?;
        Ok(call.finish())
    }

    /// Validates the value returned by a call to `method` on `bean`.
    pub fn validate_return_value(
        &self,
        bean: &BeanRef,
        method: &Signature,
        return_value: &Value,
        groups: &[Group],
    ) -> Result<ConstraintViolations> {
        let engine = self.engine.as_ref();
        debug!(class = bean.class_name(), method = %method, ?groups, "Validating return value");
        let metadata = engine.metadata.bean_metadata(bean.class_name())?;
        let executable = find_executable(&metadata, method, ExecutableKind::Method)?;
        let order = executable_order(engine, &metadata, Some(bean), groups)?;

        let mut call = Call::new(engine, &self.preferences, Some(bean.clone()), bean.class_name());
        call.executable_return_value = Some(return_value.clone());
        call.validate_return_value(Some(bean), executable, return_value, &order)?;
        Ok(call.finish())
    }

    /// Validates the arguments of a call to a constructor of `class`.
    pub fn validate_constructor_parameters(
        &self,
        class: &str,
        constructor: &Signature,
        arguments: &[Value],
        groups: &[Group],
    ) -> Result<ConstraintViolations> {
        let engine = self.engine.as_ref();
        debug!(class, constructor = %constructor, ?groups, "Validating constructor parameters");
        let metadata = engine.metadata.bean_metadata(class)?;
        let executable = find_executable(&metadata, constructor, ExecutableKind::Constructor)?;
        check_arguments(engine, executable, arguments)?;
        let order = executable_order(engine, &metadata, None, groups)?;

        let mut call = Call::new(engine, &self.preferences, None, class);
        call.executable_parameters = Some(arguments.to_vec());
        call.parameter_names = Some(executable.parameter_names());
        call.validate_parameters(executable, arguments, &order)?;
        Ok(call.finish())
    }

    /// Validates the bean created by a constructor of `class`.
    pub fn validate_constructor_return_value(
        &self,
        class: &str,
        constructor: &Signature,
        created: &BeanRef,
        groups: &[Group],
    ) -> Result<ConstraintViolations> {
        let engine = self.engine.as_ref();
        debug!(class, constructor = %constructor, ?groups, "Validating constructor return value");
        let metadata = engine.metadata.bean_metadata(class)?;
        let executable = find_executable(&metadata, constructor, ExecutableKind::Constructor)?;
        let order = executable_order(engine, &metadata, Some(created), groups)?;

        let created_value = Value::Bean(created.clone());
        let mut call = Call::new(engine, &self.preferences, None, class);
        call.executable_return_value = Some(created_value.clone());
        call.validate_return_value(Some(created), executable, &created_value, &order)?;
        Ok(call.finish())
    }
}

fn find_executable<'m>(
    metadata: &'m BeanMetadata,
    signature: &Signature,
    kind: ExecutableKind,
) -> Result<&'m ExecutableMetadata> {
    metadata
        .executable(signature)
        .filter(|e| e.kind == kind)
        .ok_or_else(|| {
            let what = match kind {
                ExecutableKind::Method => "method",
                ExecutableKind::Constructor => "constructor",
            };
            ValidationError::precondition(format!(
                "Class '{}' has no {} {}",
                metadata.class(),
                what,
                signature
            ))
        })
}

fn check_arguments(engine: &Engine, executable: &ExecutableMetadata, arguments: &[Value]) -> Result<()> {
    if arguments.len() != executable.parameters.len() {
        return Err(ValidationError::precondition(format!(
            "{} expects {} arguments, got {}",
            executable.signature,
            executable.parameters.len(),
            arguments.len()
        )));
    }
    for (parameter, argument) in executable.parameters.iter().zip(arguments) {
        if !argument.conforms_to(&parameter.declared_type, engine.registry.as_ref()) {
            return Err(ValidationError::precondition(format!(
                "Argument {} of {} is a {}, which does not conform to {}",
                parameter.index,
                executable.signature,
                argument.type_name(),
                parameter.declared_type
            )));
        }
    }
    Ok(())
}

/// Order for executable validation: the requested groups, with `Default`
/// replaced by the redefined default group sequence of the class.
fn executable_order(
    engine: &Engine,
    metadata: &BeanMetadata,
    bean: Option<&BeanRef>,
    groups: &[Group],
) -> Result<ValidationOrder> {
    let mut order = ValidationOrder::build(groups, &engine.registry)?;
    if metadata.redefines_default_group_sequence() {
        let sequence = metadata.default_validation_sequence(bean)?;
        let steps = ValidationOrder::sequence_steps(&Group::new(metadata.class()), &sequence, &engine.registry)?;
        order.redefine_default(steps);
    }
    Ok(order)
}

fn identity(bean: Option<&BeanRef>) -> usize {
    bean.map_or(0, BeanRef::identity)
}

fn property_element_type(location: &ConstraintLocation) -> ElementType {
    match location.element {
        LocationElement::Getter { .. } => ElementType::Method,
        _ => ElementType::Field,
    }
}

/// Which constraints of a bean a pass evaluates.
#[derive(Debug, Clone, Copy)]
enum Scope<'s> {
    /// Every constraint, followed by cascades
    Bean,
    /// The constraints of one property, without cascades
    Property(&'s str),
}

impl Scope<'_> {
    fn includes(&self, constraint: &MetaConstraint) -> bool {
        match self {
            Scope::Bean => true,
            Scope::Property(name) => constraint.location().property_name() == Some(*name),
        }
    }
}

/// State of one validation call.
struct Call<'e> {
    engine: &'e Engine,
    preferences: &'e [LanguageRange],
    root_bean: Option<BeanRef>,
    root_class: String,
    executable_parameters: Option<Vec<Value>>,
    executable_return_value: Option<Value>,
    parameter_names: Option<Vec<String>>,
    fixed_value: Option<(String, Value)>,
    violations: ConstraintViolations,
    /// (bean identity, path, meta-constraint) already evaluated
    processed: HashSet<(usize, String, usize)>,
    /// (bean identity, group) being cascaded into
    ancestors: HashSet<(usize, Group)>,
    traversable_answers: HashMap<(usize, String, bool), bool>,
}

impl<'e> Call<'e> {
    fn new(
        engine: &'e Engine,
        preferences: &'e [LanguageRange],
        root_bean: Option<BeanRef>,
        root_class: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            preferences,
            root_bean,
            root_class: root_class.into(),
            executable_parameters: None,
            executable_return_value: None,
            parameter_names: None,
            fixed_value: None,
            violations: ConstraintViolations::new(),
            processed: HashSet::new(),
            ancestors: HashSet::new(),
            traversable_answers: HashMap::new(),
        }
    }

    fn finish(self) -> ConstraintViolations {
        debug!(
            root_class = %self.root_class,
            violations = self.violations.len(),
            evaluated = self.processed.len(),
            "Validation finished"
        );
        self.violations
    }

    fn is_done(&self) -> bool {
        self.engine.fail_fast && !self.violations.is_empty()
    }

    /// Runs the plain groups of `order` together, then every sequence step
    /// by step. Constraints of a group run before its cascades; a sequence
    /// stops after the first step adding violations.
    fn run_order<C, K>(&mut self, order: &ValidationOrder, mut constraints: C, mut cascades: K) -> Result<()>
    where
        C: FnMut(&mut Self, &Group) -> Result<()>,
        K: FnMut(&mut Self, &Group) -> Result<()>,
    {
        // 1. Plain groups
        for group in order.groups() {
            constraints(self, group)?;
            if self.is_done() {
                return Ok(());
            }
        }
        for group in order.groups() {
            cascades(self, group)?;
            if self.is_done() {
                return Ok(());
            }
        }

        // 2. Sequences
        for sequence in order.sequences() {
            for step in &sequence.steps {
                let before = self.violations.len();
                for group in step {
                    constraints(self, group)?;
                    if self.is_done() {
                        return Ok(());
                    }
                }
                for group in step {
                    cascades(self, group)?;
                    if self.is_done() {
                        return Ok(());
                    }
                }
                if self.violations.len() > before {
                    trace!(sequence = %sequence.group, "Group sequence stopped after failing step");
                    break;
                }
            }
        }
        Ok(())
    }

    fn validate_bean(
        &mut self,
        host: Option<&BeanRef>,
        metadata: &Arc<BeanMetadata>,
        path: &Path,
        order: &ValidationOrder,
        scope: Scope<'_>,
    ) -> Result<()> {
        self.run_order(
            order,
            |call, group| call.validate_bean_constraints(host, metadata, path, group, scope),
            |call, group| match (scope, host) {
                (Scope::Bean, Some(bean)) => call.validate_cascades(bean, metadata, path, group),
                _ => Ok(()),
            },
        )
    }

    /// Evaluates the bean constraints of `group`.
    ///
    /// For `Default`, the hierarchy is walked from the class upwards: a class
    /// redefining its default group sequence has all its constraints
    /// validated along that sequence and ends the walk, any other class
    /// contributes the constraints it declares itself.
    fn validate_bean_constraints(
        &mut self,
        host: Option<&BeanRef>,
        metadata: &Arc<BeanMetadata>,
        path: &Path,
        group: &Group,
        scope: Scope<'_>,
    ) -> Result<()> {
        let engine = self.engine;
        if !group.is_default() {
            let constraints: Vec<_> = metadata.all_meta_constraints().filter(|c| scope.includes(c)).cloned().collect();
            return self.validate_member_constraints(host, path, &constraints, group);
        }

        for class in metadata.hierarchy() {
            let class_metadata = if class == metadata.class() {
                metadata.clone()
            } else {
                engine.metadata.bean_metadata(class)?
            };

            if class_metadata.redefines_default_group_sequence() {
                let sequence = class_metadata.default_validation_sequence(host)?;
                let steps = ValidationOrder::sequence_steps(&Group::new(class.as_str()), &sequence, &engine.registry)?;
                let constraints: Vec<_> = class_metadata
                    .all_meta_constraints()
                    .filter(|c| scope.includes(c))
                    .cloned()
                    .collect();
                for step in &steps {
                    let before = self.violations.len();
                    for step_group in step {
                        self.validate_member_constraints(host, path, &constraints, step_group)?;
                        if self.is_done() {
                            return Ok(());
                        }
                    }
                    if self.violations.len() > before {
                        break;
                    }
                }
                return Ok(());
            }

            let constraints: Vec<_> = metadata
                .direct_meta_constraints(class)
                .filter(|c| scope.includes(c))
                .cloned()
                .collect();
            self.validate_member_constraints(host, path, &constraints, group)?;
            if self.is_done() {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Evaluates class-level and property constraints of `group`, reading
    /// property values from `host`.
    fn validate_member_constraints(
        &mut self,
        host: Option<&BeanRef>,
        path_to_bean: &Path,
        constraints: &[Arc<MetaConstraint>],
        group: &Group,
    ) -> Result<()> {
        for constraint in constraints {
            if !constraint.descriptor().is_in_group(group) {
                continue;
            }
            let (path, value) = match constraint.location().property_name() {
                None => {
                    let mut path = path_to_bean.clone();
                    path.add_bean_node();
                    (path, host.map_or(Value::Null, |b| Value::Bean(b.clone())))
                }
                Some(name) => {
                    let path = path_to_bean.with_property(name);
                    let element_type = property_element_type(constraint.location());
                    if !self.is_traversable(host, path_to_bean, &path, element_type, false)? {
                        continue;
                    }
                    (path, self.property_value(host, name))
                }
            };
            self.validate_constraint_once(host, &path, &value, constraint)?;
            if self.is_done() {
                break;
            }
        }
        Ok(())
    }

    /// Evaluates constraints of `group` on a value whose path is known.
    fn validate_element_constraints(
        &mut self,
        host: Option<&BeanRef>,
        path: &Path,
        value: &Value,
        constraints: &[Arc<MetaConstraint>],
        group: &Group,
    ) -> Result<()> {
        for constraint in constraints {
            if !constraint.descriptor().is_in_group(group) {
                continue;
            }
            self.validate_constraint_once(host, path, value, constraint)?;
            if self.is_done() {
                break;
            }
        }
        Ok(())
    }

    fn validate_constraint_once(
        &mut self,
        host: Option<&BeanRef>,
        path: &Path,
        value: &Value,
        constraint: &Arc<MetaConstraint>,
    ) -> Result<()> {
        let key = (identity(host), path.to_string(), Arc::as_ptr(constraint) as usize);
        if !self.processed.insert(key) {
            return Ok(());
        }
        self.validate_extracted(constraint, host, path.clone(), value, constraint.extraction_path())
    }

    /// Follows the extraction steps of a constraint down to the values it
    /// applies to.
    fn validate_extracted(
        &mut self,
        constraint: &MetaConstraint,
        host: Option<&BeanRef>,
        path: Path,
        value: &Value,
        steps: &[(ContainerKind, usize)],
    ) -> Result<()> {
        let Some((&(container, index), rest)) = steps.split_first() else {
            return self.evaluate(constraint, host, &path, value);
        };
        let extractor = self.engine.extractors.find(container, index)?;
        for extracted in extractor.extract(value) {
            let mut element_path = path.clone();
            mark_position(&mut element_path, &extracted.position);
            if let Some(name) = extractor.node_name() {
                element_path.set_type_parameter(container, index);
                element_path.add_container_element_node(name);
            }
            self.validate_extracted(constraint, host, element_path, &extracted.value, rest)?;
            if self.is_done() {
                break;
            }
        }
        Ok(())
    }

    fn evaluate(&mut self, constraint: &MetaConstraint, host: Option<&BeanRef>, path: &Path, value: &Value) -> Result<()> {
        let engine = self.engine;
        let tree = constraint.tree(&engine.resolver)?;
        let drafts = {
            let services = Services {
                clock: engine.clock.as_ref(),
                tolerance: engine.tolerance,
                payload: engine.payload.as_deref(),
                scripts: engine.scripts.as_ref(),
                parameter_names: self.parameter_names.as_deref(),
            };
            tree.validate(value, engine.validator_factory.as_ref(), services, engine.fail_fast)?
        };
        trace!(
            constraint = %constraint.descriptor().kind,
            path = %path,
            violations = drafts.len(),
            "Evaluated constraint"
        );
        for draft in drafts {
            self.add_violation(constraint, draft, host, path, value)?;
            if self.is_done() {
                break;
            }
        }
        Ok(())
    }

    fn add_violation(
        &mut self,
        constraint: &MetaConstraint,
        draft: ViolationDraft,
        host: Option<&BeanRef>,
        path: &Path,
        value: &Value,
    ) -> Result<()> {
        let descriptor = draft.descriptor.clone().unwrap_or_else(|| constraint.descriptor().clone());
        let mut property_path = path.clone();
        draft.extend_path(&mut property_path, self.parameter_names.as_deref());

        let context = InterpolationContext {
            descriptor: Some(descriptor.as_ref()),
            validated_value: value,
            message_parameters: &draft.message_parameters,
            expression_variables: &draft.expression_variables,
        };
        let message = self
            .engine
            .interpolator
            .interpolate(&draft.template, &context, self.preferences)
            .map_err(|e| ValidationError::validator("message interpolator", e))?;

        self.violations.insert(ConstraintViolation {
            message,
            message_template: draft.template,
            root_bean: self.root_bean.clone(),
            root_bean_class: self.root_class.clone(),
            leaf_bean: host.cloned(),
            property_path,
            invalid_value: value.clone(),
            descriptor,
            executable_parameters: self.executable_parameters.clone(),
            executable_return_value: self.executable_return_value.clone(),
            dynamic_payload: draft.dynamic_payload,
        });
        Ok(())
    }

    fn property_value(&self, host: Option<&BeanRef>, name: &str) -> Value {
        if let Some((property, value)) = &self.fixed_value {
            if property == name {
                return value.clone();
            }
        }
        host.and_then(|b| b.property(name)).unwrap_or(Value::Null)
    }

    /// Asks the traversable resolver whether a property may be read or, with
    /// `cascade`, also cascaded.
    fn is_traversable(
        &mut self,
        host: Option<&BeanRef>,
        path_to_bean: &Path,
        property_path: &Path,
        element_type: ElementType,
        cascade: bool,
    ) -> Result<bool> {
        let Some(node) = property_path.leaf() else {
            return Ok(true);
        };
        let engine = self.engine;
        let key = (identity(host), property_path.to_string(), cascade);
        if engine.cache_traversable {
            if let Some(answer) = self.traversable_answers.get(&key) {
                return Ok(*answer);
            }
        }

        let resolver = engine.traversable.as_ref();
        let wrap = |e: anyhow::Error| ValidationError::validator("traversable resolver", e);
        let mut answer = resolver
            .is_reachable(host, node, &self.root_class, path_to_bean, element_type)
            .map_err(wrap)?;
        if answer && cascade {
            answer = resolver
                .is_cascadable(host, node, &self.root_class, path_to_bean, element_type)
                .map_err(wrap)?;
        }
        if !answer {
            trace!(path = %property_path, cascade, "Property is not traversable");
        }
        if engine.cache_traversable {
            self.traversable_answers.insert(key, answer);
        }
        Ok(answer)
    }

    /// Cascades into the cascaded properties of `bean` for `group`.
    fn validate_cascades(&mut self, bean: &BeanRef, metadata: &BeanMetadata, path: &Path, group: &Group) -> Result<()> {
        let key = (bean.identity(), group.clone());
        let inserted = self.ancestors.insert(key.clone());
        let result = self.cascade_properties(bean, metadata, path, group);
        if inserted {
            self.ancestors.remove(&key);
        }
        result
    }

    fn cascade_properties(&mut self, bean: &BeanRef, metadata: &BeanMetadata, path: &Path, group: &Group) -> Result<()> {
        for property in metadata.properties().iter().filter(|p| p.cascading.is_cascading()) {
            let property_path = path.with_property(&property.name);
            if !self.is_traversable(Some(bean), path, &property_path, property.element_type, true)? {
                continue;
            }
            let value = self.property_value(Some(bean), &property.name);
            self.cascade_value(&value, &property_path, &property.cascading, group)?;
            if self.is_done() {
                break;
            }
        }
        Ok(())
    }

    /// Cascades into `value` as declared by `cascading`.
    fn cascade_value(&mut self, value: &Value, path: &Path, cascading: &CascadingMetadata, group: &Group) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }

        // 1. The element itself, and runtime containers of beans
        if cascading.cascade {
            let converted = cascading.convert_group(group);
            self.cascade_runtime_value(value, path, &converted)?;
            if self.is_done() {
                return Ok(());
            }
        }

        // 2. Cascaded type arguments
        for element in &cascading.container_elements {
            let extractor = self
                .engine
                .extractors
                .find(element.container, element.type_argument_index)?;
            for extracted in extractor.extract(value) {
                let mut element_path = path.clone();
                mark_position(&mut element_path, &extracted.position);
                self.cascade_value(&extracted.value, &element_path, &element.cascading, group)?;
                if self.is_done() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn cascade_runtime_value(&mut self, value: &Value, path: &Path, group: &Group) -> Result<()> {
        match value {
            Value::Bean(bean) => self.validate_cascaded_bean(bean, path, group),
            Value::Optional(Some(inner)) => self.cascade_runtime_value(inner, path, group),
            Value::List(values) | Value::Array(values) => {
                for (index, element) in values.iter().enumerate() {
                    if let Value::Bean(bean) = element {
                        let mut element_path = path.clone();
                        element_path.make_leaf_iterable_with_index(index);
                        self.validate_cascaded_bean(bean, &element_path, group)?;
                        if self.is_done() {
                            break;
                        }
                    }
                }
                Ok(())
            }
            Value::Set(values) => {
                for element in values {
                    if let Value::Bean(bean) = element {
                        let mut element_path = path.clone();
                        element_path.make_leaf_iterable();
                        self.validate_cascaded_bean(bean, &element_path, group)?;
                        if self.is_done() {
                            break;
                        }
                    }
                }
                Ok(())
            }
            Value::Map(entries) => {
                for (key, element) in entries {
                    if let Value::Bean(bean) = element {
                        let mut element_path = path.clone();
                        element_path.make_leaf_iterable_with_key(key.clone());
                        self.validate_cascaded_bean(bean, &element_path, group)?;
                        if self.is_done() {
                            break;
                        }
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn validate_cascaded_bean(&mut self, bean: &BeanRef, path: &Path, group: &Group) -> Result<()> {
        if self.ancestors.contains(&(bean.identity(), group.clone())) {
            trace!(class = bean.class_name(), path = %path, %group, "Bean already being validated, skipping cycle");
            return Ok(());
        }
        let engine = self.engine;
        let metadata = engine.metadata.bean_metadata(bean.class_name())?;
        let order = ValidationOrder::for_cascade(group, &engine.registry)?;
        self.validate_bean(Some(bean), &metadata, path, &order, Scope::Bean)
    }

    /// Walks a dotted property path from `bean` to the bean hosting the last
    /// property.
    fn resolve_property(
        &self,
        bean: &BeanRef,
        property: &str,
    ) -> Result<Option<(BeanRef, Arc<BeanMetadata>, Path, String)>> {
        let segments: Vec<&str> = property.split('.').collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(ValidationError::precondition(format!("Invalid property path '{}'", property)));
        }

        let mut host = bean.clone();
        let mut path = Path::root();
        let (last, intermediate) = match segments.split_last() {
            Some(split) => split,
            None => return Err(ValidationError::precondition("Empty property path")),
        };
        for segment in intermediate {
            let metadata = self.engine.metadata.bean_metadata(host.class_name())?;
            self.check_property(&metadata, segment)?;
            match self.property_value(Some(&host), segment) {
                Value::Bean(next) => {
                    path.add_property_node(*segment);
                    host = next;
                }
                Value::Null => return Ok(None),
                other => {
                    return Err(ValidationError::precondition(format!(
                        "Property '{}' of '{}' holds a {}, not a bean",
                        segment,
                        host.class_name(),
                        other.type_name()
                    )));
                }
            }
        }

        let metadata = self.engine.metadata.bean_metadata(host.class_name())?;
        self.check_property(&metadata, last)?;
        Ok(Some((host, metadata, path, last.to_string())))
    }

    /// Declared type of property `name` of the class described by
    /// `metadata`. Fails if the class declares no such field or getter.
    fn check_property(&self, metadata: &BeanMetadata, name: &str) -> Result<TypeRef> {
        let engine = self.engine;
        let class = metadata.class();
        engine
            .registry
            .hierarchy(class)
            .into_iter()
            .find_map(|c| {
                c.field(name).map(|f| f.declared_type.clone()).or_else(|| {
                    c.methods()
                        .find(|m| engine.getters.property_name(m).as_deref() == Some(name))
                        .and_then(|m| m.return_type.clone())
                })
            })
            .ok_or_else(|| ValidationError::precondition(format!("Class '{}' has no property '{}'", class, name)))
    }

    fn validate_parameters(
        &mut self,
        executable: &ExecutableMetadata,
        arguments: &[Value],
        order: &ValidationOrder,
    ) -> Result<()> {
        let base = executable_path(executable);
        self.run_order(
            order,
            |call, group| call.validate_parameter_constraints(executable, &base, arguments, group),
            |call, group| {
                for (parameter, argument) in executable.parameters.iter().zip(arguments) {
                    if !parameter.cascading.is_cascading() {
                        continue;
                    }
                    let mut path = base.clone();
                    path.add_parameter_node(parameter.name.clone(), parameter.index);
                    call.cascade_value(argument, &path, &parameter.cascading, group)?;
                    if call.is_done() {
                        break;
                    }
                }
                Ok(())
            },
        )
    }

    /// Parameter constraints first, cross-parameter constraints after.
    fn validate_parameter_constraints(
        &mut self,
        executable: &ExecutableMetadata,
        base: &Path,
        arguments: &[Value],
        group: &Group,
    ) -> Result<()> {
        for (parameter, argument) in executable.parameters.iter().zip(arguments) {
            let mut path = base.clone();
            path.add_parameter_node(parameter.name.clone(), parameter.index);
            self.validate_element_constraints(None, &path, argument, &parameter.constraints, group)?;
            if self.is_done() {
                return Ok(());
            }
        }

        if !executable.cross_parameter.is_empty() {
            let mut path = base.clone();
            path.add_cross_parameter_node();
            let arguments = Value::Array(arguments.to_vec());
            self.validate_element_constraints(None, &path, &arguments, &executable.cross_parameter, group)?;
        }
        Ok(())
    }

    fn validate_return_value(
        &mut self,
        host: Option<&BeanRef>,
        executable: &ExecutableMetadata,
        return_value: &Value,
        order: &ValidationOrder,
    ) -> Result<()> {
        let mut path = executable_path(executable);
        path.add_return_value_node();
        let return_metadata = &executable.return_value;
        self.run_order(
            order,
            |call, group| call.validate_element_constraints(host, &path, return_value, &return_metadata.constraints, group),
            |call, group| call.cascade_value(return_value, &path, &return_metadata.cascading, group),
        )
    }
}

fn executable_path(executable: &ExecutableMetadata) -> Path {
    let mut path = Path::root();
    match executable.kind {
        ExecutableKind::Method => path.add_method_node(executable.name.clone()),
        ExecutableKind::Constructor => path.add_constructor_node(executable.name.clone()),
    }
    path
}
