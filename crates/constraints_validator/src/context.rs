//! Context handed to validators.
//!
//! Besides answering `is_valid`, a validator may replace the default
//! violation with custom ones pointing at sub-nodes, contribute message
//! parameters and expression variables, or attach a dynamic payload.

use crate::plugins::ClockProvider;
use crate::script::ScriptEvaluatorFactory;
use constraints_core::{ConstraintDescriptor, ContainerKind, ElementKind, Path, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Services available while evaluating constraints.
#[derive(Clone, Copy)]
pub(crate) struct Services<'a> {
    pub clock: &'a dyn ClockProvider,
    pub tolerance: chrono::Duration,
    pub payload: Option<&'a (dyn Any + Send + Sync)>,
    pub scripts: &'a dyn ScriptEvaluatorFactory,
    pub parameter_names: Option<&'a [String]>,
}

/// Extra node requested by a custom violation.
#[derive(Debug, Clone, PartialEq)]
enum NodeSpec {
    Property(String),
    Bean,
    ContainerElement(String, ContainerKind, usize),
    Parameter(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Position {
    Iterable,
    Index(usize),
    Key(Value),
}

/// A violation reported by a validator, before interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationDraft {
    pub(crate) template: String,
    pub(crate) descriptor: Option<Arc<ConstraintDescriptor>>,
    nodes: Vec<(NodeSpec, Option<Position>)>,
    pub(crate) message_parameters: BTreeMap<String, Value>,
    pub(crate) expression_variables: BTreeMap<String, Value>,
    pub(crate) dynamic_payload: Option<Value>,
}

impl ViolationDraft {
    pub(crate) fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            descriptor: None,
            nodes: Vec::new(),
            message_parameters: BTreeMap::new(),
            expression_variables: BTreeMap::new(),
            dynamic_payload: None,
        }
    }

    /// Message template of the draft.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Appends the requested nodes to `path`.
    pub(crate) fn extend_path(&self, path: &mut Path, parameter_names: Option<&[String]>) {
        for (node, position) in &self.nodes {
            match position {
                Some(Position::Iterable) => path.make_leaf_iterable(),
                Some(Position::Index(index)) => path.make_leaf_iterable_with_index(*index),
                Some(Position::Key(key)) => path.make_leaf_iterable_with_key(key.clone()),
                None => {}
            }
            match node {
                NodeSpec::Property(name) => path.add_property_node(name.clone()),
                NodeSpec::Bean => path.add_bean_node(),
                NodeSpec::ContainerElement(name, container, index) => {
                    path.set_type_parameter(*container, *index);
                    path.add_container_element_node(name.clone());
                }
                NodeSpec::Parameter(index) => {
                    if path.leaf().map(|n| n.kind()) == Some(ElementKind::CrossParameter) {
                        path.remove_leaf();
                    }
                    let name = parameter_names
                        .and_then(|names| names.get(*index).cloned())
                        .unwrap_or_else(|| format!("arg{}", index));
                    path.add_parameter_node(name, *index);
                }
            }
        }
    }
}

/// Per-evaluation context of a [`crate::ConstraintValidator`].
pub struct ConstraintValidatorContext<'a> {
    descriptor: &'a ConstraintDescriptor,
    services: Services<'a>,
    default_disabled: bool,
    custom: Vec<ViolationDraft>,
    message_parameters: BTreeMap<String, Value>,
    expression_variables: BTreeMap<String, Value>,
    dynamic_payload: Option<Value>,
}

impl<'a> ConstraintValidatorContext<'a> {
    pub(crate) fn new(descriptor: &'a ConstraintDescriptor, services: Services<'a>) -> Self {
        Self {
            descriptor,
            services,
            default_disabled: false,
            custom: Vec::new(),
            message_parameters: BTreeMap::new(),
            expression_variables: BTreeMap::new(),
            dynamic_payload: None,
        }
    }

    /// Descriptor of the constraint being evaluated.
    pub fn descriptor(&self) -> &ConstraintDescriptor {
        self.descriptor
    }

    /// Suppresses the violation built from the default message template.
    pub fn disable_default_constraint_violation(&mut self) {
        self.default_disabled = true;
    }

    /// Message template of the constraint.
    pub fn default_constraint_message_template(&self) -> &str {
        &self.descriptor.message_template
    }

    /// Starts a custom violation.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// context.disable_default_constraint_violation();
    /// context
    ///     .build_constraint_violation_with_template("{street.required}")
    ///     .add_property_node("street")
    ///     .add_constraint_violation();
    /// ```
    pub fn build_constraint_violation_with_template(
        &mut self,
        template: impl Into<String>,
    ) -> ConstraintViolationBuilder<'_> {
        ConstraintViolationBuilder {
            sink: &mut self.custom,
            draft: ViolationDraft::new(template),
        }
    }

    /// Adds a `{name}` parameter for message interpolation.
    pub fn add_message_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.message_parameters.insert(name.into(), value.into());
        self
    }

    /// Adds a variable for `${...}` expressions.
    pub fn add_expression_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.expression_variables.insert(name.into(), value.into());
        self
    }

    /// Attaches a payload to the violations of this evaluation.
    pub fn with_dynamic_payload(&mut self, payload: impl Into<Value>) -> &mut Self {
        self.dynamic_payload = Some(payload.into());
        self
    }

    /// Clock used by temporal constraints.
    pub fn clock_provider(&self) -> &dyn ClockProvider {
        self.services.clock
    }

    /// Slack allowed by temporal constraints.
    pub fn temporal_validation_tolerance(&self) -> chrono::Duration {
        self.services.tolerance
    }

    /// Factory-wide payload, if one of type `T` was configured.
    pub fn constraint_validator_payload<T: Any>(&self) -> Option<&T> {
        self.services.payload.and_then(|p| p.downcast_ref::<T>())
    }

    /// Factory of script evaluators.
    pub fn script_evaluator_factory(&self) -> &dyn ScriptEvaluatorFactory {
        self.services.scripts
    }

    /// Parameter names of the executable, for cross-parameter constraints.
    pub fn parameter_names(&self) -> Option<&[String]> {
        self.services.parameter_names
    }

    /// Drafts to report after a failed evaluation.
    pub(crate) fn into_drafts(self) -> Vec<ViolationDraft> {
        let mut drafts = Vec::with_capacity(self.custom.len() + 1);
        if !self.default_disabled {
            drafts.push(ViolationDraft::new(self.descriptor.message_template.clone()));
        }
        drafts.extend(self.custom);
        for draft in &mut drafts {
            for (name, value) in &self.message_parameters {
                draft.message_parameters.entry(name.clone()).or_insert_with(|| value.clone());
            }
            for (name, value) in &self.expression_variables {
                draft.expression_variables.entry(name.clone()).or_insert_with(|| value.clone());
            }
            if draft.dynamic_payload.is_none() {
                draft.dynamic_payload = self.dynamic_payload.clone();
            }
        }
        drafts
    }
}

/// Builder of a custom violation.
pub struct ConstraintViolationBuilder<'c> {
    sink: &'c mut Vec<ViolationDraft>,
    draft: ViolationDraft,
}

impl ConstraintViolationBuilder<'_> {
    /// Appends a property node.
    pub fn add_property_node(mut self, name: impl Into<String>) -> Self {
        self.draft.nodes.push((NodeSpec::Property(name.into()), None));
        self
    }

    /// Appends a bean node, used to report on a container element bean.
    pub fn add_bean_node(mut self) -> Self {
        self.draft.nodes.push((NodeSpec::Bean, None));
        self
    }

    /// Appends a container element node.
    pub fn add_container_element_node(
        mut self,
        name: impl Into<String>,
        container: ContainerKind,
        type_argument_index: usize,
    ) -> Self {
        self.draft.nodes.push((
            NodeSpec::ContainerElement(name.into(), container, type_argument_index),
            None,
        ));
        self
    }

    /// Replaces the cross-parameter node by the node of parameter `index`.
    pub fn add_parameter_node(mut self, index: usize) -> Self {
        self.draft.nodes.push((NodeSpec::Parameter(index), None));
        self
    }

    /// Marks the last node as an element of an unordered container.
    pub fn in_iterable(self) -> Self {
        self.position(Position::Iterable)
    }

    /// Marks the last node as the element at `index` of its container.
    pub fn in_iterable_at_index(self, index: usize) -> Self {
        self.position(Position::Index(index))
    }

    /// Marks the last node as the value under `key` of its map.
    pub fn in_iterable_at_key(self, key: impl Into<Value>) -> Self {
        self.position(Position::Key(key.into()))
    }

    fn position(mut self, position: Position) -> Self {
        if let Some(last) = self.draft.nodes.last_mut() {
            last.1 = Some(position);
        }
        self
    }

    /// Adds a message parameter for this violation only.
    pub fn add_message_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.draft.message_parameters.insert(name.into(), value.into());
        self
    }

    /// Records the violation.
    pub fn add_constraint_violation(self) {
        self.sink.push(self.draft);
    }
}
