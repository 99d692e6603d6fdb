//! Constraint trees.
//!
//! A composed constraint is evaluated as a tree: every composing constraint
//! is a child node, and the composed constraint's own validator (if any) runs
//! after its children. The composition type decides whether the children's
//! results make the composed constraint fail.

use crate::constraint_validator::{ConstraintValidatorFactory, ValidatorDescriptor, ValidatorTarget};
use crate::context::{ConstraintValidatorContext, Services, ViolationDraft};
use crate::resolver::ValidatorResolver;
use constraints_core::{
    CompositionType, ConstraintDescriptor, ConstraintLocation, Result, TypeRef, ValidationError, Value,
};
use std::sync::Arc;
use tracing::trace;

/// A resolved constraint with its composing constraints.
#[derive(Debug)]
pub(crate) struct ConstraintTree {
    descriptor: Arc<ConstraintDescriptor>,
    validator: Option<ValidatorDescriptor>,
    children: Vec<ConstraintTree>,
}

impl ConstraintTree {
    /// Resolves validators for `descriptor` and its composing constraints
    /// on elements declared as `declared`.
    pub(crate) fn build(
        descriptor: &Arc<ConstraintDescriptor>,
        declared: &TypeRef,
        location: &ConstraintLocation,
        resolver: &ValidatorResolver,
    ) -> Result<Self> {
        let target = if descriptor.is_cross_parameter() {
            ValidatorTarget::CrossParameter
        } else {
            ValidatorTarget::Generic
        };
        let definition = resolver.definitions().get(&descriptor.kind)?;
        let validator = resolver.resolve(&descriptor.kind, declared, target)?;
        if validator.is_none() && (definition.has_validators_for(target) || descriptor.composing.is_empty()) {
            return Err(ValidationError::unexpected_type(
                descriptor.kind.clone(),
                declared.to_string(),
                location.to_string(),
            ));
        }

        let children = descriptor
            .composing
            .iter()
            .map(|child| Self::build(child, declared, location, resolver))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            descriptor: descriptor.clone(),
            validator,
            children,
        })
    }

    /// The constraint at the root of the tree.
    pub(crate) fn descriptor(&self) -> &Arc<ConstraintDescriptor> {
        &self.descriptor
    }

    /// Evaluates the tree against `value` and returns the violation drafts.
    pub(crate) fn validate(
        &self,
        value: &Value,
        factory: &dyn ConstraintValidatorFactory,
        services: Services<'_>,
        fail_fast: bool,
    ) -> Result<Vec<ViolationDraft>> {
        let descriptor = &self.descriptor;
        let single = descriptor.report_as_single_violation;
        let and = descriptor.composition_type == CompositionType::And;

        // 1. Composing constraints
        let mut child_drafts = Vec::new();
        let mut passed_children = 0usize;
        for child in &self.children {
            let drafts = child.validate(value, factory, services, fail_fast)?;
            if drafts.is_empty() {
                passed_children += 1;
                continue;
            }
            child_drafts.extend(drafts);
            if and && (fail_fast || single) {
                break;
            }
        }
        let children_valid = match descriptor.composition_type {
            CompositionType::And => child_drafts.is_empty(),
            CompositionType::Or => self.children.is_empty() || passed_children > 0,
            CompositionType::AllFalse => passed_children == 0,
        };

        // 2. Own validator, unless the outcome is already decided
        let skip_own = !children_valid && (fail_fast || (single && and));
        let own_drafts = match (&self.validator, skip_own) {
            (Some(validator), false) => self.run_validator(validator, value, factory, services)?,
            _ => Vec::new(),
        };

        // 3. Report
        if single {
            if children_valid && own_drafts.is_empty() {
                return Ok(Vec::new());
            }
            let draft = own_drafts.into_iter().next().unwrap_or_else(|| {
                let mut draft = ViolationDraft::new(descriptor.message_template.clone());
                draft.descriptor = Some(descriptor.clone());
                draft
            });
            return Ok(vec![draft]);
        }

        let mut drafts = child_drafts;
        drafts.extend(own_drafts);
        Ok(drafts)
    }

    fn run_validator(
        &self,
        validator: &ValidatorDescriptor,
        value: &Value,
        factory: &dyn ConstraintValidatorFactory,
        services: Services<'_>,
    ) -> Result<Vec<ViolationDraft>> {
        let wrap = |e: anyhow::Error| ValidationError::validator(validator.id(), e);
        let mut instance = factory.instance(validator).map_err(wrap)?;
        instance.initialize(&self.descriptor).map_err(wrap)?;

        let mut context = ConstraintValidatorContext::new(&self.descriptor, services);
        let outcome = instance.is_valid(value, &mut context);
        factory.release(instance);
        let valid = outcome.map_err(wrap)?;
        trace!(constraint = %self.descriptor.kind, validator = validator.id(), valid, "Evaluated constraint");
        if valid {
            return Ok(Vec::new());
        }

        let mut drafts = context.into_drafts();
        for draft in &mut drafts {
            draft.descriptor = Some(self.descriptor.clone());
        }
        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint_validator::DefaultConstraintValidatorFactory;
    use crate::definition::{AttributeOverride, ConstraintDefinition, ConstraintDefinitions};
    use crate::plugins::FixedClockProvider;
    use crate::script::DefaultScriptEvaluatorFactory;
    use crate::test_support::now;
    use constraints_core::{ClassRegistry, ConstraintAnnotation, ConstraintLocationKind};
    use pretty_assertions::assert_eq;

    fn definitions() -> ConstraintDefinitions {
        let mut definitions = ConstraintDefinitions::with_builtins();
        definitions.register(
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
                .report_as_single_violation(),
        );
        definitions.register(
            ConstraintDefinition::new("Strict", "{strict}")
                .composed_of(ConstraintAnnotation::new("NotBlank"))
                .composed_of(ConstraintAnnotation::new("Size").attr("max", 3)),
        );
        definitions.register(
            ConstraintDefinition::new("EmptyOrShort", "{empty.or.short}")
                .composed_of(ConstraintAnnotation::new("Null"))
                .composed_of(ConstraintAnnotation::new("Size").attr("max", 2))
                .composition(CompositionType::Or)
                .report_as_single_violation(),
        );
        definitions
    }

    fn evaluate(kind: &str, value: Value) -> Vec<ViolationDraft> {
        let definitions = Arc::new(definitions());
        let resolver = ValidatorResolver::new(definitions.clone(), Arc::new(ClassRegistry::new()));
        let descriptor = definitions
            .build_descriptor(&ConstraintAnnotation::new(kind), ConstraintLocationKind::Field, "Address")
            .unwrap();
        let location = ConstraintLocation::field("Address", "zip", TypeRef::Text);
        let tree = ConstraintTree::build(&descriptor, &TypeRef::Text, &location, &resolver).unwrap();

        let clock = FixedClockProvider(now());
        let scripts = DefaultScriptEvaluatorFactory::default();
        let services = Services {
            clock: &clock,
            tolerance: chrono::Duration::zero(),
            payload: None,
            scripts: &scripts,
            parameter_names: None,
        };
        tree.validate(&value, &DefaultConstraintValidatorFactory, services, false)
            .unwrap()
    }

    #[test]
    fn test_report_as_single_violation() {
        let drafts = evaluate("ZipCode", Value::from("123"));
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].template(), "{zip.invalid}");
        assert!(evaluate("ZipCode", Value::from("12345")).is_empty());
    }

    #[test]
    fn test_and_collects_every_failing_child() {
        let drafts = evaluate("Strict", Value::from("     "));
        let kinds: Vec<&str> = drafts
            .iter()
            .filter_map(|d| d.descriptor.as_ref().map(|d| d.kind.as_str()))
            .collect();
        assert_eq!(kinds, vec!["NotBlank", "Size"]);
    }

    #[test]
    fn test_or_composition() {
        assert!(evaluate("EmptyOrShort", Value::Null).is_empty());
        assert!(evaluate("EmptyOrShort", Value::from("ab")).is_empty());
        assert_eq!(evaluate("EmptyOrShort", Value::from("abc")).len(), 1);
    }

    #[test]
    fn test_unexpected_type() {
        let definitions = Arc::new(definitions());
        let resolver = ValidatorResolver::new(definitions.clone(), Arc::new(ClassRegistry::new()));
        let descriptor = definitions
            .build_descriptor(&ConstraintAnnotation::new("Past"), ConstraintLocationKind::Field, "Order")
            .unwrap();
        let location = ConstraintLocation::field("Order", "id", TypeRef::Integer);
        let err = ConstraintTree::build(&descriptor, &TypeRef::Integer, &location, &resolver).unwrap_err();
        assert!(matches!(err, ValidationError::UnexpectedType { .. }));
    }
}
