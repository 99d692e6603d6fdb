//! Script based constraints.

use crate::constraint_validator::ConstraintValidator;
use crate::context::ConstraintValidatorContext;
use anyhow::{Context, bail};
use constraints_core::{ConstraintDescriptor, Value};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
struct Script {
    language: String,
    source: String,
}

impl Script {
    fn from_descriptor(descriptor: &ConstraintDescriptor) -> anyhow::Result<Self> {
        let language = descriptor.text_attribute("lang").context("Script constraints require 'lang'")?;
        let source = descriptor.text_attribute("script").context("Script constraints require 'script'")?;
        if language.trim().is_empty() {
            bail!("The script language must not be empty");
        }
        if source.trim().is_empty() {
            bail!("The script must not be empty");
        }
        Ok(Self {
            language: language.to_string(),
            source: source.to_string(),
        })
    }

    fn evaluate(
        &self,
        context: &ConstraintValidatorContext<'_>,
        bindings: &BTreeMap<String, Value>,
    ) -> anyhow::Result<bool> {
        let evaluator = context.script_evaluator_factory().evaluator(&self.language)?;
        match evaluator.evaluate(&self.source, bindings)? {
            Value::Bool(result) => Ok(result),
            other => bail!(
                "Script '{}' returned {} instead of a boolean",
                self.source,
                other.type_name()
            ),
        }
    }
}

/// `ScriptAssert(lang, script, alias, reportOn)`: evaluates a script with
/// the validated object bound to `alias`.
#[derive(Debug, Default)]
pub struct ScriptAssertValidator {
    script: Script,
    alias: String,
    report_on: Option<String>,
}

impl ConstraintValidator for ScriptAssertValidator {
    fn initialize(&mut self, descriptor: &ConstraintDescriptor) -> anyhow::Result<()> {
        self.script = Script::from_descriptor(descriptor)?;
        self.alias = descriptor.text_attribute("alias").unwrap_or("_this").to_string();
        self.report_on = descriptor
            .text_attribute("reportOn")
            .filter(|p| !p.is_empty())
            .map(String::from);
        Ok(())
    }

    fn is_valid(&self, value: &Value, context: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
        let bindings = BTreeMap::from([(self.alias.clone(), value.clone())]);
        let valid = self.script.evaluate(context, &bindings)?;
        if !valid {
            if let Some(property) = &self.report_on {
                context.disable_default_constraint_violation();
                let template = context.default_constraint_message_template().to_string();
                context
                    .build_constraint_violation_with_template(template)
                    .add_property_node(property.clone())
                    .add_constraint_violation();
            }
        }
        Ok(valid)
    }
}

/// `ParameterScriptAssert(lang, script)`: evaluates a script with every
/// argument bound to its parameter name.
#[derive(Debug, Default)]
pub struct ParameterScriptAssertValidator {
    script: Script,
}

impl ConstraintValidator for ParameterScriptAssertValidator {
    fn initialize(&mut self, descriptor: &ConstraintDescriptor) -> anyhow::Result<()> {
        self.script = Script::from_descriptor(descriptor)?;
        Ok(())
    }

    fn is_valid(&self, value: &Value, context: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
        let Value::Array(arguments) = value else {
            bail!("Cross-parameter scripts validate argument arrays, got {}", value.type_name());
        };
        let names = context.parameter_names();
        let bindings: BTreeMap<String, Value> = arguments
            .iter()
            .enumerate()
            .map(|(i, argument)| {
                let name = names
                    .and_then(|n| n.get(i).cloned())
                    .unwrap_or_else(|| format!("arg{}", i));
                (name, argument.clone())
            })
            .collect();
        self.script.evaluate(context, &bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::FixedClockProvider;
    use crate::test_support::{descriptor, now, run, run_with};
    use chrono::Duration;
    use constraints_core::{ConstraintAnnotation, ConstraintLocationKind, DynamicBean};
    use crate::definition::ConstraintDefinitions;

    #[test]
    fn test_script_assert_binds_alias() {
        let d = descriptor(
            &ConstraintAnnotation::new("ScriptAssert")
                .attr("lang", "expression")
                .attr("script", "_this.start < _this.end"),
        );
        let mut v = ScriptAssertValidator::default();
        v.initialize(&d).unwrap();

        let ok = Value::from(DynamicBean::new("Rental").with("start", 1).with("end", 2));
        let wrong = Value::from(DynamicBean::new("Rental").with("start", 3).with("end", 2));
        assert!(run(&v, &d, &ok));
        assert!(!run(&v, &d, &wrong));
    }

    #[test]
    fn test_parameter_script_uses_parameter_names() {
        let d = ConstraintDefinitions::with_builtins()
            .build_descriptor(
                &ConstraintAnnotation::new("ParameterScriptAssert")
                    .attr("lang", "expression")
                    .attr("script", "start < end"),
                ConstraintLocationKind::CrossParameter,
                "Rental",
            )
            .unwrap();
        let mut v = ParameterScriptAssertValidator::default();
        v.initialize(&d).unwrap();

        let names = vec!["start".to_string(), "end".to_string()];
        let clock = FixedClockProvider(now());
        let args = Value::Array(vec![Value::Int(5), Value::Int(1)]);
        assert!(!run_with(&v, &d, &args, &clock, Duration::zero(), Some(&names)));
        let args = Value::Array(vec![Value::Int(1), Value::Int(5)]);
        assert!(run_with(&v, &d, &args, &clock, Duration::zero(), Some(&names)));
    }

    #[test]
    fn test_empty_script_is_rejected() {
        let d = descriptor(&ConstraintAnnotation::new("ScriptAssert").attr("lang", "expression").attr("script", " "));
        assert!(ScriptAssertValidator::default().initialize(&d).is_err());
    }
}
