//! Script evaluation for `ScriptAssert` and `ParameterScriptAssert`.

use crate::expression::Expression;
use constraints_core::Value;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Language name of the built-in evaluator.
pub const EXPRESSION_LANGUAGE: &str = "expression";

/// Errors raised by the default script evaluator factory.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// No evaluator exists for the requested language
    #[error("No script evaluator found for language '{0}'")]
    UnsupportedLanguage(String),
}

/// Evaluates scripts of one language.
pub trait ScriptEvaluator: Send + Sync {
    /// Evaluates `script` with the given bindings.
    fn evaluate(&self, script: &str, bindings: &BTreeMap<String, Value>) -> anyhow::Result<Value>;
}

/// Provides script evaluators by language name.
pub trait ScriptEvaluatorFactory: Send + Sync {
    /// Evaluator for `language`.
    fn evaluator(&self, language: &str) -> anyhow::Result<Arc<dyn ScriptEvaluator>>;
}

/// Evaluator for the built-in expression language.
///
/// Parsed scripts are cached by source text.
#[derive(Debug, Default)]
pub struct ExpressionScriptEvaluator {
    parsed: DashMap<String, Arc<Expression>>,
}

impl ScriptEvaluator for ExpressionScriptEvaluator {
    fn evaluate(&self, script: &str, bindings: &BTreeMap<String, Value>) -> anyhow::Result<Value> {
        let expression = match self.parsed.get(script) {
            Some(cached) => cached.clone(),
            None => {
                let parsed = Arc::new(Expression::parse(script)?);
                self.parsed.insert(script.to_string(), parsed.clone());
                parsed
            }
        };
        Ok(expression.evaluate(bindings)?)
    }
}

/// Factory knowing only the `expression` language.
#[derive(Default)]
pub struct DefaultScriptEvaluatorFactory {
    expression: Arc<ExpressionScriptEvaluator>,
}

impl ScriptEvaluatorFactory for DefaultScriptEvaluatorFactory {
    fn evaluator(&self, language: &str) -> anyhow::Result<Arc<dyn ScriptEvaluator>> {
        if language.eq_ignore_ascii_case(EXPRESSION_LANGUAGE) {
            Ok(self.expression.clone())
        } else {
            Err(ScriptError::UnsupportedLanguage(language.to_string()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_language() {
        let factory = DefaultScriptEvaluatorFactory::default();
        let evaluator = factory.evaluator("expression").unwrap();
        let bindings = BTreeMap::from([("start".to_string(), Value::Int(1))]);
        assert_eq!(evaluator.evaluate("start < 2", &bindings).unwrap(), Value::Bool(true));
        // cached
        assert_eq!(evaluator.evaluate("start < 2", &bindings).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_unknown_language() {
        let factory = DefaultScriptEvaluatorFactory::default();
        let err = factory.evaluator("groovy").err().unwrap();
        assert!(err.to_string().contains("groovy"));
    }
}
