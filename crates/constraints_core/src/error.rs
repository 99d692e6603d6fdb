//! Error types for the constraint-validation engine.
//!
//! Constraint violations are *values* (see [`crate::ConstraintViolation`]) and
//! never travel through this type. `ValidationError` covers the conditions
//! that stop a validation call or a metadata build: illegal declarations,
//! broken group definitions, unresolvable validators, failing plug-ins and
//! caller mistakes.

use thiserror::Error;

/// Boxed error used to carry the cause of a failing validator or plug-in.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Errors raised by the engine.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Illegal static configuration: conflicting overrides, ambiguous
    /// validators, invalid default group sequences, unknown attributes.
    #[error("Constraint declaration error: {0}")]
    ConstraintDeclaration(String),

    /// Cyclic group sequence or a sequence nested inside another sequence.
    #[error("Group definition error: {0}")]
    GroupDefinition(String),

    /// No validator can handle the declared type of a constrained element.
    #[error(
        "No validator could be found for constraint '{constraint}' validating type '{declared_type}'. Check configuration for '{location}'"
    )]
    UnexpectedType {
        /// Constraint kind
        constraint: String,
        /// Declared type of the validated element
        declared_type: String,
        /// Human readable location of the constraint
        location: String,
    },

    /// Overlapping, ambiguous or missing value extractors.
    #[error("Value extraction error: {0}")]
    ValueExtractionDefinition(String),

    /// A validator implementation or plug-in failed.
    #[error("Unexpected failure in {component}: {source}")]
    Validator {
        /// The validator or plug-in that failed
        component: String,
        /// Underlying cause
        #[source]
        source: BoxError,
    },

    /// Caller error: null root, unknown property or executable, value of the
    /// wrong type.
    #[error("Illegal argument: {0}")]
    Precondition(String),
}

impl ValidationError {
    /// Creates a new constraint declaration error.
    pub fn declaration(message: impl Into<String>) -> Self {
        Self::ConstraintDeclaration(message.into())
    }

    /// Creates a new group definition error.
    pub fn group_definition(message: impl Into<String>) -> Self {
        Self::GroupDefinition(message.into())
    }

    /// Creates a new unexpected type error.
    pub fn unexpected_type(
        constraint: impl Into<String>,
        declared_type: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self::UnexpectedType {
            constraint: constraint.into(),
            declared_type: declared_type.into(),
            location: location.into(),
        }
    }

    /// Creates a new value extraction definition error.
    pub fn value_extraction(message: impl Into<String>) -> Self {
        Self::ValueExtractionDefinition(message.into())
    }

    /// Wraps the failure of a validator or plug-in.
    pub fn validator(component: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Validator {
            component: component.into(),
            source: source.into(),
        }
    }

    /// Creates a new precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Returns true for errors caused by static configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ConstraintDeclaration(_)
                | Self::GroupDefinition(_)
                | Self::UnexpectedType { .. }
                | Self::ValueExtractionDefinition(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_source_is_preserved() {
        let io = std::io::Error::other("disk on fire");
        let err = ValidationError::validator("MyValidator", io);

        let source = std::error::Error::source(&err).expect("source must be kept");
        assert_eq!(source.to_string(), "disk on fire");
        assert!(err.to_string().contains("MyValidator"));
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_configuration_error_kinds() {
        assert!(ValidationError::declaration("x").is_configuration_error());
        assert!(ValidationError::group_definition("x").is_configuration_error());
        assert!(ValidationError::value_extraction("x").is_configuration_error());
        assert!(ValidationError::unexpected_type("Size", "Integer", "Order#id").is_configuration_error());
        assert!(!ValidationError::precondition("x").is_configuration_error());
    }
}
