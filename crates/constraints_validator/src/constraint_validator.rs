//! The validator contract and the factory that instantiates validators.

use crate::context::ConstraintValidatorContext;
use constraints_core::{ConstraintDescriptor, TypeRef, Value};
use std::fmt;
use std::sync::Arc;

/// Checks one constraint against one value.
///
/// A fresh instance is created for every evaluation through the configured
/// [`ConstraintValidatorFactory`], initialised with the descriptor of the
/// constraint and then asked whether the value is valid.
///
/// # Example
///
/// ```rust
/// use constraints_validator::{ConstraintValidator, ConstraintValidatorContext};
/// use constraints_core::Value;
///
/// struct IsEven;
///
/// impl ConstraintValidator for IsEven {
///     fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
///         Ok(value.as_int().is_none_or(|i| i % 2 == 0))
///     }
/// }
/// ```
pub trait ConstraintValidator: Send {
    /// Reads the attributes of the constraint. Called once before
    /// [`ConstraintValidator::is_valid`].
    fn initialize(&mut self, _descriptor: &ConstraintDescriptor) -> anyhow::Result<()> {
        Ok(())
    }

    /// Returns whether `value` satisfies the constraint.
    fn is_valid(
        &self,
        value: &Value,
        context: &mut ConstraintValidatorContext<'_>,
    ) -> anyhow::Result<bool>;
}

/// What a validator validates: the annotated element or the argument array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidatorTarget {
    /// The annotated element (field, property, parameter, return value, class)
    Generic,
    /// The arguments of an executable
    CrossParameter,
}

type Constructor = Arc<dyn Fn() -> Box<dyn ConstraintValidator> + Send + Sync>;

/// A registered validator implementation.
///
/// Descriptors are identified by `id`; external mappings refer to validators
/// by that id.
#[derive(Clone)]
pub struct ValidatorDescriptor {
    id: String,
    validated_type: TypeRef,
    target: ValidatorTarget,
    constructor: Constructor,
}

impl ValidatorDescriptor {
    /// Describes a validator of values assignable to `validated_type`.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier of the implementation
    /// * `validated_type` - Most general type the validator accepts
    /// * `constructor` - Creates a fresh validator instance
    pub fn new<F>(id: impl Into<String>, validated_type: TypeRef, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn ConstraintValidator> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            validated_type,
            target: ValidatorTarget::Generic,
            constructor: Arc::new(constructor),
        }
    }

    /// Describes a cross-parameter validator.
    pub fn cross_parameter<F>(id: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn ConstraintValidator> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            validated_type: TypeRef::argument_array(),
            target: ValidatorTarget::CrossParameter,
            constructor: Arc::new(constructor),
        }
    }

    /// Identifier of the implementation.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Most general type the validator accepts.
    pub fn validated_type(&self) -> &TypeRef {
        &self.validated_type
    }

    /// Whether this is a generic or a cross-parameter validator.
    pub fn target(&self) -> ValidatorTarget {
        self.target
    }

    /// Creates a new instance.
    pub fn instantiate(&self) -> Box<dyn ConstraintValidator> {
        (self.constructor)()
    }
}

impl PartialEq for ValidatorDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.target == other.target
    }
}

impl fmt::Debug for ValidatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorDescriptor")
            .field("id", &self.id)
            .field("validated_type", &self.validated_type)
            .field("target", &self.target)
            .finish()
    }
}

/// Creates validator instances.
pub trait ConstraintValidatorFactory: Send + Sync {
    /// Returns a validator instance for `descriptor`.
    fn instance(&self, descriptor: &ValidatorDescriptor) -> anyhow::Result<Box<dyn ConstraintValidator>>;

    /// Gives an instance back once the evaluation is over.
    fn release(&self, _validator: Box<dyn ConstraintValidator>) {}
}

/// Factory calling the descriptor's constructor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConstraintValidatorFactory;

impl ConstraintValidatorFactory for DefaultConstraintValidatorFactory {
    fn instance(&self, descriptor: &ValidatorDescriptor) -> anyhow::Result<Box<dyn ConstraintValidator>> {
        Ok(descriptor.instantiate())
    }
}
