//! Past and future checks against the configured clock.
//!
//! The temporal validation tolerance widens the accepted range: a value up
//! to `tolerance` in the future still counts as past, and vice versa.

use crate::constraint_validator::ConstraintValidator;
use crate::context::ConstraintValidatorContext;
use anyhow::bail;
use constraints_core::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Past,
    Future,
}

fn accepts(
    value: &Value,
    context: &ConstraintValidatorContext<'_>,
    direction: Direction,
    or_present: bool,
) -> anyhow::Result<bool> {
    let instant = match value {
        Value::Null => return Ok(true),
        Value::Temporal(t) => *t,
        other => bail!("Cannot compare a {} with the current time", other.type_name()),
    };
    let now = context.clock_provider().now();
    let tolerance = context.temporal_validation_tolerance();
    let (reference, expected) = match direction {
        Direction::Past => (now + tolerance, Ordering::Less),
        Direction::Future => (now - tolerance, Ordering::Greater),
    };
    let ordering = instant.cmp(&reference);
    Ok(ordering == expected || (or_present && ordering == Ordering::Equal))
}

macro_rules! temporal_validator {
    ($(#[$doc:meta])* $name:ident, $direction:expr, $or_present:expr) => {
        $(#[$doc])*
        #[derive(Debug, Default)]
        pub struct $name;

        impl ConstraintValidator for $name {
            fn is_valid(&self, value: &Value, context: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
                accepts(value, context, $direction, $or_present)
            }
        }
    };
}

temporal_validator!(
    /// `Past`
    PastValidator, Direction::Past, false
);
temporal_validator!(
    /// `PastOrPresent`
    PastOrPresentValidator, Direction::Past, true
);
temporal_validator!(
    /// `Future`
    FutureValidator, Direction::Future, false
);
temporal_validator!(
    /// `FutureOrPresent`
    FutureOrPresentValidator, Direction::Future, true
);
