//! Numeric bounds and sign checks on numbers, numeric text and money.

use crate::constraint_validator::ConstraintValidator;
use crate::context::ConstraintValidatorContext;
use anyhow::{Context, bail};
use constraints_core::{ConstraintDescriptor, Value};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::str::FromStr;

/// Compares a numeric value with `limit`.
///
/// Returns `None` for values that have no numeric reading (NaN, text that
/// does not parse, non-numeric values).
fn compare(value: &Value, limit: Decimal) -> Option<Ordering> {
    match value {
        Value::Float(f) if f.is_nan() => None,
        Value::Float(f) if f.is_infinite() => Some(if *f > 0.0 { Ordering::Greater } else { Ordering::Less }),
        Value::Text(s) => Decimal::from_str(s.trim()).ok().map(|d| d.cmp(&limit)),
        Value::Money(m) => Some(m.amount.cmp(&limit)),
        other => other.as_decimal().map(|d| d.cmp(&limit)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Lower,
    Upper,
}

#[derive(Debug)]
struct Limit {
    bound: Bound,
    value: Decimal,
    inclusive: bool,
}

impl Limit {
    fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match (compare(value, self.value), self.bound) {
            (None, _) => false,
            (Some(Ordering::Equal), _) => self.inclusive,
            (Some(ordering), Bound::Lower) => ordering == Ordering::Greater,
            (Some(ordering), Bound::Upper) => ordering == Ordering::Less,
        }
    }

    fn integer(descriptor: &ConstraintDescriptor, bound: Bound) -> anyhow::Result<Self> {
        let value = descriptor
            .int_attribute("value")
            .with_context(|| format!("{} requires an integer value", descriptor.kind))?;
        Ok(Self {
            bound,
            value: Decimal::from(value),
            inclusive: true,
        })
    }

    fn decimal(descriptor: &ConstraintDescriptor, bound: Bound) -> anyhow::Result<Self> {
        let text = match descriptor.attribute("value") {
            Some(v) => v.to_string(),
            None => bail!("{} requires a value", descriptor.kind),
        };
        let value = Decimal::from_str(text.trim())
            .with_context(|| format!("'{}' does not represent a valid decimal", text))?;
        Ok(Self {
            bound,
            value,
            inclusive: descriptor.bool_attribute("inclusive").unwrap_or(true),
        })
    }
}

macro_rules! bound_validator {
    ($(#[$doc:meta])* $name:ident, $ctor:ident, $bound:expr) => {
        $(#[$doc])*
        #[derive(Debug, Default)]
        pub struct $name {
            limit: Option<Limit>,
        }

        impl ConstraintValidator for $name {
            fn initialize(&mut self, descriptor: &ConstraintDescriptor) -> anyhow::Result<()> {
                self.limit = Some(Limit::$ctor(descriptor, $bound)?);
                Ok(())
            }

            fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
                let limit = self.limit.as_ref().context("validator used before initialisation")?;
                Ok(limit.accepts(value))
            }
        }
    };
}

bound_validator!(
    /// `Min(value)`
    MinValidator, integer, Bound::Lower
);
bound_validator!(
    /// `Max(value)`
    MaxValidator, integer, Bound::Upper
);
bound_validator!(
    /// `DecimalMin(value, inclusive)`
    DecimalMinValidator, decimal, Bound::Lower
);
bound_validator!(
    /// `DecimalMax(value, inclusive)`
    DecimalMaxValidator, decimal, Bound::Upper
);

macro_rules! sign_validator {
    ($(#[$doc:meta])* $name:ident, $($accepted:pat_param)|+) => {
        $(#[$doc])*
        #[derive(Debug, Default)]
        pub struct $name;

        impl ConstraintValidator for $name {
            fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
                if value.is_null() {
                    return Ok(true);
                }
                Ok(matches!(compare(value, Decimal::ZERO), $(Some($accepted))|+))
            }
        }
    };
}

sign_validator!(
    /// `Positive`
    PositiveValidator, Ordering::Greater
);
sign_validator!(
    /// `PositiveOrZero`
    PositiveOrZeroValidator, Ordering::Greater | Ordering::Equal
);
sign_validator!(
    /// `Negative`
    NegativeValidator, Ordering::Less
);
sign_validator!(
    /// `NegativeOrZero`
    NegativeOrZeroValidator, Ordering::Less | Ordering::Equal
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{check, descriptor, run};
    use constraints_core::{ConstraintAnnotation, Money};

    fn initialized<V: ConstraintValidator + Default>(annotation: ConstraintAnnotation) -> (V, ConstraintDescriptor) {
        let d = descriptor(&annotation);
        let mut v = V::default();
        v.initialize(&d).unwrap();
        (v, d)
    }

    #[test]
    fn test_decimal_min_on_money() {
        let (v, d) = initialized::<DecimalMinValidator>(
            ConstraintAnnotation::new("DecimalMin").attr("value", "0").attr("inclusive", false),
        );
        assert!(!run(&v, &d, &Value::from(Money::of(0, "EUR"))));
        assert!(run(&v, &d, &Value::from(Money::of(1, "EUR"))));
        assert!(!run(&v, &d, &Value::from(Money::of(-1, "EUR"))));
        assert!(run(&v, &d, &Value::Null));
    }

    #[test]
    fn test_min_max() {
        let (min, d) = initialized::<MinValidator>(ConstraintAnnotation::new("Min").attr("value", 10));
        assert!(run(&min, &d, &Value::Int(10)));
        assert!(!run(&min, &d, &Value::Float(9.5)));
        assert!(run(&min, &d, &Value::from("11")));
        assert!(!run(&min, &d, &Value::from("eleven")));
        assert!(run(&min, &d, &Value::Float(f64::INFINITY)));
        assert!(!run(&min, &d, &Value::Float(f64::NAN)));

        let (max, d) = initialized::<MaxValidator>(ConstraintAnnotation::new("Max").attr("value", 10));
        assert!(run(&max, &d, &Value::Int(10)));
        assert!(!run(&max, &d, &Value::Int(11)));
    }

    #[test]
    fn test_invalid_decimal_attribute() {
        let d = descriptor(&ConstraintAnnotation::new("DecimalMax").attr("value", "ten"));
        assert!(DecimalMaxValidator::default().initialize(&d).is_err());
    }

    #[test]
    fn test_signs() {
        assert!(check(&mut PositiveValidator, "Positive", &Value::Int(1)));
        assert!(!check(&mut PositiveValidator, "Positive", &Value::Int(0)));
        assert!(check(&mut PositiveOrZeroValidator, "PositiveOrZero", &Value::Int(0)));
        assert!(check(&mut NegativeValidator, "Negative", &Value::from(Money::of(-3, "USD"))));
        assert!(!check(&mut NegativeOrZeroValidator, "NegativeOrZero", &Value::Float(0.1)));
    }
}
