//! Built-in constraints.
//!
//! This module defines the standard constraint catalogue:
//! - Null checks: `NotNull`, `Null`
//! - Booleans: `AssertTrue`, `AssertFalse`
//! - Sizes and text: `NotBlank`, `NotEmpty`, `Size`, `Pattern`
//! - Numbers: `Min`, `Max`, `DecimalMin`, `DecimalMax` and the sign checks
//! - Time: `Past`, `PastOrPresent`, `Future`, `FutureOrPresent`
//! - Scripts: `ScriptAssert`, `ParameterScriptAssert`

mod basic;
mod numeric;
mod script;
mod temporal;

pub use basic::*;
pub use numeric::*;
pub use script::*;
pub use temporal::*;

use crate::constraint_validator::{ConstraintValidator, ValidatorDescriptor};
use crate::definition::ConstraintDefinition;
use constraints_core::{AttributeValue, TypeRef};

const BV_PREFIX: &str = "javax.validation.constraints";
const HV_PREFIX: &str = "org.hibernate.validator.constraints";

fn message_key(prefix: &str, kind: &str) -> String {
    format!("{{{}.{}.message}}", prefix, kind)
}

fn bv(kind: &str) -> ConstraintDefinition {
    ConstraintDefinition::new(kind, message_key(BV_PREFIX, kind))
}

fn validator<V>(kind: &str, validated_type: TypeRef) -> ValidatorDescriptor
where
    V: ConstraintValidator + Default + 'static,
{
    let id = format!("{}.{}", kind, validated_type);
    ValidatorDescriptor::new(id, validated_type, || Box::new(V::default()))
}

fn sized_types() -> [TypeRef; 4] {
    [
        TypeRef::Text,
        TypeRef::collection(TypeRef::Any),
        TypeRef::map(TypeRef::Any, TypeRef::Any),
        TypeRef::array(TypeRef::Any),
    ]
}

fn numeric_types() -> [TypeRef; 3] {
    [TypeRef::Number, TypeRef::Text, TypeRef::Money]
}

/// Definitions of all built-in constraints.
pub fn definitions() -> Vec<ConstraintDefinition> {
    let mut definitions = vec![
        bv("NotNull").validated_by(validator::<NotNullValidator>("NotNull", TypeRef::Any)),
        bv("Null").validated_by(validator::<NullValidator>("Null", TypeRef::Any)),
        bv("AssertTrue").validated_by(validator::<AssertTrueValidator>("AssertTrue", TypeRef::Boolean)),
        bv("AssertFalse").validated_by(validator::<AssertFalseValidator>("AssertFalse", TypeRef::Boolean)),
        bv("NotBlank").validated_by(validator::<NotBlankValidator>("NotBlank", TypeRef::Text)),
        bv("Pattern")
            .required("regexp")
            .attribute("flags", AttributeValue::List(Vec::new()))
            .validated_by(validator::<PatternValidator>("Pattern", TypeRef::Text)),
    ];

    let mut not_empty = bv("NotEmpty");
    let mut size = bv("Size").attribute("min", 0).attribute("max", i64::from(i32::MAX));
    for t in sized_types() {
        not_empty = not_empty.validated_by(validator::<NotEmptyValidator>("NotEmpty", t.clone()));
        size = size.validated_by(validator::<SizeValidator>("Size", t));
    }
    definitions.push(not_empty);
    definitions.push(size);

    let mut min = bv("Min").required("value");
    let mut max = bv("Max").required("value");
    let mut decimal_min = bv("DecimalMin").required("value").attribute("inclusive", true);
    let mut decimal_max = bv("DecimalMax").required("value").attribute("inclusive", true);
    for t in numeric_types() {
        min = min.validated_by(validator::<MinValidator>("Min", t.clone()));
        max = max.validated_by(validator::<MaxValidator>("Max", t.clone()));
        decimal_min = decimal_min.validated_by(validator::<DecimalMinValidator>("DecimalMin", t.clone()));
        decimal_max = decimal_max.validated_by(validator::<DecimalMaxValidator>("DecimalMax", t));
    }
    definitions.extend([min, max, decimal_min, decimal_max]);

    let mut positive = bv("Positive");
    let mut positive_or_zero = bv("PositiveOrZero");
    let mut negative = bv("Negative");
    let mut negative_or_zero = bv("NegativeOrZero");
    for t in [TypeRef::Number, TypeRef::Money] {
        positive = positive.validated_by(validator::<PositiveValidator>("Positive", t.clone()));
        positive_or_zero =
            positive_or_zero.validated_by(validator::<PositiveOrZeroValidator>("PositiveOrZero", t.clone()));
        negative = negative.validated_by(validator::<NegativeValidator>("Negative", t.clone()));
        negative_or_zero = negative_or_zero.validated_by(validator::<NegativeOrZeroValidator>("NegativeOrZero", t));
    }
    definitions.extend([positive, positive_or_zero, negative, negative_or_zero]);

    definitions.extend([
        bv("Past").validated_by(validator::<PastValidator>("Past", TypeRef::Temporal)),
        bv("PastOrPresent").validated_by(validator::<PastOrPresentValidator>("PastOrPresent", TypeRef::Temporal)),
        bv("Future").validated_by(validator::<FutureValidator>("Future", TypeRef::Temporal)),
        bv("FutureOrPresent")
            .validated_by(validator::<FutureOrPresentValidator>("FutureOrPresent", TypeRef::Temporal)),
    ]);

    definitions.push(
        ConstraintDefinition::new("ScriptAssert", message_key(HV_PREFIX, "ScriptAssert"))
            .required("lang")
            .required("script")
            .attribute("alias", "_this")
            .attribute("reportOn", "")
            .validated_by(validator::<ScriptAssertValidator>("ScriptAssert", TypeRef::Any)),
    );
    definitions.push(
        ConstraintDefinition::new("ParameterScriptAssert", message_key(HV_PREFIX, "ParametersScriptAssert"))
            .required("lang")
            .required("script")
            .validated_by(ValidatorDescriptor::cross_parameter("ParameterScriptAssert", || {
                Box::new(ParameterScriptAssertValidator::default())
            })),
    );

    definitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint_validator::ValidatorTarget;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalogue() {
        let definitions = definitions();
        let kinds: Vec<&str> = definitions.iter().map(|d| d.kind.as_str()).collect();
        assert_eq!(kinds.len(), 22);
        assert!(kinds.contains(&"DecimalMin"));
        assert!(kinds.contains(&"ParameterScriptAssert"));

        let size = definitions.iter().find(|d| d.kind == "Size").unwrap();
        assert_eq!(size.validators.len(), 4);
        assert_eq!(size.default_message, "{javax.validation.constraints.Size.message}");

        let script = definitions.iter().find(|d| d.kind == "ParameterScriptAssert").unwrap();
        assert!(script.has_validators_for(ValidatorTarget::CrossParameter));
        assert!(!script.has_validators_for(ValidatorTarget::Generic));
    }

    #[test]
    fn test_validator_ids_are_unique() {
        let mut ids: Vec<String> = definitions()
            .iter()
            .flat_map(|d| d.validators.iter().map(|v| v.id().to_string()))
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
