//! Helpers shared by unit tests.

use crate::constraint_validator::ConstraintValidator;
use crate::context::{ConstraintValidatorContext, Services};
use crate::definition::ConstraintDefinitions;
use crate::plugins::{ClockProvider, FixedClockProvider};
use crate::script::DefaultScriptEvaluatorFactory;
use chrono::{DateTime, TimeZone, Utc};
use constraints_core::{ConstraintAnnotation, ConstraintDescriptor, ConstraintLocationKind, Value};

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub(crate) fn descriptor(annotation: &ConstraintAnnotation) -> ConstraintDescriptor {
    ConstraintDefinitions::with_builtins()
        .build_descriptor(annotation, ConstraintLocationKind::Field, "Test")
        .unwrap()
        .as_ref()
        .clone()
}

pub(crate) fn run_with(
    validator: &dyn ConstraintValidator,
    descriptor: &ConstraintDescriptor,
    value: &Value,
    clock: &dyn ClockProvider,
    tolerance: chrono::Duration,
    parameter_names: Option<&[String]>,
) -> bool {
    let scripts = DefaultScriptEvaluatorFactory::default();
    let services = Services {
        clock,
        tolerance,
        payload: None,
        scripts: &scripts,
        parameter_names,
    };
    let mut context = ConstraintValidatorContext::new(descriptor, services);
    validator.is_valid(value, &mut context).unwrap()
}

pub(crate) fn run(validator: &dyn ConstraintValidator, descriptor: &ConstraintDescriptor, value: &Value) -> bool {
    run_with(
        validator,
        descriptor,
        value,
        &FixedClockProvider(now()),
        chrono::Duration::zero(),
        None,
    )
}

/// Initialises `validator` for a constraint of `kind` with default
/// attributes and checks `value`.
pub(crate) fn check(validator: &mut dyn ConstraintValidator, kind: &str, value: &Value) -> bool {
    let d = descriptor(&ConstraintAnnotation::new(kind));
    validator.initialize(&d).unwrap();
    run(validator, &d, value)
}
