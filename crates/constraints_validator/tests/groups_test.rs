//! Tests for groups, group sequences and group conversion.
//!
//! This suite checks how the requested groups select constraints:
//! - Constraints outside the requested groups are skipped
//! - Group inheritance pulls in parent groups
//! - Sequences stop after the first failing step
//! - A redefined default group sequence short-circuits `Default`
//! - Group conversion on cascaded properties

use constraints_core::{
    ClassBuilder, ClassRegistry, ConstraintAnnotation, DynamicBean, FieldBuilder, Group, GroupDefinition, TypeRef,
    groups,
};
use constraints_validator::{Validator, ValidatorConfiguration};
use pretty_assertions::assert_eq;

fn validator(registry: ClassRegistry) -> Validator {
    ValidatorConfiguration::new(registry)
        .build()
        .expect("Failed to build factory")
        .validator()
}

fn not_null(field: &str) -> constraints_core::FieldDecl {
    FieldBuilder::new(field, TypeRef::Text)
        .constraint(ConstraintAnnotation::new("NotNull"))
        .build()
}

/// `reference` in `Default`, `total >= 100` in `Expensive`.
fn invoice(default_sequence: bool) -> ClassBuilder {
    let class = ClassBuilder::new("Invoice").field(not_null("reference")).field(
        FieldBuilder::new("total", TypeRef::Integer)
            .constraint(ConstraintAnnotation::new("Min").attr("value", 100).groups(["Expensive"]))
            .build(),
    );
    if default_sequence {
        class.default_group_sequence(["Invoice", "Expensive"])
    } else {
        class
    }
}

#[test]
fn test_constraints_outside_requested_groups_are_skipped() {
    let validator = validator(ClassRegistry::new().with_class(invoice(false).build()));
    let bean = DynamicBean::new("Invoice").with("total", 5).into_ref();

    assert_eq!(validator.validate(&bean, &[]).unwrap().paths(), vec!["reference"]);
    assert_eq!(
        validator.validate(&bean, &[Group::new("Expensive")]).unwrap().paths(),
        vec!["total"]
    );

    // Both groups together
    let violations = validator
        .validate(&bean, &groups(["Default", "Expensive"]))
        .unwrap();
    assert_eq!(violations.len(), 2);
}

#[test]
fn test_group_inheritance() {
    let registry = ClassRegistry::new()
        .with_class(invoice(false).build())
        .with_group(GroupDefinition::group("Audit", groups(["Default", "Expensive"])));
    let validator = validator(registry);
    let bean = DynamicBean::new("Invoice").with("total", 5).into_ref();

    let mut paths = validator.validate(&bean, &[Group::new("Audit")]).unwrap().paths();
    paths.sort();
    assert_eq!(paths, vec!["reference", "total"]);
}

#[test]
fn test_sequence_stops_after_failing_step() {
    let registry = ClassRegistry::new()
        .with_class(invoice(false).build())
        .with_group(GroupDefinition::sequence("Checkout", groups(["Default", "Expensive"])));
    let validator = validator(registry);
    let checkout = [Group::new("Checkout")];

    // First step fails: Expensive is not evaluated
    let bean = DynamicBean::new("Invoice").with("total", 5).into_ref();
    assert_eq!(validator.validate(&bean, &checkout).unwrap().paths(), vec!["reference"]);

    // First step passes: Expensive runs
    let bean = DynamicBean::new("Invoice").with("reference", "I-1").with("total", 5).into_ref();
    assert_eq!(validator.validate(&bean, &checkout).unwrap().paths(), vec!["total"]);
}

#[test]
fn test_redefined_default_sequence_short_circuits() {
    let validator = validator(ClassRegistry::new().with_class(invoice(true).build()));

    let failing_default = DynamicBean::new("Invoice").with("total", 5).into_ref();
    let violations = validator.validate(&failing_default, &[]).unwrap();
    assert_eq!(violations.paths(), vec!["reference"], "Expensive must not run after a failing Default step");

    let passing_default = DynamicBean::new("Invoice").with("reference", "I-1").with("total", 5).into_ref();
    let violations = validator.validate(&passing_default, &[]).unwrap();
    assert_eq!(violations.paths(), vec!["total"]);

    let valid = DynamicBean::new("Invoice").with("reference", "I-1").with("total", 500).into_ref();
    assert!(validator.validate(&valid, &[]).unwrap().is_empty());
}

#[test]
fn test_invalid_default_sequence_is_rejected() {
    // The class itself must be part of its default group sequence
    let registry = ClassRegistry::new().with_class(
        ClassBuilder::new("Invoice")
            .field(not_null("reference"))
            .default_group_sequence(["Expensive"])
            .build(),
    );
    let bean = DynamicBean::new("Invoice").into_ref();
    let result = validator(registry).validate(&bean, &[]);
    assert!(
        matches!(result, Err(constraints_core::ValidationError::GroupDefinition(_))),
        "Expected a group definition error, got {:?}",
        result.map(|v| v.paths())
    );
}

#[test]
fn test_group_conversion_on_cascade() {
    let registry = ClassRegistry::new()
        .with_class(
            ClassBuilder::new("Customer")
                .field(
                    FieldBuilder::new("email", TypeRef::Text)
                        .constraint(ConstraintAnnotation::new("NotNull").groups(["Billing"]))
                        .build(),
                )
                .build(),
        )
        .with_class(
            ClassBuilder::new("Invoice")
                .field(
                    FieldBuilder::new("customer", TypeRef::bean("Customer"))
                        .valid()
                        .convert_group("Default", "Billing")
                        .build(),
                )
                .build(),
        );
    let validator = validator(registry);

    let customer = DynamicBean::new("Customer").into_ref();
    let invoice = DynamicBean::new("Invoice").with("customer", customer.clone()).into_ref();

    assert_eq!(validator.validate(&invoice, &[]).unwrap().paths(), vec!["customer.email"]);
    // Validated directly, the customer is only checked in Default
    assert!(validator.validate(&customer, &[]).unwrap().is_empty());
}

#[test]
fn test_nested_sequence_is_rejected() {
    let registry = ClassRegistry::new()
        .with_class(invoice(false).build())
        .with_group(GroupDefinition::sequence("Inner", groups(["Default"])))
        .with_group(GroupDefinition::sequence("Outer", groups(["Inner", "Expensive"])));
    let bean = DynamicBean::new("Invoice").into_ref();
    let result = validator(registry).validate(&bean, &[Group::new("Outer")]);
    assert!(matches!(result, Err(constraints_core::ValidationError::GroupDefinition(_))));
}
