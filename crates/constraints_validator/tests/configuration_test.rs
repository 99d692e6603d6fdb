//! Tests for factory configuration.
//!
//! This suite checks the options a `ValidatorConfiguration` accepts:
//! - Locale resolution from language ranges for interpolated messages
//! - Mapping and settings files loaded from disk
//! - Custom constraints, validators and traversable resolvers
//! - Temporal constraints against a fixed clock
//! - Predefined-scope factories

use chrono::{TimeZone, Utc};
use constraints_core::{
    BeanRef, ClassBuilder, ClassRegistry, ConstraintAnnotation, DynamicBean, ElementType, FieldBuilder,
    LanguageRange, Locale, Node, Path, TypeRef, ValidationError, Value,
};
use constraints_validator::{
    ConstraintDefinition, ConstraintValidator, ConstraintValidatorContext, FixedClockProvider, TraversableResolver,
    ValidatorConfiguration, ValidatorDescriptor,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;

fn flag_registry() -> ClassRegistry {
    ClassRegistry::new().with_class(
        ClassBuilder::new("Switch")
            .field(
                FieldBuilder::new("enabled", TypeRef::Boolean)
                    .constraint(ConstraintAnnotation::new("AssertFalse"))
                    .build(),
            )
            .field(FieldBuilder::new("label", TypeRef::Text).build())
            .build(),
    )
}

fn message_for(configuration: ValidatorConfiguration, preferences: &str) -> String {
    let factory = configuration.build().expect("Failed to build factory");
    let validator = factory.validator_for(LanguageRange::parse(preferences).unwrap());
    let switch = DynamicBean::new("Switch").with("enabled", true).into_ref();
    let violations = validator.validate(&switch, &[]).unwrap();
    assert_eq!(violations.len(), 1);
    violations.messages()[0].to_string()
}

#[test]
fn test_message_locale_from_language_ranges() {
    let configured = || {
        ValidatorConfiguration::new(flag_registry())
            .with_locales([Locale::new("fr", "FR"), Locale::new("es", "ES")])
            .with_default_locale(Locale::english())
    };

    assert_eq!(message_for(configured(), "fr-FR,fr;q=0.9"), "doit avoir la valeur faux");
    assert_eq!(message_for(configured(), "hr-HR,hr;q=0.9,es;q=0.7"), "debe ser falso");
    // No match falls back to the default locale
    assert_eq!(message_for(configured(), "hr-HR,hr;q=0.9"), "must be false");

    let french_default = ValidatorConfiguration::new(flag_registry())
        .with_locales([Locale::new("es", "ES")])
        .with_default_locale(Locale::new("fr", "FR"));
    assert_eq!(message_for(french_default, "hr-HR,hr;q=0.9"), "doit avoir la valeur faux");
}

#[test]
fn test_mapping_file_adds_constraints() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        file,
        r#"
beans:
  - class: Switch
    fields:
      - name: label
        constraints:
          - annotation: Size
            elements:
              min: 2
              max: 10
"#
    )
    .unwrap();

    let validator = ValidatorConfiguration::new(flag_registry())
        .with_mapping_file(file.path())
        .unwrap()
        .build()
        .unwrap()
        .validator();

    let switch = DynamicBean::new("Switch").with("enabled", false).with("label", "x").into_ref();
    let violations = validator.validate(&switch, &[]).unwrap();
    assert_eq!(violations.paths(), vec!["label"]);
    assert_eq!(violations.messages(), vec!["size must be between 2 and 10"]);
}

#[test]
fn test_invalid_mapping_file_is_a_declaration_error() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(file, "beans: [[[").unwrap();

    let result = ValidatorConfiguration::new(flag_registry()).with_mapping_file(file.path());
    assert!(matches!(result, Err(ValidationError::ConstraintDeclaration(_))));

    let missing = ValidatorConfiguration::new(flag_registry()).with_mapping_file(std::path::Path::new("missing.yaml"));
    assert!(missing.is_err());
}

#[test]
fn test_settings_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
fail_fast = true
default_locale = "es-ES"
"#
    )
    .unwrap();

    let factory = ValidatorConfiguration::new(flag_registry())
        .with_settings_file(file.path())
        .unwrap()
        .build()
        .unwrap();
    assert!(factory.settings().fail_fast);
    assert_eq!(factory.settings().default_locale, Locale::new("es", "ES"));

    let switch = DynamicBean::new("Switch").with("enabled", true).into_ref();
    let violations = factory.validator().validate(&switch, &[]).unwrap();
    assert_eq!(violations.messages(), vec!["debe ser falso"]);
}

/// Reports a mismatch between `password` and `confirmation` on the latter.
struct PasswordsMatch;

impl ConstraintValidator for PasswordsMatch {
    fn is_valid(&self, value: &Value, context: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
        let Some(account) = value.as_bean() else {
            return Ok(true);
        };
        if account.property("password") == account.property("confirmation") {
            return Ok(true);
        }
        context.disable_default_constraint_violation();
        context
            .build_constraint_violation_with_template("passwords do not match")
            .add_property_node("confirmation")
            .add_constraint_violation();
        Ok(false)
    }
}

#[test]
fn test_custom_class_level_constraint() {
    let definition = ConstraintDefinition::new("PasswordsMatch", "{account.passwords}").validated_by(
        ValidatorDescriptor::new("PasswordsMatch.Any", TypeRef::Any, || Box::new(PasswordsMatch)),
    );
    let registry = ClassRegistry::new().with_class(
        ClassBuilder::new("Account")
            .constraint(ConstraintAnnotation::new("PasswordsMatch"))
            .build(),
    );
    let validator = ValidatorConfiguration::new(registry)
        .with_constraint_definition(definition)
        .build()
        .unwrap()
        .validator();

    let account = DynamicBean::new("Account")
        .with("password", "secret")
        .with("confirmation", "secert")
        .into_ref();
    let violations = validator.validate(&account, &[]).unwrap();
    assert_eq!(violations.paths(), vec!["confirmation"]);
    assert_eq!(violations.messages(), vec!["passwords do not match"]);
}

#[test]
fn test_unknown_constraint_is_a_declaration_error() {
    let registry = ClassRegistry::new().with_class(
        ClassBuilder::new("Account")
            .field(
                FieldBuilder::new("iban", TypeRef::Text)
                    .constraint(ConstraintAnnotation::new("Iban"))
                    .build(),
            )
            .build(),
    );
    let validator = ValidatorConfiguration::new(registry).build().unwrap().validator();
    let account = DynamicBean::new("Account").into_ref();
    assert!(matches!(
        validator.validate(&account, &[]),
        Err(ValidationError::ConstraintDeclaration(_))
    ));
}

/// Never lets the engine read `secret`.
struct HideSecrets;

impl TraversableResolver for HideSecrets {
    fn is_reachable(&self, _: Option<&BeanRef>, property: &Node, _: &str, _: &Path, _: ElementType) -> anyhow::Result<bool> {
        Ok(property.name() != Some("secret"))
    }

    fn is_cascadable(&self, _: Option<&BeanRef>, _: &Node, _: &str, _: &Path, _: ElementType) -> anyhow::Result<bool> {
        Ok(true)
    }
}

#[test]
fn test_traversable_resolver_hides_properties() {
    let registry = ClassRegistry::new().with_class(
        ClassBuilder::new("Vault")
            .field(
                FieldBuilder::new("secret", TypeRef::Text)
                    .constraint(ConstraintAnnotation::new("NotNull"))
                    .build(),
            )
            .field(
                FieldBuilder::new("owner", TypeRef::Text)
                    .constraint(ConstraintAnnotation::new("NotNull"))
                    .build(),
            )
            .build(),
    );
    let validator = ValidatorConfiguration::new(registry)
        .with_traversable_resolver(Arc::new(HideSecrets))
        .build()
        .unwrap()
        .validator();

    let vault = DynamicBean::new("Vault").into_ref();
    assert_eq!(validator.validate(&vault, &[]).unwrap().paths(), vec!["owner"]);
}

#[test]
fn test_temporal_constraints_use_clock_provider() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let registry = ClassRegistry::new().with_class(
        ClassBuilder::new("Booking")
            .field(
                FieldBuilder::new("start", TypeRef::Temporal)
                    .constraint(ConstraintAnnotation::new("Future"))
                    .build(),
            )
            .build(),
    );
    let validator = ValidatorConfiguration::new(registry)
        .with_clock_provider(Arc::new(FixedClockProvider(now)))
        .build()
        .unwrap()
        .validator();

    let past = DynamicBean::new("Booking").with("start", now - chrono::Duration::days(1)).into_ref();
    assert_eq!(validator.validate(&past, &[]).unwrap().paths(), vec!["start"]);

    let future = DynamicBean::new("Booking").with("start", now + chrono::Duration::days(1)).into_ref();
    assert!(validator.validate(&future, &[]).unwrap().is_empty());
}

#[test]
fn test_predefined_scope_rejects_other_classes() {
    let registry = flag_registry().with_class(ClassBuilder::new("Lamp").build());
    let factory = ValidatorConfiguration::new(registry)
        .with_bean_classes_to_initialize(["Switch"])
        .build_predefined_scope()
        .unwrap();
    let validator = factory.validator();

    let switch = DynamicBean::new("Switch").with("enabled", true).into_ref();
    assert_eq!(validator.validate(&switch, &[]).unwrap().len(), 1);

    let lamp = DynamicBean::new("Lamp").into_ref();
    assert!(matches!(
        validator.validate(&lamp, &[]),
        Err(ValidationError::Precondition(_))
    ));
}
