//! Tests for loading mapping documents and settings from files.
//!
//! Every supported format is written to a temporary file and loaded through
//! `parse_file` or `load_settings`, which pick the parser from the
//! extension.

use constraints_core::{AttributeValue, Locale};
use constraints_mapping::{MappingError, load_settings, parse_file};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes()).expect("Failed to write temp file");
    file
}

#[test]
fn test_load_yaml_mapping() {
    let file = temp_file(
        ".yml",
        r#"
beans:
  - class: Order
    fields:
      - name: amount
        constraints:
          - annotation: DecimalMin
            elements:
              value: "0"
"#,
    );

    let document = parse_file(file.path()).expect("Failed to load YAML mapping");
    assert_eq!(document.mapped_classes(), vec!["Order"]);
    let min = &document.beans[0].fields[0].element.constraints[0];
    assert_eq!(min.attributes["value"], AttributeValue::Text("0".to_string()));
}

#[test]
fn test_load_toml_mapping() {
    let file = temp_file(
        ".toml",
        r#"
[[beans]]
class = "Customer"

[[beans.fields]]
name = "email"
valid = false

[[beans.fields.constraints]]
annotation = "NotNull"
"#,
    );

    let document = parse_file(file.path()).expect("Failed to load TOML mapping");
    assert_eq!(document.mapped_classes(), vec!["Customer"]);
    assert_eq!(document.beans[0].fields[0].element.constraints[0].kind, "NotNull");
}

#[test]
fn test_load_json_mapping() {
    let file = temp_file(
        ".json",
        r#"{"constraint_definitions": [{"annotation": "NotBlank", "validators": ["trimmed"]}]}"#,
    );

    let document = parse_file(file.path()).expect("Failed to load JSON mapping");
    assert!(document.beans.is_empty());
    // Existing validators are kept unless stated otherwise
    assert!(document.constraint_definitions[0].include_existing_validators);
}

#[test]
fn test_load_errors() {
    let unsupported = temp_file(".xml", "<constraint-mappings/>");
    assert!(matches!(
        parse_file(unsupported.path()),
        Err(MappingError::UnsupportedFormat(_))
    ));

    let broken = temp_file(".json", "{\"beans\": [");
    assert!(matches!(parse_file(broken.path()), Err(MappingError::JsonError(_))));

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.yaml");
    assert!(matches!(parse_file(&missing), Err(MappingError::IoError(_))));
}

#[test]
fn test_load_settings_file() {
    let file = temp_file(
        ".yaml",
        r#"
fail_fast: true
locales: [fr-FR, es-ES]
bean_classes_to_initialize: [Order]
"#,
    );

    let settings = load_settings(file.path()).expect("Failed to load settings");
    assert!(settings.fail_fast);
    assert_eq!(settings.locales, vec![Locale::new("fr", "FR"), Locale::new("es", "ES")]);
    assert_eq!(settings.bean_classes_to_initialize, vec!["Order".to_string()]);
    // Unset options keep their defaults
    assert_eq!(settings.default_locale, Locale::english());
}
