//! Parser for constraint mapping documents (YAML/TOML/JSON formats).
//!
//! This crate provides the external mapping documents and the programmatic
//! [`ConstraintMapping`] builder, both of which add constraints to classes
//! without touching their declarations, plus loaders for factory settings.
//!
//! # Example
//!
//! ```rust
//! use constraints_mapping::parse_yaml;
//!
//! let yaml = r#"
//! beans:
//!   - class: Order
//!     fields:
//!       - name: amount
//!         constraints:
//!           - annotation: DecimalMin
//!             elements:
//!               value: "0"
//!               inclusive: true
//! "#;
//!
//! let document = parse_yaml(yaml).expect("Failed to parse mapping");
//! assert_eq!(document.mapped_classes(), vec!["Order"]);
//! ```

mod document;
mod error;
mod mapping;

pub use document::*;
pub use error::*;
pub use mapping::*;

use constraints_core::FactorySettings;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// Supported mapping file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFormat {
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
    /// JSON format (.json)
    Json,
}

fn from_yaml<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(serde_yaml_ng::from_str(content)?)
}

fn from_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| MappingError::TomlError(e.to_string()))
}

fn from_json<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(serde_json::from_str(content)?)
}

fn from_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    let format = detect_format(path)?;
    debug!(path = %path.display(), ?format, "Loading mapping file");

    match format {
        MappingFormat::Yaml => from_yaml(&content),
        MappingFormat::Toml => from_toml(&content),
        MappingFormat::Json => from_json(&content),
    }
}

/// Parse a mapping document from a YAML string.
///
/// # Arguments
///
/// * `content` - The YAML string to parse
pub fn parse_yaml(content: &str) -> Result<MappingDocument> {
    from_yaml(content)
}

/// Parse a mapping document from a TOML string.
///
/// # Example
///
/// ```rust
/// use constraints_mapping::parse_toml;
///
/// let toml = r#"
/// [[beans]]
/// class = "Customer"
///
/// [[beans.fields]]
/// name = "name"
/// constraints = [{ annotation = "NotBlank" }]
/// "#;
///
/// let document = parse_toml(toml).unwrap();
/// assert_eq!(document.beans[0].fields[0].element.constraints[0].kind, "NotBlank");
/// ```
pub fn parse_toml(content: &str) -> Result<MappingDocument> {
    from_toml(content)
}

/// Parse a mapping document from a JSON string.
pub fn parse_json(content: &str) -> Result<MappingDocument> {
    from_json(content)
}

/// Detect the file format from a path based on its extension.
///
/// # Supported Extensions
///
/// * `.yaml`, `.yml` → `MappingFormat::Yaml`
/// * `.toml` → `MappingFormat::Toml`
/// * `.json` → `MappingFormat::Json`
///
/// # Errors
///
/// Returns `MappingError::InvalidExtension` if the file has no extension.
/// Returns `MappingError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<MappingFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(MappingError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(MappingFormat::Yaml),
        "toml" => Ok(MappingFormat::Toml),
        "json" => Ok(MappingFormat::Json),
        other => Err(MappingError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse a mapping document from a file with automatic format detection.
pub fn parse_file(path: &Path) -> Result<MappingDocument> {
    from_file(path)
}

/// Parse factory settings from a YAML string.
pub fn parse_settings_yaml(content: &str) -> Result<FactorySettings> {
    from_yaml(content)
}

/// Parse factory settings from a TOML string.
///
/// # Example
///
/// ```rust
/// use constraints_mapping::parse_settings_toml;
///
/// let settings = parse_settings_toml(r#"
/// fail_fast = true
/// locales = ["fr-FR", "es-ES"]
/// default_locale = "en"
/// "#).unwrap();
/// assert!(settings.fail_fast);
/// assert_eq!(settings.locales.len(), 2);
/// ```
pub fn parse_settings_toml(content: &str) -> Result<FactorySettings> {
    from_toml(content)
}

/// Load factory settings from a file with automatic format detection.
pub fn load_settings(path: &Path) -> Result<FactorySettings> {
    from_file(path)
}
