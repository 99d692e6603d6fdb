//! Error types for mapping parsing.

use thiserror::Error;

/// Errors that can occur while loading mapping documents or settings.
#[derive(Debug, Error)]
pub enum MappingError {
    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// TOML parsing or deserialization failed
    #[error("Failed to parse TOML: {0}")]
    TomlError(String),

    /// JSON parsing or deserialization failed
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,

    /// A type expression in a programmatic mapping could not be parsed
    #[error(transparent)]
    InvalidType(#[from] constraints_core::TypeParseError),
}

/// Result type alias for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;
