//! Serializable factory settings.
//!
//! These are the scalar options of a validator factory. They can be written
//! by hand or loaded from TOML/YAML by the mapping crate and then applied to
//! a validator configuration.

use crate::locale::Locale;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Scalar options of a validator factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorySettings {
    /// Stop at the first violation
    pub fail_fast: bool,

    /// Allow overriding methods to alter parameter constraints
    pub allow_overriding_method_alter_parameter_constraint: bool,

    /// Allow more than one cascaded return value in a hierarchy line
    pub allow_multiple_cascaded_validation_on_return_values: bool,

    /// Allow parallel methods to define parameter constraints
    pub allow_parallel_methods_define_parameter_constraints: bool,

    /// Memoise traversable resolver answers within a call
    pub traversable_resolver_result_cache_enabled: bool,

    /// Locales whose message bundles are loaded up front
    pub locales: Vec<Locale>,

    /// Locale used when no preference matches
    pub default_locale: Locale,

    /// Slack for temporal constraints, in nanoseconds
    pub temporal_validation_tolerance_nanos: u64,

    /// Classes whose metadata is built eagerly in predefined scope
    pub bean_classes_to_initialize: Vec<String>,

    /// Directory holding user message bundles (`ValidationMessages*.properties`)
    pub message_bundle_dir: Option<PathBuf>,
}

impl Default for FactorySettings {
    fn default() -> Self {
        Self {
            fail_fast: false,
            allow_overriding_method_alter_parameter_constraint: false,
            allow_multiple_cascaded_validation_on_return_values: false,
            allow_parallel_methods_define_parameter_constraints: false,
            traversable_resolver_result_cache_enabled: true,
            locales: Vec::new(),
            default_locale: Locale::english(),
            temporal_validation_tolerance_nanos: 0,
            bean_classes_to_initialize: Vec::new(),
            message_bundle_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = FactorySettings::default();
        assert!(settings.traversable_resolver_result_cache_enabled);
        assert!(!settings.fail_fast);
        assert_eq!(settings.default_locale, Locale::english());
    }
}
