//! Bean metadata managers.
//!
//! The open-scope manager builds metadata lazily on first request and
//! caches it; the predefined-scope manager builds a fixed set of classes up
//! front and refuses everything else.

use crate::metadata::{BeanMetadata, BeanMetadataBuilder};
use constraints_core::{Result, ValidationError};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Hands out the metadata of bean classes.
pub trait BeanMetadataManager: Send + Sync {
    /// Metadata of `class`.
    fn bean_metadata(&self, class: &str) -> Result<Arc<BeanMetadata>>;
}

/// Builds metadata on demand and caches it per class.
pub struct OpenBeanMetadataManager {
    builder: BeanMetadataBuilder,
    cache: DashMap<String, Arc<BeanMetadata>>,
}

impl OpenBeanMetadataManager {
    /// Creates a manager with an empty cache.
    pub fn new(builder: BeanMetadataBuilder) -> Self {
        Self {
            builder,
            cache: DashMap::new(),
        }
    }

    /// Number of cached classes.
    pub fn cached_classes(&self) -> usize {
        self.cache.len()
    }
}

impl BeanMetadataManager for OpenBeanMetadataManager {
    fn bean_metadata(&self, class: &str) -> Result<Arc<BeanMetadata>> {
        if let Some(cached) = self.cache.get(class) {
            trace!(class, "Bean metadata cache hit");
            return Ok(cached.clone());
        }
        // Built outside the entry lock; a concurrent build of the same class
        // yields an equal value and the first insert wins.
        let built = Arc::new(self.builder.build(class)?);
        Ok(self.cache.entry(class.to_string()).or_insert(built).clone())
    }
}

/// Serves metadata of classes declared up front.
#[derive(Debug)]
pub struct PredefinedScopeBeanMetadataManager {
    metadata: HashMap<String, Arc<BeanMetadata>>,
}

impl PredefinedScopeBeanMetadataManager {
    /// Builds metadata for `classes` and their supertypes.
    pub fn new<I, S>(builder: &BeanMetadataBuilder, classes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut metadata = HashMap::new();
        for class in classes {
            let class = class.as_ref();
            let mut names: Vec<String> = builder
                .registry()
                .hierarchy(class)
                .into_iter()
                .map(|c| c.name.clone())
                .collect();
            if names.is_empty() {
                names.push(class.to_string());
            }
            for name in names {
                if metadata.contains_key(&name) {
                    continue;
                }
                let built = builder.build(&name)?;
                metadata.insert(name, Arc::new(built));
            }
        }
        debug!(classes = metadata.len(), "Initialized predefined bean metadata");
        Ok(Self { metadata })
    }

    /// Classes with metadata.
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.metadata.keys().map(String::as_str).collect();
        classes.sort_unstable();
        classes
    }
}

impl BeanMetadataManager for PredefinedScopeBeanMetadataManager {
    fn bean_metadata(&self, class: &str) -> Result<Arc<BeanMetadata>> {
        self.metadata.get(class).cloned().ok_or_else(|| {
            ValidationError::precondition(format!(
                "Class '{}' is not among the classes initialized by this predefined-scope factory",
                class
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ConstraintDefinitions;
    use crate::metadata::{
        AnnotationProcessingOptions, DeclaredMetadataProvider, MetaConstraintBuilder, MethodValidationConfiguration,
    };
    use crate::plugins::{DefaultGetterPropertySelectionStrategy, DefaultParameterNameProvider};
    use crate::resolver::ValidatorResolver;
    use constraints_core::{ClassBuilder, ClassRegistry};
    use pretty_assertions::assert_eq;

    fn builder() -> BeanMetadataBuilder {
        let registry = Arc::new(
            ClassRegistry::new()
                .with_class(ClassBuilder::new("Vehicle").build())
                .with_class(ClassBuilder::new("Car").extends("Vehicle").build()),
        );
        let resolver = ValidatorResolver::new(Arc::new(ConstraintDefinitions::with_builtins()), registry.clone());
        let declared = DeclaredMetadataProvider::new(
            registry.clone(),
            MetaConstraintBuilder::new(Arc::new(resolver)),
            Arc::new(DefaultGetterPropertySelectionStrategy),
            AnnotationProcessingOptions::default(),
        );
        BeanMetadataBuilder::new(
            registry,
            vec![Arc::new(declared)],
            Arc::new(DefaultParameterNameProvider),
            MethodValidationConfiguration::default(),
        )
    }

    #[test]
    fn test_open_manager_caches() {
        let manager = OpenBeanMetadataManager::new(builder());
        let first = manager.bean_metadata("Car").unwrap();
        let second = manager.bean_metadata("Car").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.cached_classes(), 1);
    }

    #[test]
    fn test_predefined_manager_rejects_unknown_classes() {
        let manager = PredefinedScopeBeanMetadataManager::new(&builder(), ["Car"]).unwrap();
        assert_eq!(manager.classes(), vec!["Car", "Vehicle"]);
        assert!(manager.bean_metadata("Vehicle").is_ok());
        assert!(matches!(
            manager.bean_metadata("Truck"),
            Err(ValidationError::Precondition(_))
        ));
    }
}
