//! Validator resolution.
//!
//! For a constraint kind and the declared type of the constrained element,
//! the resolver keeps the validators whose validated type the declared type
//! is assignable to and picks the unique most specific one. Results are
//! cached per (kind, declared type, target).

use crate::constraint_validator::{ValidatorDescriptor, ValidatorTarget};
use crate::definition::ConstraintDefinitions;
use constraints_core::{ClassRegistry, Result, TypeRef, ValidationError};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

type CacheKey = (String, TypeRef, ValidatorTarget);

/// Resolves constraint validators by declared type.
#[derive(Debug)]
pub struct ValidatorResolver {
    definitions: Arc<ConstraintDefinitions>,
    registry: Arc<ClassRegistry>,
    cache: DashMap<CacheKey, Option<ValidatorDescriptor>>,
}

impl ValidatorResolver {
    /// Creates a resolver over `definitions`, answering bean subtyping
    /// questions with `registry`.
    pub fn new(definitions: Arc<ConstraintDefinitions>, registry: Arc<ClassRegistry>) -> Self {
        Self {
            definitions,
            registry,
            cache: DashMap::new(),
        }
    }

    /// The constraint definitions in use.
    pub fn definitions(&self) -> &ConstraintDefinitions {
        &self.definitions
    }

    /// The class registry in use.
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Finds the validator for `kind` on elements declared as `declared`.
    ///
    /// Returns `Ok(None)` if no validator accepts the type and a declaration
    /// error if several equally specific validators do.
    pub fn resolve(
        &self,
        kind: &str,
        declared: &TypeRef,
        target: ValidatorTarget,
    ) -> Result<Option<ValidatorDescriptor>> {
        let key = (kind.to_string(), declared.clone(), target);
        if let Some(cached) = self.cache.get(&key) {
            trace!(constraint = kind, declared_type = %declared, "Validator resolution cache hit");
            return Ok(cached.clone());
        }

        let definition = self.definitions.get(kind)?;
        let hierarchy = self.registry.as_ref();
        let candidates: Vec<&ValidatorDescriptor> = definition
            .validators_for(target)
            .filter(|v| declared.is_assignable_to(v.validated_type(), hierarchy))
            .collect();

        let maximal: Vec<&ValidatorDescriptor> = candidates
            .iter()
            .filter(|v| {
                !candidates
                    .iter()
                    .any(|other| other.validated_type().is_strictly_narrower_than(v.validated_type(), hierarchy))
            })
            .copied()
            .collect();

        let resolved = match maximal.as_slice() {
            [] => None,
            [single] => Some((*single).clone()),
            several => {
                let ids: Vec<&str> = several.iter().map(|v| v.id()).collect();
                return Err(ValidationError::declaration(format!(
                    "Ambiguous validators for constraint '{}' on type '{}': {}",
                    kind,
                    declared,
                    ids.join(", ")
                )));
            }
        };
        trace!(
            constraint = kind,
            declared_type = %declared,
            validator = resolved.as_ref().map(ValidatorDescriptor::id),
            "Resolved validator"
        );
        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::NotNullValidator;
    use crate::definition::ConstraintDefinition;
    use pretty_assertions::assert_eq;

    fn resolver(definitions: ConstraintDefinitions) -> ValidatorResolver {
        ValidatorResolver::new(Arc::new(definitions), Arc::new(ClassRegistry::new()))
    }

    #[test]
    fn test_most_specific_validator_wins() {
        let resolver = resolver(ConstraintDefinitions::with_builtins());
        let list = resolver
            .resolve("Size", &TypeRef::list(TypeRef::Text), ValidatorTarget::Generic)
            .unwrap()
            .unwrap();
        assert_eq!(list.id(), "Size.Collection<Any>");

        let money = resolver
            .resolve("DecimalMin", &TypeRef::Money, ValidatorTarget::Generic)
            .unwrap()
            .unwrap();
        assert_eq!(money.id(), "DecimalMin.Money");

        // cached
        assert!(resolver.resolve("DecimalMin", &TypeRef::Money, ValidatorTarget::Generic).is_ok());
    }

    #[test]
    fn test_no_validator() {
        let resolver = resolver(ConstraintDefinitions::with_builtins());
        let none = resolver
            .resolve("Size", &TypeRef::Integer, ValidatorTarget::Generic)
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_ambiguous_validators() {
        let mut definitions = ConstraintDefinitions::with_builtins();
        definitions.register(
            ConstraintDefinition::new("Twice", "{twice}")
                .validated_by(ValidatorDescriptor::new("a", TypeRef::Text, || Box::new(NotNullValidator)))
                .validated_by(ValidatorDescriptor::new("b", TypeRef::Text, || Box::new(NotNullValidator))),
        );
        let resolver = resolver(definitions);
        let result = resolver.resolve("Twice", &TypeRef::Text, ValidatorTarget::Generic);
        assert!(matches!(result, Err(ValidationError::ConstraintDeclaration(_))));
    }
}
