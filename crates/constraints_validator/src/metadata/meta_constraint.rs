//! Meta-constraints: a constraint bound to where it applies.

use crate::constraint_validator::ValidatorTarget;
use crate::metadata::{CascadingMetadata, ContainerCascading};
use crate::resolver::ValidatorResolver;
use crate::tree::ConstraintTree;
use constraints_core::{
    ConstraintAnnotation, ConstraintDescriptor, ConstraintLocation, ContainerKind, ElementDecl, Result, TypeRef,
    ValidationError,
};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// A constraint descriptor together with its location, the chain of value
/// extraction steps leading from the annotated element to the validated
/// value, and the declared type of that value.
///
/// The constraint tree is resolved on first use.
pub struct MetaConstraint {
    descriptor: Arc<ConstraintDescriptor>,
    location: ConstraintLocation,
    extraction_path: Vec<(ContainerKind, usize)>,
    validated_type: TypeRef,
    tree: OnceCell<ConstraintTree>,
}

impl MetaConstraint {
    /// The constraint.
    pub fn descriptor(&self) -> &Arc<ConstraintDescriptor> {
        &self.descriptor
    }

    /// Where the constraint is declared.
    pub fn location(&self) -> &ConstraintLocation {
        &self.location
    }

    /// Class declaring the constraint.
    pub fn declaring_class(&self) -> &str {
        &self.location.declaring_class
    }

    /// Value extraction steps, outermost first.
    pub fn extraction_path(&self) -> &[(ContainerKind, usize)] {
        &self.extraction_path
    }

    /// Declared type of the validated value.
    pub fn validated_type(&self) -> &TypeRef {
        &self.validated_type
    }

    /// Returns true if both describe the same constraint at the same place.
    pub fn same_constraint(&self, other: &MetaConstraint) -> bool {
        self.location == other.location && self.descriptor == other.descriptor
    }

    pub(crate) fn tree(&self, resolver: &ValidatorResolver) -> Result<&ConstraintTree> {
        self.tree.get_or_try_init(|| {
            ConstraintTree::build(&self.descriptor, &self.validated_type, &self.location, resolver)
        })
    }
}

impl fmt::Debug for MetaConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaConstraint")
            .field("descriptor", &self.descriptor.to_string())
            .field("location", &self.location.to_string())
            .field("extraction_path", &self.extraction_path)
            .field("validated_type", &self.validated_type)
            .finish()
    }
}

/// Creates meta-constraints from declared constraints.
#[derive(Debug, Clone)]
pub struct MetaConstraintBuilder {
    resolver: Arc<ValidatorResolver>,
}

impl MetaConstraintBuilder {
    /// Creates a builder resolving validators through `resolver`.
    pub fn new(resolver: Arc<ValidatorResolver>) -> Self {
        Self { resolver }
    }

    /// Binds `annotation` to `location`.
    ///
    /// A constraint on an optional element that has no validator for the
    /// optional itself but one for its content validates the content.
    pub fn create(&self, annotation: &ConstraintAnnotation, location: ConstraintLocation) -> Result<Arc<MetaConstraint>> {
        let descriptor =
            self.resolver
                .definitions()
                .build_descriptor(annotation, location.kind(), &location.declaring_class)?;

        let mut extraction_path = location.type_argument_path.clone();
        let mut validated_type = location.declared_type.clone();
        if !descriptor.is_cross_parameter()
            && validated_type.container_kind() == Some(ContainerKind::Optional)
            && self
                .resolver
                .resolve(&descriptor.kind, &validated_type, ValidatorTarget::Generic)?
                .is_none()
        {
            if let Some(inner) = validated_type.type_argument(0) {
                if self
                    .resolver
                    .resolve(&descriptor.kind, &inner, ValidatorTarget::Generic)?
                    .is_some()
                {
                    extraction_path.push((ContainerKind::Optional, 0));
                    validated_type = inner;
                }
            }
        }

        Ok(Arc::new(MetaConstraint {
            descriptor,
            location,
            extraction_path,
            validated_type,
            tree: OnceCell::new(),
        }))
    }

    /// Creates the meta-constraints and cascading of an element and of its
    /// type arguments.
    pub fn for_element(
        &self,
        element: &ElementDecl,
        location: &ConstraintLocation,
    ) -> Result<(Vec<Arc<MetaConstraint>>, CascadingMetadata)> {
        self.check_group_conversions(element, location)?;

        let mut constraints = element
            .constraints
            .iter()
            .map(|annotation| self.create(annotation, location.clone()))
            .collect::<Result<Vec<_>>>()?;

        let mut cascading = CascadingMetadata {
            cascade: element.cascade,
            group_conversions: element.group_conversions.clone(),
            container_elements: Vec::new(),
        };

        for container_element in &element.container_elements {
            let index = container_element.type_argument_index;
            let argument = location.type_argument(index).ok_or_else(|| {
                ValidationError::declaration(format!(
                    "Type '{}' of {} has no type argument {}",
                    location.declared_type, location, index
                ))
            })?;
            let (nested, nested_cascading) = self.for_element(&container_element.element, &argument)?;
            constraints.extend(nested);
            if nested_cascading.is_cascading() || nested_cascading.has_group_conversions() {
                let container = location
                    .declared_type
                    .container_kind()
                    .ok_or_else(|| ValidationError::declaration(format!("{} is not a container", location)))?;
                cascading.container_elements.push(ContainerCascading {
                    container,
                    type_argument_index: index,
                    element_type: argument.declared_type.clone(),
                    cascading: nested_cascading,
                });
            }
        }
        Ok((constraints, cascading))
    }

    fn check_group_conversions(&self, element: &ElementDecl, location: &ConstraintLocation) -> Result<()> {
        if element.group_conversions.is_empty() {
            return Ok(());
        }
        if !element.cascade {
            return Err(ValidationError::declaration(format!(
                "Group conversions declared on {} require it to be cascaded",
                location
            )));
        }
        let registry = self.resolver.registry();
        for (i, conversion) in element.group_conversions.iter().enumerate() {
            if registry.is_sequence(&conversion.from) {
                return Err(ValidationError::declaration(format!(
                    "Group sequence '{}' cannot be the source of a group conversion on {}",
                    conversion.from, location
                )));
            }
            if element.group_conversions[..i].iter().any(|c| c.from == conversion.from) {
                return Err(ValidationError::declaration(format!(
                    "Group '{}' is converted more than once on {}",
                    conversion.from, location
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ConstraintDefinitions;
    use constraints_core::{ClassRegistry, ContainerElementDecl, GroupConversion};
    use pretty_assertions::assert_eq;

    fn builder() -> MetaConstraintBuilder {
        let resolver = ValidatorResolver::new(
            Arc::new(ConstraintDefinitions::with_builtins()),
            Arc::new(ClassRegistry::new()),
        );
        MetaConstraintBuilder::new(Arc::new(resolver))
    }

    #[test]
    fn test_type_argument_constraints() {
        let element = ElementDecl {
            container_elements: vec![
                ContainerElementDecl::new(1)
                    .constraint(ConstraintAnnotation::new("NotBlank"))
                    .valid(),
            ],
            ..Default::default()
        };
        let location = ConstraintLocation::field(
            "Library",
            "books",
            TypeRef::map(TypeRef::Text, TypeRef::Text),
        );
        let (constraints, cascading) = builder().for_element(&element, &location).unwrap();

        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].extraction_path(), &[(ContainerKind::Map, 1)]);
        assert_eq!(constraints[0].validated_type(), &TypeRef::Text);
        assert!(cascading.is_cascading());
        assert_eq!(cascading.container_elements[0].type_argument_index, 1);
    }

    #[test]
    fn test_optional_is_unwrapped_implicitly() {
        let location = ConstraintLocation::field("Customer", "nickname", TypeRef::optional(TypeRef::Text));
        let size = builder()
            .create(&ConstraintAnnotation::new("Size").attr("max", 3), location.clone())
            .unwrap();
        assert_eq!(size.extraction_path(), &[(ContainerKind::Optional, 0)]);

        let not_null = builder().create(&ConstraintAnnotation::new("NotNull"), location).unwrap();
        assert!(not_null.extraction_path().is_empty());
    }

    #[test]
    fn test_invalid_type_argument_index() {
        let element = ElementDecl {
            container_elements: vec![ContainerElementDecl::new(3).constraint(ConstraintAnnotation::new("NotNull"))],
            ..Default::default()
        };
        let location = ConstraintLocation::field("Order", "lines", TypeRef::list(TypeRef::Text));
        assert!(builder().for_element(&element, &location).is_err());
    }

    #[test]
    fn test_group_conversion_requires_cascade() {
        let element = ElementDecl {
            group_conversions: vec![GroupConversion::new("Default", "Basic")],
            ..Default::default()
        };
        let location = ConstraintLocation::field("Order", "customer", TypeRef::bean("Customer"));
        assert!(matches!(
            builder().for_element(&element, &location),
            Err(ValidationError::ConstraintDeclaration(_))
        ));
    }
}
