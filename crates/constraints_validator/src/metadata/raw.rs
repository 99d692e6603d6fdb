//! Per-provider configuration of one class.
//!
//! Every metadata provider turns what it knows about a class into a
//! [`BeanConfiguration`]. Configurations of all providers and all classes of
//! a hierarchy are merged into [`crate::BeanMetadata`].

use crate::metadata::MetaConstraint;
use constraints_core::{
    ContainerKind, DefaultGroupSequenceProvider, ExecutableKind, Group, GroupConversion, Result, Signature, TypeRef,
    ValidationError,
};
use std::fmt;
use std::sync::Arc;

/// Where a configuration comes from, in increasing priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigurationSource {
    /// Declarations on the classes themselves
    Annotation,
    /// Mapping documents
    External,
    /// Mappings built in code
    Programmatic,
}

impl fmt::Display for ConfigurationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationSource::Annotation => f.write_str("annotation"),
            ConfigurationSource::External => f.write_str("external mapping"),
            ConfigurationSource::Programmatic => f.write_str("programmatic mapping"),
        }
    }
}

/// Cascading declared on a type argument of a container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerCascading {
    /// Container kind
    pub container: ContainerKind,
    /// Type argument index
    pub type_argument_index: usize,
    /// Declared type of the type argument
    pub element_type: TypeRef,
    /// Cascading of the type argument
    pub cascading: CascadingMetadata,
}

/// Cascade marker, group conversions and cascaded type arguments of one
/// element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadingMetadata {
    /// The element itself is cascaded
    pub cascade: bool,
    /// Group conversions applied when cascading
    pub group_conversions: Vec<GroupConversion>,
    /// Cascaded type arguments
    pub container_elements: Vec<ContainerCascading>,
}

impl CascadingMetadata {
    /// Returns true if the element or any of its type arguments cascades.
    pub fn is_cascading(&self) -> bool {
        self.cascade || self.container_elements.iter().any(|c| c.cascading.is_cascading())
    }

    /// Returns true if group conversions are declared here or on a type
    /// argument.
    pub fn has_group_conversions(&self) -> bool {
        !self.group_conversions.is_empty()
            || self
                .container_elements
                .iter()
                .any(|c| c.cascading.has_group_conversions())
    }

    /// Group used for the cascaded value when `group` is requested.
    pub fn convert_group(&self, group: &Group) -> Group {
        self.group_conversions
            .iter()
            .find(|c| c.from == *group)
            .map(|c| c.to.clone())
            .unwrap_or_else(|| group.clone())
    }

    /// Merges the cascading of the same element declared elsewhere.
    pub fn merge(&mut self, other: &CascadingMetadata) -> Result<()> {
        self.cascade |= other.cascade;
        for conversion in &other.group_conversions {
            match self.group_conversions.iter().find(|c| c.from == conversion.from) {
                Some(existing) if existing.to != conversion.to => {
                    return Err(ValidationError::declaration(format!(
                        "Conflicting group conversions for group '{}': '{}' and '{}'",
                        conversion.from, existing.to, conversion.to
                    )));
                }
                Some(_) => {}
                None => self.group_conversions.push(conversion.clone()),
            }
        }
        for element in &other.container_elements {
            let existing = self.container_elements.iter_mut().find(|c| {
                c.container == element.container && c.type_argument_index == element.type_argument_index
            });
            match existing {
                Some(existing) => existing.cascading.merge(&element.cascading)?,
                None => self.container_elements.push(element.clone()),
            }
        }
        Ok(())
    }
}

/// A constrained field.
#[derive(Debug, Clone)]
pub struct ConstrainedField {
    /// Field name
    pub name: String,
    /// Declared type
    pub declared_type: TypeRef,
    /// Constraints on the field and its type arguments
    pub constraints: Vec<Arc<MetaConstraint>>,
    /// Cascading
    pub cascading: CascadingMetadata,
}

/// A constrained parameter.
#[derive(Debug, Clone)]
pub struct ConstrainedParameter {
    /// Position
    pub index: usize,
    /// Declared name, when known
    pub name: Option<String>,
    /// Declared type
    pub declared_type: TypeRef,
    /// Constraints on the parameter and its type arguments
    pub constraints: Vec<Arc<MetaConstraint>>,
    /// Cascading
    pub cascading: CascadingMetadata,
}

/// A constrained method or constructor.
#[derive(Debug, Clone)]
pub struct ConstrainedExecutable {
    /// Method or constructor
    pub kind: ExecutableKind,
    /// Name
    pub name: String,
    /// Signature
    pub signature: Signature,
    /// Parameters
    pub parameters: Vec<ConstrainedParameter>,
    /// Cross-parameter constraints
    pub cross_parameter: Vec<Arc<MetaConstraint>>,
    /// Return type; `None` for void methods
    pub return_type: Option<TypeRef>,
    /// Return value constraints
    pub return_constraints: Vec<Arc<MetaConstraint>>,
    /// Return value cascading
    pub return_cascading: CascadingMetadata,
    /// Property exposed when the method is a getter
    pub getter_property: Option<String>,
}

impl ConstrainedExecutable {
    /// Returns true if parameters or the argument array are constrained or
    /// cascaded.
    pub fn has_parameter_constraints(&self) -> bool {
        !self.cross_parameter.is_empty()
            || self
                .parameters
                .iter()
                .any(|p| !p.constraints.is_empty() || p.cascading.is_cascading())
    }

    /// Returns true if the return value is constrained or cascaded.
    pub fn has_return_value_declarations(&self) -> bool {
        !self.return_constraints.is_empty() || self.return_cascading.is_cascading()
    }

    /// Returns true if both executables constrain their parameters alike.
    pub fn is_equally_parameter_constrained(&self, other: &ConstrainedExecutable) -> bool {
        fn rendered(constraints: &[Arc<MetaConstraint>]) -> Vec<String> {
            let mut out: Vec<String> = constraints.iter().map(|c| c.descriptor().to_string()).collect();
            out.sort();
            out
        }
        rendered(&self.cross_parameter) == rendered(&other.cross_parameter)
            && self.parameters.len() == other.parameters.len()
            && self.parameters.iter().zip(&other.parameters).all(|(a, b)| {
                rendered(&a.constraints) == rendered(&b.constraints)
                    && a.cascading.is_cascading() == b.cascading.is_cascading()
            })
    }

    /// Merges the same executable configured by another provider.
    pub fn merge(&mut self, other: &ConstrainedExecutable) -> Result<()> {
        for (mine, theirs) in self.parameters.iter_mut().zip(&other.parameters) {
            extend_unique(&mut mine.constraints, &theirs.constraints);
            mine.cascading.merge(&theirs.cascading)?;
            if mine.name.is_none() {
                mine.name = theirs.name.clone();
            }
        }
        extend_unique(&mut self.cross_parameter, &other.cross_parameter);
        extend_unique(&mut self.return_constraints, &other.return_constraints);
        self.return_cascading.merge(&other.return_cascading)?;
        if self.getter_property.is_none() {
            self.getter_property = other.getter_property.clone();
        }
        Ok(())
    }
}

/// Everything one provider declares for one class.
#[derive(Debug, Clone)]
pub struct BeanConfiguration {
    /// Provider kind
    pub source: ConfigurationSource,
    /// Class name
    pub class: String,
    /// Class-level constraints
    pub class_constraints: Vec<Arc<MetaConstraint>>,
    /// Constrained fields
    pub fields: Vec<ConstrainedField>,
    /// Constrained methods and constructors
    pub executables: Vec<ConstrainedExecutable>,
    /// Redefined default group sequence
    pub default_group_sequence: Option<Vec<Group>>,
    /// Dynamic default group sequence
    pub group_sequence_provider: Option<Arc<dyn DefaultGroupSequenceProvider>>,
}

impl BeanConfiguration {
    /// Creates an empty configuration.
    pub fn new(source: ConfigurationSource, class: impl Into<String>) -> Self {
        Self {
            source,
            class: class.into(),
            class_constraints: Vec::new(),
            fields: Vec::new(),
            executables: Vec::new(),
            default_group_sequence: None,
            group_sequence_provider: None,
        }
    }
}

/// Appends the constraints of `other` not already present in `target`.
pub(crate) fn extend_unique(target: &mut Vec<Arc<MetaConstraint>>, other: &[Arc<MetaConstraint>]) {
    for constraint in other {
        if !target.iter().any(|c| c.same_constraint(constraint)) {
            target.push(constraint.clone());
        }
    }
}
