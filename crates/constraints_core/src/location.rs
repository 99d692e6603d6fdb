//! Constraint locations.

use crate::declaration::Signature;
use crate::descriptor::ConstraintLocationKind;
use crate::types::{ContainerKind, TypeRef};
use std::fmt;

/// The element of a class a constraint is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocationElement {
    /// The class itself
    Class,
    /// A field
    Field(String),
    /// A getter, with the property name it exposes
    Getter {
        /// Getter signature
        method: Signature,
        /// Property name
        property: String,
    },
    /// A parameter of an executable
    Parameter {
        /// Executable signature
        executable: Signature,
        /// Parameter index
        index: usize,
    },
    /// The argument array of an executable
    CrossParameter(Signature),
    /// The return value of an executable
    ReturnValue(Signature),
}

/// Where a constraint applies: owning class, element, optional type-argument
/// coordinates inside containers and the declared type of the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintLocation {
    /// Class hosting the declaration
    pub declaring_class: String,
    /// Annotated element
    pub element: LocationElement,
    /// Type-argument steps from the element down to the constrained type
    pub type_argument_path: Vec<(ContainerKind, usize)>,
    /// Declared type of the constrained target
    pub declared_type: TypeRef,
}

impl ConstraintLocation {
    /// Location on the class itself.
    pub fn class(class: impl Into<String>) -> Self {
        let class = class.into();
        Self {
            declared_type: TypeRef::Bean(class.clone()),
            declaring_class: class,
            element: LocationElement::Class,
            type_argument_path: Vec::new(),
        }
    }

    /// Location on a field.
    pub fn field(class: impl Into<String>, name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            declaring_class: class.into(),
            element: LocationElement::Field(name.into()),
            type_argument_path: Vec::new(),
            declared_type,
        }
    }

    /// Location on a getter.
    pub fn getter(
        class: impl Into<String>,
        method: Signature,
        property: impl Into<String>,
        declared_type: TypeRef,
    ) -> Self {
        Self {
            declaring_class: class.into(),
            element: LocationElement::Getter {
                method,
                property: property.into(),
            },
            type_argument_path: Vec::new(),
            declared_type,
        }
    }

    /// Location on a parameter.
    pub fn parameter(
        class: impl Into<String>,
        executable: Signature,
        index: usize,
        declared_type: TypeRef,
    ) -> Self {
        Self {
            declaring_class: class.into(),
            element: LocationElement::Parameter { executable, index },
            type_argument_path: Vec::new(),
            declared_type,
        }
    }

    /// Location on the argument array.
    pub fn cross_parameter(class: impl Into<String>, executable: Signature) -> Self {
        Self {
            declaring_class: class.into(),
            element: LocationElement::CrossParameter(executable),
            type_argument_path: Vec::new(),
            declared_type: TypeRef::argument_array(),
        }
    }

    /// Location on a return value.
    pub fn return_value(class: impl Into<String>, executable: Signature, declared_type: TypeRef) -> Self {
        Self {
            declaring_class: class.into(),
            element: LocationElement::ReturnValue(executable),
            type_argument_path: Vec::new(),
            declared_type,
        }
    }

    /// Location of a type argument of this location's declared type.
    ///
    /// Returns `None` if the declared type has no such type argument.
    pub fn type_argument(&self, index: usize) -> Option<Self> {
        let kind = self.declared_type.container_kind()?;
        let declared_type = self.declared_type.type_argument(index)?;
        let mut path = self.type_argument_path.clone();
        path.push((kind, index));
        Some(Self {
            declaring_class: self.declaring_class.clone(),
            element: self.element.clone(),
            type_argument_path: path,
            declared_type,
        })
    }

    /// Kind of location, as reported by descriptors.
    pub fn kind(&self) -> ConstraintLocationKind {
        if !self.type_argument_path.is_empty() {
            return ConstraintLocationKind::TypeArgument;
        }
        match self.element {
            LocationElement::Class => ConstraintLocationKind::Type,
            LocationElement::Field(_) => ConstraintLocationKind::Field,
            LocationElement::Getter { .. } => ConstraintLocationKind::Getter,
            LocationElement::Parameter { .. } => ConstraintLocationKind::Parameter,
            LocationElement::CrossParameter(_) => ConstraintLocationKind::CrossParameter,
            LocationElement::ReturnValue(_) => ConstraintLocationKind::ReturnValue,
        }
    }

    /// Property name for field and getter locations.
    pub fn property_name(&self) -> Option<&str> {
        match &self.element {
            LocationElement::Field(name) => Some(name),
            LocationElement::Getter { property, .. } => Some(property),
            _ => None,
        }
    }

    /// Returns true if the constraint sits on a member rather than the class.
    pub fn is_member(&self) -> bool {
        self.element != LocationElement::Class
    }
}

impl fmt::Display for ConstraintLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.element {
            LocationElement::Class => write!(f, "{}", self.declaring_class)?,
            LocationElement::Field(name) => write!(f, "{}#{}", self.declaring_class, name)?,
            LocationElement::Getter { method, .. } => write!(f, "{}#{}", self.declaring_class, method)?,
            LocationElement::Parameter { executable, index } => {
                write!(f, "{}#{}[{}]", self.declaring_class, executable, index)?
            }
            LocationElement::CrossParameter(executable) => {
                write!(f, "{}#{}<cross-parameter>", self.declaring_class, executable)?
            }
            LocationElement::ReturnValue(executable) => {
                write!(f, "{}#{}<return value>", self.declaring_class, executable)?
            }
        }
        for (kind, index) in &self.type_argument_path {
            write!(f, ".{}<{}>", kind, index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_argument_location() {
        let field = ConstraintLocation::field(
            "Order",
            "lines",
            TypeRef::map(TypeRef::Text, TypeRef::list(TypeRef::Integer)),
        );
        let values = field.type_argument(1).unwrap();
        let inner = values.type_argument(0).unwrap();

        assert_eq!(inner.declared_type, TypeRef::Integer);
        assert_eq!(inner.kind(), ConstraintLocationKind::TypeArgument);
        assert_eq!(inner.to_string(), "Order#lines.Map<1>.List<0>");
        assert_eq!(inner.property_name(), Some("lines"));
        assert!(field.type_argument(2).is_none());
    }

    #[test]
    fn test_value_equality() {
        let a = ConstraintLocation::field("Order", "id", TypeRef::Integer);
        let b = ConstraintLocation::field("Order", "id", TypeRef::Integer);
        assert_eq!(a, b);
        assert_ne!(a, ConstraintLocation::class("Order"));
    }
}
