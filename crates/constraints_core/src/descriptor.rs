//! Constraint descriptors.
//!
//! A [`ConstraintDescriptor`] is the fully resolved, immutable form of one
//! declared constraint: the attribute map with defaults applied, the message
//! template, the groups (including the implicit group of the hosting class)
//! and the composing constraints with attribute overrides already pushed
//! down.

use crate::declaration::AttributeValue;
use crate::group::Group;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Attribute names with a fixed meaning.
pub mod attributes {
    /// Message template attribute
    pub const MESSAGE: &str = "message";
    /// Groups attribute
    pub const GROUPS: &str = "groups";
    /// Payload attribute
    pub const PAYLOAD: &str = "payload";
    /// Validation target attribute of cross-parameter capable constraints
    pub const VALIDATION_APPLIES_TO: &str = "validationAppliesTo";
}

/// What a constraint declared on an executable validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintTarget {
    /// Decided from the constraint's validators and the annotated element
    #[default]
    Implicit,
    /// The annotated element (return value, field, ...)
    AnnotatedElement,
    /// The argument array of an executable
    Parameters,
}

/// How the results of composing constraints are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositionType {
    /// All composing constraints must pass
    #[default]
    And,
    /// At least one composing constraint must pass
    Or,
    /// No composing constraint may pass
    AllFalse,
}

/// Kind of program element a constraint is declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Class or interface
    Type,
    /// Field
    Field,
    /// Method (getter, return value, cross-parameter)
    Method,
    /// Constructor
    Constructor,
    /// Executable parameter
    Parameter,
    /// Type argument of a container
    TypeUse,
}

/// Where in a class a constraint is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintLocationKind {
    /// Class level
    Type,
    /// Field
    Field,
    /// Getter method used as a property
    Getter,
    /// Method or constructor parameter
    Parameter,
    /// Argument array of an executable
    CrossParameter,
    /// Return value of an executable
    ReturnValue,
    /// Type argument of a container
    TypeArgument,
}

impl ConstraintLocationKind {
    /// Element type reported by descriptors at this location.
    pub fn element_type(&self) -> ElementType {
        match self {
            ConstraintLocationKind::Type => ElementType::Type,
            ConstraintLocationKind::Field => ElementType::Field,
            ConstraintLocationKind::Getter
            | ConstraintLocationKind::CrossParameter
            | ConstraintLocationKind::ReturnValue => ElementType::Method,
            ConstraintLocationKind::Parameter => ElementType::Parameter,
            ConstraintLocationKind::TypeArgument => ElementType::TypeUse,
        }
    }
}

/// Immutable description of one declared constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDescriptor {
    /// Constraint kind, e.g. `NotNull` or `DecimalMin`
    pub kind: String,

    /// Attributes with defaults and composing overrides applied
    pub attributes: BTreeMap<String, AttributeValue>,

    /// Message template
    pub message_template: String,

    /// Groups the constraint belongs to
    pub groups: Vec<Group>,

    /// Payload markers
    pub payload: Vec<String>,

    /// Validation target for executable constraints
    pub validation_applies_to: ConstraintTarget,

    /// Composing constraints
    pub composing: Vec<Arc<ConstraintDescriptor>>,

    /// Whether composing failures are reported as a single violation
    pub report_as_single_violation: bool,

    /// How composing results are combined
    pub composition_type: CompositionType,

    /// Location kind of the annotated element
    pub location_kind: ConstraintLocationKind,
}

impl ConstraintDescriptor {
    /// Returns an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Returns a text attribute.
    pub fn text_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(AttributeValue::as_text)
    }

    /// Returns an integer attribute.
    pub fn int_attribute(&self, name: &str) -> Option<i64> {
        self.attribute(name).and_then(AttributeValue::as_int)
    }

    /// Returns a boolean attribute.
    pub fn bool_attribute(&self, name: &str) -> Option<bool> {
        self.attribute(name).and_then(AttributeValue::as_bool)
    }

    /// Element type of the annotated element.
    pub fn element_type(&self) -> ElementType {
        self.location_kind.element_type()
    }

    /// Returns true if the constraint belongs to `group`.
    pub fn is_in_group(&self, group: &Group) -> bool {
        self.groups.contains(group)
    }

    /// Returns true if the constraint validates the argument array.
    pub fn is_cross_parameter(&self) -> bool {
        self.validation_applies_to == ConstraintTarget::Parameters
    }
}

impl fmt::Display for ConstraintDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}(", self.kind)?;
        for (i, (name, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ConstraintDescriptor {
        ConstraintDescriptor {
            kind: "Size".to_string(),
            attributes: BTreeMap::from([
                ("min".to_string(), AttributeValue::Int(1)),
                ("max".to_string(), AttributeValue::Int(5)),
            ]),
            message_template: "{javax.validation.constraints.Size.message}".to_string(),
            groups: vec![Group::default_group()],
            payload: Vec::new(),
            validation_applies_to: ConstraintTarget::Implicit,
            composing: Vec::new(),
            report_as_single_violation: false,
            composition_type: CompositionType::And,
            location_kind: ConstraintLocationKind::Field,
        }
    }

    #[test]
    fn test_attribute_access() {
        let d = descriptor();
        assert_eq!(d.int_attribute("min"), Some(1));
        assert_eq!(d.text_attribute("min"), None);
        assert_eq!(d.to_string(), "@Size(max=5, min=1)");
        assert_eq!(d.element_type(), ElementType::Field);
        assert!(d.is_in_group(&Group::default()));
    }
}
