//! Constraint violations.

use crate::descriptor::ConstraintDescriptor;
use crate::path::Path;
use crate::value::{BeanRef, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One failed constraint evaluation.
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    /// Interpolated message
    pub message: String,
    /// Message template before interpolation
    pub message_template: String,
    /// Root bean of the call, absent for constructor and `validate_value` calls
    pub root_bean: Option<BeanRef>,
    /// Class of the root bean
    pub root_bean_class: String,
    /// Bean hosting the failing element, absent for parameters and values
    pub leaf_bean: Option<BeanRef>,
    /// Path from the root to the invalid value
    pub property_path: Path,
    /// The value that failed validation
    pub invalid_value: Value,
    /// Descriptor of the failing constraint
    pub descriptor: Arc<ConstraintDescriptor>,
    /// Arguments of an executable call
    pub executable_parameters: Option<Vec<Value>>,
    /// Return value of an executable call
    pub executable_return_value: Option<Value>,
    /// Payload set by the validator
    pub dynamic_payload: Option<Value>,
}

impl ConstraintViolation {
    /// Kind of the failing constraint.
    pub fn constraint_kind(&self) -> &str {
        &self.descriptor.kind
    }

    fn same_as(&self, other: &Self) -> bool {
        self.property_path == other.property_path
            && (Arc::ptr_eq(&self.descriptor, &other.descriptor) || self.descriptor == other.descriptor)
            && self.invalid_value == other.invalid_value
            && self.message == other.message
            && self.message_template == other.message_template
    }
}

impl PartialEq for ConstraintViolation {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.property_path.to_string();
        if path.is_empty() {
            write!(f, "{}: {}", self.root_bean_class, self.message)
        } else {
            write!(f, "{}: {}", path, self.message)
        }
    }
}

/// The result of a validation call.
///
/// Violations equal in path, descriptor, invalid value, message and template
/// are kept once; insertion order is retained.
#[derive(Debug, Clone, Default)]
pub struct ConstraintViolations {
    violations: Vec<ConstraintViolation>,
    /// Positions in `violations` by rendered path, message and template
    index: HashMap<(String, String, String), Vec<usize>>,
}

impl ConstraintViolations {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a violation unless an equal one is already present.
    ///
    /// Returns true if the violation was added.
    pub fn insert(&mut self, violation: ConstraintViolation) -> bool {
        let key = (
            violation.property_path.to_string(),
            violation.message.clone(),
            violation.message_template.clone(),
        );
        let positions = self.index.entry(key).or_default();
        if positions.iter().any(|&i| self.violations[i].same_as(&violation)) {
            return false;
        }
        positions.push(self.violations.len());
        self.violations.push(violation);
        true
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Iterates over the violations.
    pub fn iter(&self) -> std::slice::Iter<'_, ConstraintViolation> {
        self.violations.iter()
    }

    /// Rendered property paths, in insertion order.
    pub fn paths(&self) -> Vec<String> {
        self.violations
            .iter()
            .map(|v| v.property_path.to_string())
            .collect()
    }

    /// Messages, in insertion order.
    pub fn messages(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.message.as_str()).collect()
    }

    /// Violations of a given constraint kind.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a ConstraintViolation> + 'a {
        self.violations.iter().filter(move |v| v.descriptor.kind == kind)
    }

    /// Consumes the set into a vector.
    pub fn into_vec(self) -> Vec<ConstraintViolation> {
        self.violations
    }
}

impl PartialEq for ConstraintViolations {
    /// Set equality, independent of insertion order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.violations.iter().all(|v| other.violations.contains(v))
    }
}

impl IntoIterator for ConstraintViolations {
    type Item = ConstraintViolation;
    type IntoIter = std::vec::IntoIter<ConstraintViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConstraintViolations {
    type Item = &'a ConstraintViolation;
    type IntoIter = std::slice::Iter<'a, ConstraintViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl fmt::Display for ConstraintViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for violation in &self.violations {
            writeln!(f, "{}", violation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CompositionType, ConstraintLocationKind, ConstraintTarget};
    use crate::group::Group;
    use std::collections::BTreeMap;

    fn violation(path: &str, value: Value) -> ConstraintViolation {
        let descriptor = Arc::new(ConstraintDescriptor {
            kind: "NotNull".to_string(),
            attributes: BTreeMap::new(),
            message_template: "{javax.validation.constraints.NotNull.message}".to_string(),
            groups: vec![Group::default_group()],
            payload: Vec::new(),
            validation_applies_to: ConstraintTarget::Implicit,
            composing: Vec::new(),
            report_as_single_violation: false,
            composition_type: CompositionType::And,
            location_kind: ConstraintLocationKind::Field,
        });
        ConstraintViolation {
            message: "must not be null".to_string(),
            message_template: descriptor.message_template.clone(),
            root_bean: None,
            root_bean_class: "Order".to_string(),
            leaf_bean: None,
            property_path: Path::root().with_property(path),
            invalid_value: value,
            descriptor,
            executable_parameters: None,
            executable_return_value: None,
            dynamic_payload: None,
        }
    }

    #[test]
    fn test_duplicates_are_coalesced() {
        let mut set = ConstraintViolations::new();
        assert!(set.insert(violation("id", Value::Null)));
        assert!(!set.insert(violation("id", Value::Null)));
        assert!(set.insert(violation("name", Value::Null)));
        assert!(set.insert(violation("id", Value::Int(1))));
        assert_eq!(set.len(), 3);
        assert_eq!(set.paths(), vec!["id", "name", "id"]);
    }

    #[test]
    fn test_coalescing_many_violations() {
        let mut set = ConstraintViolations::new();
        for round in 0..2 {
            for i in 0..5_000 {
                let added = set.insert(violation(&format!("item{}", i), Value::Null));
                assert_eq!(added, round == 0);
            }
        }
        assert_eq!(set.len(), 5_000);
        assert_eq!(set.paths()[4_999], "item4999");
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let mut a = ConstraintViolations::new();
        a.insert(violation("x", Value::Null));
        a.insert(violation("y", Value::Null));
        let mut b = ConstraintViolations::new();
        b.insert(violation("y", Value::Null));
        b.insert(violation("x", Value::Null));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "x: must not be null\ny: must not be null\n");
    }
}
