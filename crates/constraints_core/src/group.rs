//! Validation groups.
//!
//! A group is a named cohort of constraints. Groups may extend other groups
//! (validating the child also validates its parents) or be defined as an
//! ordered sequence of groups that short-circuits on the first failing step.
//! Every bean class is implicitly a group of its own: requesting it selects
//! the `Default` constraints hosted on that class.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the default group.
pub const DEFAULT_GROUP: &str = "Default";

/// A validation group identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(String);

impl Group {
    /// Creates a group from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The `Default` group.
    pub fn default_group() -> Self {
        Self(DEFAULT_GROUP.to_string())
    }

    /// Returns true if this is the `Default` group.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_GROUP
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::default_group()
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Group {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Group {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Declaration of a group: its parents or, for sequences, its steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDefinition {
    /// The group being defined
    pub group: Group,

    /// Groups this one extends
    #[serde(default)]
    pub extends: Vec<Group>,

    /// Ordered steps when the group is a sequence
    #[serde(default)]
    pub sequence: Option<Vec<Group>>,
}

impl GroupDefinition {
    /// Defines a plain group extending `parents`.
    pub fn group(group: impl Into<Group>, parents: Vec<Group>) -> Self {
        Self {
            group: group.into(),
            extends: parents,
            sequence: None,
        }
    }

    /// Defines a group sequence.
    pub fn sequence(group: impl Into<Group>, steps: Vec<Group>) -> Self {
        Self {
            group: group.into(),
            extends: Vec::new(),
            sequence: Some(steps),
        }
    }

    /// Returns true if this definition is a sequence.
    pub fn is_sequence(&self) -> bool {
        self.sequence.is_some()
    }
}

/// Builds a group list from names.
pub fn groups<I, S>(names: I) -> Vec<Group>
where
    I: IntoIterator<Item = S>,
    S: Into<Group>,
{
    names.into_iter().map(Into::into).collect()
}
