//! External mapping documents.

use crate::mapping::{ConstraintDefinitionMapping, TypeMapping};
use serde::{Deserialize, Serialize};

/// A parsed mapping document.
///
/// Documents may redefine the validators of constraint kinds and map any
/// number of classes. A class must not be mapped twice, neither within one
/// document nor across the documents handed to one factory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    /// Validator redefinitions
    #[serde(default)]
    pub constraint_definitions: Vec<ConstraintDefinitionMapping>,

    /// Class mappings
    #[serde(default)]
    pub beans: Vec<TypeMapping>,
}

impl MappingDocument {
    /// Names of the mapped classes, in document order.
    pub fn mapped_classes(&self) -> Vec<&str> {
        self.beans.iter().map(|b| b.class.as_str()).collect()
    }
}
