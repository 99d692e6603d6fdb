//! # Constraints Validator
//!
//! Metadata aggregation and validation engine for declarative constraints.
//! This crate turns class declarations, mapping documents and programmatic
//! mappings into bean metadata and validates object graphs against it:
//!
//! - Metadata providers and aggregation over class hierarchies
//! - Constraint trees for composed constraints and validator resolution
//! - Graph traversal with groups, group sequences, cascading and value
//!   extraction from containers
//! - Method and constructor validation
//! - Locale-aware message interpolation
//!
//! ## Example
//!
//! ```rust
//! use constraints_core::{ClassBuilder, ClassRegistry, ConstraintAnnotation, DynamicBean, FieldBuilder, Money, TypeRef};
//! use constraints_validator::ValidatorConfiguration;
//!
//! let registry = ClassRegistry::new().with_class(
//!     ClassBuilder::new("Order")
//!         .field(
//!             FieldBuilder::new("amount", TypeRef::Money)
//!                 .constraint(ConstraintAnnotation::new("DecimalMin").attr("value", "0"))
//!                 .build(),
//!         )
//!         .build(),
//! );
//! let validator = ValidatorConfiguration::new(registry).build().unwrap().validator();
//!
//! let order = DynamicBean::new("Order").with("amount", Money::of(-1, "EUR")).into_ref();
//! let violations = validator.validate(&order, &[]).unwrap();
//!
//! for violation in &violations {
//!     println!("{}: {}", violation.property_path, violation.message);
//! }
//! assert_eq!(violations.len(), 1);
//! ```

pub mod builtin;
mod constraint_validator;
mod context;
mod definition;
mod engine;
mod expression;
mod extraction;
mod factory;
mod interpolation;
mod metadata;
mod order;
mod plugins;
mod resolver;
mod script;
mod tree;

#[cfg(test)]
mod test_support;

pub use constraint_validator::*;
pub use context::*;
pub use definition::*;
pub use engine::*;
pub use expression::*;
pub use extraction::*;
pub use factory::*;
pub use interpolation::*;
pub use metadata::*;
pub use order::*;
pub use plugins::*;
pub use resolver::*;
pub use script::*;
