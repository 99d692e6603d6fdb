//! # Constraints Core
//!
//! Core data structures and types for the declarative constraint-validation
//! engine.
//!
//! This crate provides the building blocks shared by the mapping and
//! validator crates: the dynamic value model that validated object graphs
//! are expressed in, declared types, class declarations (what reflection
//! would see on a class), groups, property paths, constraint descriptors and
//! the violation records handed back to callers.
//!
//! ## Key Concepts
//!
//! - **Bean**: An object with a runtime class and readable properties
//! - **ClassDescriptor**: Fields, methods and constructors of a class with
//!   their constraint annotations, cascade markers and group conversions
//! - **Group**: A named cohort of constraints; sequences short-circuit
//! - **Path**: The location of a violation inside the object graph
//! - **ConstraintViolation**: One failed constraint evaluation
//!
//! ## Example
//!
//! ```rust
//! use constraints_core::{
//!     ClassBuilder, ClassRegistry, ConstraintAnnotation, DynamicBean, FieldBuilder, TypeRef, Value,
//! };
//!
//! let registry = ClassRegistry::new().with_class(
//!     ClassBuilder::new("Customer")
//!         .field(
//!             FieldBuilder::new("name", TypeRef::Text)
//!                 .constraint(ConstraintAnnotation::new("NotBlank"))
//!                 .build(),
//!         )
//!         .build(),
//! );
//!
//! let customer = DynamicBean::new("Customer").with("name", "Ada");
//! assert!(registry.contains("Customer"));
//! assert_eq!(Value::from(customer).type_name(), "bean");
//! ```

pub mod builder;
pub mod declaration;
pub mod descriptor;
pub mod error;
pub mod group;
pub mod locale;
pub mod location;
pub mod path;
pub mod registry;
pub mod settings;
pub mod types;
pub mod value;
pub mod violation;

pub use builder::*;
pub use declaration::*;
pub use descriptor::*;
pub use error::*;
pub use group::*;
pub use locale::*;
pub use location::*;
pub use path::*;
pub use registry::*;
pub use settings::*;
pub use types::*;
pub use value::*;
pub use violation::*;
