//! Bean metadata.
//!
//! Providers contribute per-class [`BeanConfiguration`]s; the builder merges
//! the configurations of a class and its whole type hierarchy into a
//! [`BeanMetadata`], checking the rules on overriding methods along the way.
//! Managers cache the result per class.

mod aggregated;
mod manager;
mod meta_constraint;
mod provider;
mod raw;

pub use aggregated::*;
pub use manager::*;
pub use meta_constraint::*;
pub use provider::*;
pub use raw::*;
