//! Domain module
//!
//! Entities, value objects and the pure matching rules.

pub mod aggregates;
pub mod value_objects;
pub mod services;

pub use aggregates::*;
pub use value_objects::*;
