//! Domain module for the Tangle Simulator
//!
//! Contains core entities, value objects, operations, errors, and invariants.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod operations;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use operations::*;
pub use value_objects::*;
