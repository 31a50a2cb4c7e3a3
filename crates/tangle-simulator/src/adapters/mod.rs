//! Serializer Adapters
//!
//! Implementations of the `WireSerializer` trait.

mod bincode;

pub use self::bincode::{BincodeSerializer, DEFAULT_LIMIT};
