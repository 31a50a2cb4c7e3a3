//! Outbound ports (driven side)

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Failure reported by a [`WireSerializer`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Input ended before the record was complete
    #[error("unexpected end of input")]
    Truncated,

    /// Record exceeds the serializer's size limit
    #[error("size limit exceeded")]
    SizeLimit,

    /// Bytes do not describe the expected record
    #[error("{0}")]
    Malformed(String),
}

/// Encodes frame payloads and response envelopes.
///
/// Implementations must be deterministic and must reject trailing bytes on
/// deserialize.
pub trait WireSerializer: Send + Sync {
    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SerializationError>;

    fn deserialize<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, SerializationError>;
}
