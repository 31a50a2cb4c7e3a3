use crate::ports::outbound::{SerializationError, WireSerializer};
use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

/// Upper bound on any single serialized record
pub const DEFAULT_LIMIT: u64 = 64 * 1024 * 1024;

/// Default wire serializer using bincode.
///
/// Fixed-width little-endian integers, no trailing bytes, and a hard size
/// limit so a hostile length prefix cannot force a large allocation.
#[derive(Clone, Copy, Debug)]
pub struct BincodeSerializer {
    limit: u64,
}

impl BincodeSerializer {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    fn options(&self) -> impl Options {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_little_endian()
            .reject_trailing_bytes()
            .with_limit(self.limit)
    }
}

impl Default for BincodeSerializer {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl WireSerializer for BincodeSerializer {
    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SerializationError> {
        self.options().serialize(value).map_err(map_error)
    }

    fn deserialize<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, SerializationError> {
        self.options().deserialize(data).map_err(map_error)
    }
}

fn map_error(err: bincode::Error) -> SerializationError {
    match *err {
        bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            SerializationError::Truncated
        }
        bincode::ErrorKind::SizeLimit => SerializationError::SizeLimit,
        other => SerializationError::Malformed(other.to_string()),
    }
}
