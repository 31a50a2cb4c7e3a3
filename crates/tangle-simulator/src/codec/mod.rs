//! Codec: versioned request and response frames
//!
//! ## Request frame (integers little-endian)
//!
//! ```text
//! [version: u8][tag: u8][payload length: u32][payload: bincode]
//! ```
//!
//! ## Response frame
//!
//! ```text
//! [version: u8][bincode(ResponseEnvelope)]
//! ```

pub mod convert;
pub mod payloads;

use crate::adapters::BincodeSerializer;
use crate::config::SimulatorConfig;
use crate::domain::errors::{DecodeError, SimulatorError, SimulatorResult};
use crate::domain::operations::{Operation, Outcome};
use crate::ports::outbound::{SerializationError, WireSerializer};
use payloads::{
    AdvancePayload, ErrorReport, FundsPayload, IssuePayload, QueryPayload, ResponseEnvelope,
};
use serde::de::DeserializeOwned;
use tracing::error;

/// Wire schema version carried in the first byte of every frame
pub const SCHEMA_VERSION: u8 = 1;

/// Version, tag and payload length
pub const HEADER_LEN: usize = 6;

/// Operation tag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationTag {
    Issue = 0x01,
    Query = 0x02,
    Snapshot = 0x03,
    Advance = 0x04,
    RequestFunds = 0x05,
}

impl OperationTag {
    pub fn of(operation: &Operation) -> Self {
        match operation {
            Operation::Issue(_) => OperationTag::Issue,
            Operation::Query(_) => OperationTag::Query,
            Operation::Snapshot => OperationTag::Snapshot,
            Operation::Advance { .. } => OperationTag::Advance,
            Operation::RequestFunds(_) => OperationTag::RequestFunds,
        }
    }
}

impl TryFrom<u8> for OperationTag {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(OperationTag::Issue),
            0x02 => Ok(OperationTag::Query),
            0x03 => Ok(OperationTag::Snapshot),
            0x04 => Ok(OperationTag::Advance),
            0x05 => Ok(OperationTag::RequestFunds),
            other => Err(DecodeError::UnknownOperationTag(other)),
        }
    }
}

/// Frames operations and responses through a [`WireSerializer`].
#[derive(Debug, Clone)]
pub struct Codec<S: WireSerializer = BincodeSerializer> {
    serializer: S,
    max_request_bytes: usize,
}

impl Codec<BincodeSerializer> {
    pub fn new(max_request_bytes: usize) -> Self {
        Self::with_serializer(BincodeSerializer::default(), max_request_bytes)
    }
}

impl Default for Codec<BincodeSerializer> {
    fn default() -> Self {
        Self::new(SimulatorConfig::default().max_request_bytes)
    }
}

impl<S: WireSerializer> Codec<S> {
    pub fn with_serializer(serializer: S, max_request_bytes: usize) -> Self {
        Self {
            serializer,
            max_request_bytes,
        }
    }

    /// Build a request frame for `operation`.
    pub fn encode_request(&self, operation: &Operation) -> SimulatorResult<Vec<u8>> {
        let payload = match operation {
            Operation::Issue(request) => self.serialize(&IssuePayload::from(request))?,
            Operation::Query(query) => self.serialize(&QueryPayload::from(query))?,
            Operation::Snapshot => Vec::new(),
            Operation::Advance { milestones } => self.serialize(&AdvancePayload {
                milestones: *milestones,
            })?,
            Operation::RequestFunds(request) => self.serialize(&FundsPayload::from(request))?,
        };
        let length = u32::try_from(payload.len())
            .map_err(|_| SimulatorError::Serialization("payload exceeds u32 length".into()))?;

        let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
        frame.push(SCHEMA_VERSION);
        frame.push(OperationTag::of(operation) as u8);
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Parse a request frame.
    ///
    /// Header problems are reported before payload problems, in frame order.
    pub fn decode_request(&self, bytes: &[u8]) -> Result<Operation, DecodeError> {
        if bytes.len() > self.max_request_bytes {
            return Err(DecodeError::RequestTooLarge {
                size: bytes.len(),
                max: self.max_request_bytes,
            });
        }
        let Some(&version) = bytes.first() else {
            return Err(DecodeError::TruncatedPayload {
                needed: HEADER_LEN,
                available: 0,
            });
        };
        if version != SCHEMA_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                expected: SCHEMA_VERSION,
                actual: version,
            });
        }
        if bytes.len() < HEADER_LEN {
            return Err(DecodeError::TruncatedPayload {
                needed: HEADER_LEN,
                available: bytes.len(),
            });
        }

        let tag = OperationTag::try_from(bytes[1])?;
        let declared = u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]) as usize;
        let body = &bytes[HEADER_LEN..];
        if declared > self.max_request_bytes || body.len() > declared {
            return Err(DecodeError::MalformedLength {
                declared,
                actual: body.len(),
            });
        }
        if body.len() < declared {
            return Err(DecodeError::TruncatedPayload {
                needed: HEADER_LEN + declared,
                available: bytes.len(),
            });
        }

        let operation = match tag {
            OperationTag::Issue => Operation::Issue(self.deserialize::<IssuePayload>(body)?.into()),
            OperationTag::Query => Operation::Query(self.deserialize::<QueryPayload>(body)?.into()),
            OperationTag::Snapshot => {
                if !body.is_empty() {
                    return Err(DecodeError::MalformedPayload(
                        "snapshot takes no payload".into(),
                    ));
                }
                Operation::Snapshot
            }
            OperationTag::Advance => Operation::Advance {
                milestones: self.deserialize::<AdvancePayload>(body)?.milestones,
            },
            OperationTag::RequestFunds => {
                Operation::RequestFunds(self.deserialize::<FundsPayload>(body)?.into())
            }
        };
        Ok(operation)
    }

    /// Encode a successful outcome.
    pub fn encode_outcome(&self, outcome: &Outcome) -> Vec<u8> {
        self.encode_envelope(&ResponseEnvelope::ok(outcome.into()))
    }

    /// Encode an error so the caller can tell its category apart from success.
    pub fn encode_error(&self, err: &SimulatorError) -> Vec<u8> {
        self.encode_envelope(&ResponseEnvelope::err(ErrorReport::from(err)))
    }

    pub fn encode_result(&self, result: &SimulatorResult<Outcome>) -> Vec<u8> {
        match result {
            Ok(outcome) => self.encode_outcome(outcome),
            Err(err) => self.encode_error(err),
        }
    }

    /// Parse a response frame.
    pub fn decode_response(&self, bytes: &[u8]) -> Result<ResponseEnvelope, DecodeError> {
        let Some((&version, body)) = bytes.split_first() else {
            return Err(DecodeError::TruncatedPayload {
                needed: 1,
                available: 0,
            });
        };
        if version != SCHEMA_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                expected: SCHEMA_VERSION,
                actual: version,
            });
        }
        self.deserialize(body)
    }

    /// A response that fails to encode degrades to a bare version byte,
    /// which callers decode as truncated.
    fn encode_envelope(&self, envelope: &ResponseEnvelope) -> Vec<u8> {
        match self.serializer.serialize(envelope) {
            Ok(body) => {
                let mut frame = Vec::with_capacity(1 + body.len());
                frame.push(SCHEMA_VERSION);
                frame.extend_from_slice(&body);
                frame
            }
            Err(err) => {
                error!(%err, "Failed to encode response envelope");
                vec![SCHEMA_VERSION]
            }
        }
    }

    fn serialize<T: serde::Serialize>(&self, value: &T) -> SimulatorResult<Vec<u8>> {
        self.serializer
            .serialize(value)
            .map_err(|err| SimulatorError::Serialization(err.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, DecodeError> {
        self.serializer.deserialize(body).map_err(|err| match err {
            SerializationError::Truncated => DecodeError::TruncatedPayload {
                needed: body.len() + 1,
                available: body.len(),
            },
            SerializationError::SizeLimit => DecodeError::RequestTooLarge {
                size: body.len(),
                max: self.max_request_bytes,
            },
            SerializationError::Malformed(message) => DecodeError::MalformedPayload(message),
        })
    }
}

fn default_codec() -> Codec {
    Codec::new(SimulatorConfig::default().max_request_bytes)
}

/// Encode with the default codec
pub fn encode_request(operation: &Operation) -> SimulatorResult<Vec<u8>> {
    default_codec().encode_request(operation)
}

/// Decode with the default codec
pub fn decode_request(bytes: &[u8]) -> Result<Operation, DecodeError> {
    default_codec().decode_request(bytes)
}

pub fn encode_outcome(outcome: &Outcome) -> Vec<u8> {
    default_codec().encode_outcome(outcome)
}

pub fn encode_error(err: &SimulatorError) -> Vec<u8> {
    default_codec().encode_error(err)
}

pub fn encode_result(result: &SimulatorResult<Outcome>) -> Vec<u8> {
    default_codec().encode_result(result)
}

pub fn decode_response(bytes: &[u8]) -> Result<ResponseEnvelope, DecodeError> {
    default_codec().decode_response(bytes)
}
