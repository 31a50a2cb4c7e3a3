//! Error types for the Tangle Simulator
//!
//! Decode and validation failures are recoverable and leave the ledger
//! untouched. Lifecycle and allocation failures are scoped to the single call
//! that raised them.

use super::value_objects::{Address, TransactionId, TransactionStatus};
use crate::config::ConfigError;
use thiserror::Error;

/// Request bytes that do not form a valid frame or operation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than the frame requires
    #[error("Truncated payload: needed {needed} bytes, got {available}")]
    TruncatedPayload { needed: usize, available: usize },

    /// Schema version byte does not match this engine
    #[error("Unsupported schema version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: u8, actual: u8 },

    /// Operation tag byte is not defined by the schema
    #[error("Unknown operation tag: {0:#04x}")]
    UnknownOperationTag(u8),

    /// Declared payload length disagrees with the bytes supplied
    #[error("Malformed length: declared {declared} payload bytes, frame carries {actual}")]
    MalformedLength { declared: usize, actual: usize },

    /// Request exceeds the configured size limit
    #[error("Request too large: {size} > {max}")]
    RequestTooLarge { size: usize, max: usize },

    /// Payload bytes are not a valid operation record
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// Operation rejected against the current ledger state
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Transaction references no parents")]
    NoParents,

    #[error("Too many parents: {count} > {max}")]
    TooManyParents { count: usize, max: usize },

    #[error("Parent referenced twice: {0:?}")]
    DuplicateParent(TransactionId),

    #[error("Unknown parent: {0:?}")]
    UnknownParent(TransactionId),

    #[error("Parent already rejected: {0:?}")]
    ParentRejected(TransactionId),

    #[error("Zero-value transfer on {address:?}")]
    ZeroDelta { address: Address },

    #[error("Transfers do not balance: net {net}")]
    Unbalanced { net: i128 },

    #[error("Insufficient balance on {address:?}: required {required}, available {available}")]
    InsufficientBalance {
        address: Address,
        required: u128,
        available: i128,
    },

    #[error("Transaction already exists: {0:?}")]
    DuplicateTransaction(TransactionId),

    #[error("Amount out of range: {amount}")]
    AmountOutOfRange { amount: u64 },

    #[error("Invalid milestone count: {requested} (allowed 1..={max})")]
    InvalidMilestoneCount { requested: u32, max: u32 },
}

/// Ledger state machine violations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid status transition for {id:?}: {from:?} -> {to:?}")]
    InvalidTransition {
        id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("Transaction not found: {0:?}")]
    UnknownTransaction(TransactionId),

    #[error("Ledger capacity exhausted: {max} transactions")]
    CapacityExhausted { max: usize },

    #[error("Confirmed balance underflow on {address:?}")]
    BalanceUnderflow { address: Address },
}

/// Top-level error for session and registry calls
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulatorError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Handle was never issued or has been destroyed
    #[error("Invalid handle: {0}")]
    InvalidHandle(u64),

    /// Resource limit reached; the call had no effect
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// Response buffer was never issued or was already released
    #[error("Unknown response buffer: {0}")]
    UnknownBuffer(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for simulator operations
pub type SimulatorResult<T> = Result<T, SimulatorError>;
