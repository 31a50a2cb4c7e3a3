//! Wire payloads
//!
//! Hashes and addresses travel as raw `[u8; 32]` arrays so bincode lays them
//! out as 32 fixed bytes. Domain types are converted in `convert.rs`.

use crate::domain::value_objects::{TransactionKind, TransactionStatus};
use serde::{Deserialize, Serialize};

// ============================================================
// REQUEST PAYLOADS
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    pub address: [u8; 32],
    pub delta: i64,
}

/// Payload of tag `0x01`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePayload {
    pub parents: Vec<[u8; 32]>,
    pub transfers: Vec<TransferPayload>,
    pub nonce: u64,
}

/// Payload of tag `0x02`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryPayload {
    Transaction([u8; 32]),
    Balance([u8; 32]),
    Tips,
    LatestMilestone,
}

/// Payload of tag `0x04`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancePayload {
    pub milestones: u32,
}

/// Payload of tag `0x05`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsPayload {
    pub address: [u8; 32],
    pub amount: u64,
}

// ============================================================
// RESPONSE PAYLOADS
// ============================================================

/// Body of every response frame.
///
/// Exactly one of `body` and `error` is set, matching `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub body: Option<ResponseBody>,
    pub error: Option<ErrorReport>,
}

impl ResponseEnvelope {
    pub fn ok(body: ResponseBody) -> Self {
        Self {
            success: true,
            body: Some(body),
            error: None,
        }
    }

    pub fn err(report: ErrorReport) -> Self {
        Self {
            success: false,
            body: None,
            error: Some(report),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseBody {
    Issued(IssueReceiptPayload),
    Advanced(AdvanceReceiptPayload),
    Transaction(Option<TransactionPayload>),
    Balance(BalancePayload),
    Tips(Vec<[u8; 32]>),
    Snapshot(SnapshotPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionPayload {
    DoubleSpend { winner: [u8; 32] },
    InsufficientBalance { address: [u8; 32] },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPayload {
    pub confirmed: Vec<[u8; 32]>,
    pub rejected: Vec<([u8; 32], RejectionPayload)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReceiptPayload {
    pub transaction_id: [u8; 32],
    pub status: TransactionStatus,
    pub settlement: SettlementPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceReceiptPayload {
    pub milestones: Vec<[u8; 32]>,
    pub settlement: SettlementPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub id: [u8; 32],
    pub kind: TransactionKind,
    pub parents: Vec<[u8; 32]>,
    pub transfers: Vec<TransferPayload>,
    pub timestamp: u64,
    pub nonce: u64,
    pub status: TransactionStatus,
    pub rejection: Option<RejectionPayload>,
    pub approval_weight: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePayload {
    pub address: [u8; 32],
    pub confirmed: u64,
    pub pending_delta: i128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub clock: u64,
    pub milestone_count: u64,
    pub genesis: [u8; 32],
    pub balances: Vec<([u8; 32], u64)>,
    pub transactions: Vec<TransactionPayload>,
    pub frontier: Vec<[u8; 32]>,
}

// ============================================================
// ERRORS
// ============================================================

/// Coarse error class so callers can tell bad input from bad state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Request bytes were not a valid frame
    Decode,
    /// Operation refused against the current ledger
    Validation,
    /// Handle or buffer misuse
    Lifecycle,
    /// Capacity exhausted
    Allocation,
    /// Engine fault; the session should be discarded
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    TruncatedPayload,
    UnsupportedVersion,
    UnknownOperationTag,
    MalformedLength,
    RequestTooLarge,
    MalformedPayload,
    NoParents,
    TooManyParents,
    DuplicateParent,
    UnknownParent,
    ParentRejected,
    ZeroDelta,
    Unbalanced,
    InsufficientBalance,
    DuplicateTransaction,
    AmountOutOfRange,
    InvalidMilestoneCount,
    InvalidHandle,
    UnknownBuffer,
    AllocationFailed,
    CapacityExhausted,
    InvalidTransition,
    UnknownTransaction,
    BalanceUnderflow,
    InvalidConfig,
    Serialization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub category: ErrorCategory,
    pub code: ErrorCode,
    pub message: String,
}
