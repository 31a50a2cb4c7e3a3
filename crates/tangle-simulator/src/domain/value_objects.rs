//! Value objects for the ledger
//!
//! Identifiers, transfers and the status/rejection vocabulary shared by every
//! component.

use primitive_types::H256;
use serde::{Deserialize, Serialize};

/// Transaction identifier (SHA-256 of the transaction contents)
pub type TransactionId = H256;
/// Ledger account identifier
pub type Address = H256;

/// A signed balance change on one address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transfer {
    pub address: Address,
    /// Positive credits, negative debits
    pub delta: i64,
}

impl Transfer {
    pub fn new(address: Address, delta: i64) -> Self {
        Self { address, delta }
    }
}

/// What produced a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// The single root of the DAG; mints the supply
    Genesis,
    /// Issued by a caller or by the faucet
    Value,
    /// Zero-value approval of the frontier issued while advancing
    Milestone,
}

impl TransactionKind {
    pub(crate) fn tag(self) -> u8 {
        match self {
            TransactionKind::Genesis => 0,
            TransactionKind::Value => 1,
            TransactionKind::Milestone => 2,
        }
    }
}

/// Confirmation status. Only Pending → Confirmed and Pending → Rejected are legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl TransactionStatus {
    /// Confirmed or Rejected
    pub fn is_final(self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        !self.is_final() && next.is_final()
    }
}

/// Why a transaction was rejected after it had been accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Lost a conflict group to `winner`
    DoubleSpend { winner: TransactionId },
    /// Spends funds its branch no longer holds
    InsufficientBalance { address: Address },
}
