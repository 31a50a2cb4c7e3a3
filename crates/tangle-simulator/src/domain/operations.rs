//! Operations accepted by a session and the outcomes they produce
//!
//! These are the decoded forms of request frames; the codec owns the wire
//! representation.

use super::value_objects::{
    Address, RejectionReason, TransactionId, TransactionKind, TransactionStatus, Transfer,
};

/// Caller-built value transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueRequest {
    /// Attachment points (at least one)
    pub parents: Vec<TransactionId>,
    /// Signed balance changes; must sum to zero
    pub transfers: Vec<Transfer>,
    /// Caller-chosen discriminator for otherwise identical transactions
    pub nonce: u64,
}

/// Faucet payout to `address`, attached to the current tips
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundsRequest {
    pub address: Address,
    pub amount: u64,
}

/// Read-only lookups
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    Transaction(TransactionId),
    Balance(Address),
    Tips,
    /// Newest milestone; answered like a Transaction query
    LatestMilestone,
}

/// A decoded request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Issue(IssueRequest),
    Query(Query),
    Snapshot,
    /// Issue `milestones` milestone transactions, settling after each
    Advance { milestones: u32 },
    RequestFunds(FundsRequest),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Issue(_) => "issue",
            Operation::Query(_) => "query",
            Operation::Snapshot => "snapshot",
            Operation::Advance { .. } => "advance",
            Operation::RequestFunds(_) => "request_funds",
        }
    }
}

/// Status changes caused as a side effect of one call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettlementReport {
    /// Newly confirmed, in promotion order
    pub confirmed: Vec<TransactionId>,
    /// Newly rejected, in rejection order
    pub rejected: Vec<(TransactionId, RejectionReason)>,
}

impl SettlementReport {
    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.rejected.is_empty()
    }

    pub fn merge(&mut self, other: SettlementReport) {
        self.confirmed.extend(other.confirmed);
        self.rejected.extend(other.rejected);
    }
}

/// Result of an accepted Issue or RequestFunds
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueReceipt {
    pub transaction_id: TransactionId,
    /// Status after settlement finished
    pub status: TransactionStatus,
    pub settlement: SettlementReport,
}

/// Result of an Advance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdvanceReceipt {
    pub milestones: Vec<TransactionId>,
    pub settlement: SettlementReport,
}

/// Read model of a single transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionView {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub parents: Vec<TransactionId>,
    pub transfers: Vec<Transfer>,
    pub timestamp: u64,
    pub nonce: u64,
    pub status: TransactionStatus,
    pub rejection: Option<RejectionReason>,
    pub approval_weight: u64,
}

/// Read model of one address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceView {
    pub address: Address,
    /// Balance from confirmed transactions only
    pub confirmed: u64,
    /// Net change from pending transactions
    pub pending_delta: i128,
}

/// Full ledger dump, every collection in deterministic order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub clock: u64,
    pub milestone_count: u64,
    pub genesis: TransactionId,
    /// Sorted by address
    pub balances: Vec<(Address, u64)>,
    /// Insertion order
    pub transactions: Vec<TransactionView>,
    /// Sorted by id
    pub frontier: Vec<TransactionId>,
}

/// Successful result of applying an operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Issued(IssueReceipt),
    Advanced(AdvanceReceipt),
    Transaction(Option<TransactionView>),
    Balance(BalanceView),
    Tips(Vec<TransactionId>),
    Snapshot(LedgerSnapshot),
}
