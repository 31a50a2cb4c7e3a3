//! Conversions between domain types and wire payloads

use super::payloads::*;
use crate::domain::errors::{DecodeError, LedgerError, SimulatorError, ValidationError};
use crate::domain::operations::{
    AdvanceReceipt, BalanceView, FundsRequest, IssueReceipt, IssueRequest, LedgerSnapshot,
    Outcome, Query, SettlementReport, TransactionView,
};
use crate::domain::value_objects::{RejectionReason, Transfer};
use primitive_types::H256;

fn ids(ids: &[H256]) -> Vec<[u8; 32]> {
    ids.iter().map(|id| id.0).collect()
}

impl From<&Transfer> for TransferPayload {
    fn from(transfer: &Transfer) -> Self {
        Self {
            address: transfer.address.0,
            delta: transfer.delta,
        }
    }
}

impl From<&TransferPayload> for Transfer {
    fn from(payload: &TransferPayload) -> Self {
        Transfer::new(H256(payload.address), payload.delta)
    }
}

impl From<&IssueRequest> for IssuePayload {
    fn from(request: &IssueRequest) -> Self {
        Self {
            parents: ids(&request.parents),
            transfers: request.transfers.iter().map(Into::into).collect(),
            nonce: request.nonce,
        }
    }
}

impl From<IssuePayload> for IssueRequest {
    fn from(payload: IssuePayload) -> Self {
        Self {
            parents: payload.parents.into_iter().map(H256).collect(),
            transfers: payload.transfers.iter().map(Into::into).collect(),
            nonce: payload.nonce,
        }
    }
}

impl From<&Query> for QueryPayload {
    fn from(query: &Query) -> Self {
        match query {
            Query::Transaction(id) => QueryPayload::Transaction(id.0),
            Query::Balance(address) => QueryPayload::Balance(address.0),
            Query::Tips => QueryPayload::Tips,
            Query::LatestMilestone => QueryPayload::LatestMilestone,
        }
    }
}

impl From<QueryPayload> for Query {
    fn from(payload: QueryPayload) -> Self {
        match payload {
            QueryPayload::Transaction(id) => Query::Transaction(H256(id)),
            QueryPayload::Balance(address) => Query::Balance(H256(address)),
            QueryPayload::Tips => Query::Tips,
            QueryPayload::LatestMilestone => Query::LatestMilestone,
        }
    }
}

impl From<&FundsRequest> for FundsPayload {
    fn from(request: &FundsRequest) -> Self {
        Self {
            address: request.address.0,
            amount: request.amount,
        }
    }
}

impl From<FundsPayload> for FundsRequest {
    fn from(payload: FundsPayload) -> Self {
        Self {
            address: H256(payload.address),
            amount: payload.amount,
        }
    }
}

impl From<RejectionReason> for RejectionPayload {
    fn from(reason: RejectionReason) -> Self {
        match reason {
            RejectionReason::DoubleSpend { winner } => {
                RejectionPayload::DoubleSpend { winner: winner.0 }
            }
            RejectionReason::InsufficientBalance { address } => {
                RejectionPayload::InsufficientBalance { address: address.0 }
            }
        }
    }
}

impl From<RejectionPayload> for RejectionReason {
    fn from(payload: RejectionPayload) -> Self {
        match payload {
            RejectionPayload::DoubleSpend { winner } => RejectionReason::DoubleSpend {
                winner: H256(winner),
            },
            RejectionPayload::InsufficientBalance { address } => {
                RejectionReason::InsufficientBalance { address: H256(address) }
            }
        }
    }
}

impl From<&SettlementReport> for SettlementPayload {
    fn from(report: &SettlementReport) -> Self {
        Self {
            confirmed: ids(&report.confirmed),
            rejected: report
                .rejected
                .iter()
                .map(|(id, reason)| (id.0, (*reason).into()))
                .collect(),
        }
    }
}

impl From<&TransactionView> for TransactionPayload {
    fn from(view: &TransactionView) -> Self {
        Self {
            id: view.id.0,
            kind: view.kind,
            parents: ids(&view.parents),
            transfers: view.transfers.iter().map(Into::into).collect(),
            timestamp: view.timestamp,
            nonce: view.nonce,
            status: view.status,
            rejection: view.rejection.map(Into::into),
            approval_weight: view.approval_weight,
        }
    }
}

impl From<&BalanceView> for BalancePayload {
    fn from(view: &BalanceView) -> Self {
        Self {
            address: view.address.0,
            confirmed: view.confirmed,
            pending_delta: view.pending_delta,
        }
    }
}

impl From<&LedgerSnapshot> for SnapshotPayload {
    fn from(snapshot: &LedgerSnapshot) -> Self {
        Self {
            clock: snapshot.clock,
            milestone_count: snapshot.milestone_count,
            genesis: snapshot.genesis.0,
            balances: snapshot
                .balances
                .iter()
                .map(|(address, balance)| (address.0, *balance))
                .collect(),
            transactions: snapshot.transactions.iter().map(Into::into).collect(),
            frontier: ids(&snapshot.frontier),
        }
    }
}

impl From<&IssueReceipt> for IssueReceiptPayload {
    fn from(receipt: &IssueReceipt) -> Self {
        Self {
            transaction_id: receipt.transaction_id.0,
            status: receipt.status,
            settlement: (&receipt.settlement).into(),
        }
    }
}

impl From<&AdvanceReceipt> for AdvanceReceiptPayload {
    fn from(receipt: &AdvanceReceipt) -> Self {
        Self {
            milestones: ids(&receipt.milestones),
            settlement: (&receipt.settlement).into(),
        }
    }
}

impl From<&Outcome> for ResponseBody {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Issued(receipt) => ResponseBody::Issued(receipt.into()),
            Outcome::Advanced(receipt) => ResponseBody::Advanced(receipt.into()),
            Outcome::Transaction(view) => ResponseBody::Transaction(view.as_ref().map(Into::into)),
            Outcome::Balance(view) => ResponseBody::Balance(view.into()),
            Outcome::Tips(tips) => ResponseBody::Tips(ids(tips)),
            Outcome::Snapshot(snapshot) => ResponseBody::Snapshot(snapshot.into()),
        }
    }
}

impl From<&SimulatorError> for ErrorReport {
    fn from(err: &SimulatorError) -> Self {
        let (category, code) = classify(err);
        Self {
            category,
            code,
            message: err.to_string(),
        }
    }
}

fn classify(err: &SimulatorError) -> (ErrorCategory, ErrorCode) {
    match err {
        SimulatorError::Decode(decode) => (ErrorCategory::Decode, decode_code(decode)),
        SimulatorError::Validation(validation) => {
            (ErrorCategory::Validation, validation_code(validation))
        }
        SimulatorError::Ledger(LedgerError::CapacityExhausted { .. }) => {
            (ErrorCategory::Allocation, ErrorCode::CapacityExhausted)
        }
        SimulatorError::Ledger(ledger) => (ErrorCategory::Internal, ledger_code(ledger)),
        SimulatorError::InvalidHandle(_) => (ErrorCategory::Lifecycle, ErrorCode::InvalidHandle),
        SimulatorError::UnknownBuffer(_) => (ErrorCategory::Lifecycle, ErrorCode::UnknownBuffer),
        SimulatorError::Config(_) => (ErrorCategory::Lifecycle, ErrorCode::InvalidConfig),
        SimulatorError::Allocation(_) => (ErrorCategory::Allocation, ErrorCode::AllocationFailed),
        SimulatorError::Serialization(_) => (ErrorCategory::Internal, ErrorCode::Serialization),
    }
}

fn decode_code(err: &DecodeError) -> ErrorCode {
    match err {
        DecodeError::TruncatedPayload { .. } => ErrorCode::TruncatedPayload,
        DecodeError::UnsupportedVersion { .. } => ErrorCode::UnsupportedVersion,
        DecodeError::UnknownOperationTag(_) => ErrorCode::UnknownOperationTag,
        DecodeError::MalformedLength { .. } => ErrorCode::MalformedLength,
        DecodeError::RequestTooLarge { .. } => ErrorCode::RequestTooLarge,
        DecodeError::MalformedPayload(_) => ErrorCode::MalformedPayload,
    }
}

fn validation_code(err: &ValidationError) -> ErrorCode {
    match err {
        ValidationError::NoParents => ErrorCode::NoParents,
        ValidationError::TooManyParents { .. } => ErrorCode::TooManyParents,
        ValidationError::DuplicateParent(_) => ErrorCode::DuplicateParent,
        ValidationError::UnknownParent(_) => ErrorCode::UnknownParent,
        ValidationError::ParentRejected(_) => ErrorCode::ParentRejected,
        ValidationError::ZeroDelta { .. } => ErrorCode::ZeroDelta,
        ValidationError::Unbalanced { .. } => ErrorCode::Unbalanced,
        ValidationError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
        ValidationError::DuplicateTransaction(_) => ErrorCode::DuplicateTransaction,
        ValidationError::AmountOutOfRange { .. } => ErrorCode::AmountOutOfRange,
        ValidationError::InvalidMilestoneCount { .. } => ErrorCode::InvalidMilestoneCount,
    }
}

fn ledger_code(err: &LedgerError) -> ErrorCode {
    match err {
        LedgerError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
        LedgerError::UnknownTransaction(_) => ErrorCode::UnknownTransaction,
        LedgerError::CapacityExhausted { .. } => ErrorCode::CapacityExhausted,
        LedgerError::BalanceUnderflow { .. } => ErrorCode::BalanceUnderflow,
    }
}
