//! Admission checks for new transactions
//!
//! Every function here is read-only over the ledger: it either returns the
//! Pending transaction to insert or the reason it was refused.

use super::ancestry::{cone_balance, past_cone};
use crate::config::SimulatorConfig;
use crate::domain::entities::{LedgerState, Transaction};
use crate::domain::errors::ValidationError;
use crate::domain::operations::{FundsRequest, IssueRequest};
use crate::domain::value_objects::{TransactionId, TransactionKind, Transfer};
use primitive_types::H256;
use std::collections::HashSet;
use tracing::debug;

/// Validate a caller-issued value transaction.
///
/// Checks run in a fixed order so the same request always fails the same way:
/// parent structure, parent state, transfer shape, then branch funds.
pub fn validate_issue(
    ledger: &LedgerState,
    config: &SimulatorConfig,
    request: &IssueRequest,
) -> Result<Transaction, ValidationError> {
    check_parents(ledger, config, &request.parents)?;
    check_transfers(&request.transfers)?;

    let tx = Transaction::new(
        TransactionKind::Value,
        request.parents.clone(),
        request.transfers.clone(),
        ledger.next_timestamp(),
        request.nonce,
    );
    check_funds(ledger, &tx)?;
    check_unique(ledger, &tx)?;

    debug!(id = ?tx.id, parents = tx.parents.len(), "Issue validated");
    Ok(tx)
}

/// Build and validate a faucet payout attached to the current tips.
pub fn validate_funds_request(
    ledger: &LedgerState,
    config: &SimulatorConfig,
    request: &FundsRequest,
) -> Result<Transaction, ValidationError> {
    let amount = i64::try_from(request.amount)
        .ok()
        .filter(|amount| *amount > 0)
        .ok_or(ValidationError::AmountOutOfRange {
            amount: request.amount,
        })?;

    let faucet = H256::from(config.faucet_address);
    let parents = ledger.tips(config.max_parents);
    let transfers = vec![
        Transfer::new(faucet, -amount),
        Transfer::new(request.address, amount),
    ];

    check_parents(ledger, config, &parents)?;
    check_transfers(&transfers)?;

    let tx = Transaction::new(
        TransactionKind::Value,
        parents,
        transfers,
        ledger.next_timestamp(),
        0,
    );
    check_funds(ledger, &tx)?;
    check_unique(ledger, &tx)?;

    debug!(id = ?tx.id, amount, "Faucet payout validated");
    Ok(tx)
}

/// Reject milestone counts outside `1..=max_milestones_per_request`.
pub fn validate_milestone_count(
    config: &SimulatorConfig,
    requested: u32,
) -> Result<(), ValidationError> {
    if requested == 0 || requested > config.max_milestones_per_request {
        return Err(ValidationError::InvalidMilestoneCount {
            requested,
            max: config.max_milestones_per_request,
        });
    }
    Ok(())
}

/// Zero-value milestone approving up to `max_parents` frontier tips.
///
/// The frontier always holds at least genesis, so the milestone has parents.
pub fn build_milestone(ledger: &LedgerState, config: &SimulatorConfig) -> Transaction {
    Transaction::new(
        TransactionKind::Milestone,
        ledger.tips(config.max_parents),
        Vec::new(),
        ledger.next_timestamp(),
        ledger.milestone_count(),
    )
}

fn check_parents(
    ledger: &LedgerState,
    config: &SimulatorConfig,
    parents: &[TransactionId],
) -> Result<(), ValidationError> {
    if parents.is_empty() {
        return Err(ValidationError::NoParents);
    }
    if parents.len() > config.max_parents {
        return Err(ValidationError::TooManyParents {
            count: parents.len(),
            max: config.max_parents,
        });
    }

    let mut seen = HashSet::with_capacity(parents.len());
    for parent in parents {
        if !seen.insert(*parent) {
            return Err(ValidationError::DuplicateParent(*parent));
        }
    }

    for parent in parents {
        let tx = ledger
            .get(parent)
            .ok_or(ValidationError::UnknownParent(*parent))?;
        if tx.is_rejected() {
            return Err(ValidationError::ParentRejected(*parent));
        }
    }
    Ok(())
}

fn check_transfers(transfers: &[Transfer]) -> Result<(), ValidationError> {
    if let Some(zero) = transfers.iter().find(|t| t.delta == 0) {
        return Err(ValidationError::ZeroDelta {
            address: zero.address,
        });
    }

    let net: i128 = transfers.iter().map(|t| i128::from(t.delta)).sum();
    if net != 0 {
        return Err(ValidationError::Unbalanced { net });
    }
    Ok(())
}

fn check_funds(ledger: &LedgerState, tx: &Transaction) -> Result<(), ValidationError> {
    let debits = tx.debits();
    if debits.is_empty() {
        return Ok(());
    }

    let cone = past_cone(ledger, &tx.parents);
    for (address, required) in debits {
        let available = cone_balance(ledger, &cone, &address);
        if available < 0 || (available as u128) < required {
            return Err(ValidationError::InsufficientBalance {
                address,
                required,
                available,
            });
        }
    }
    Ok(())
}

fn check_unique(ledger: &LedgerState, tx: &Transaction) -> Result<(), ValidationError> {
    if ledger.contains(&tx.id) {
        return Err(ValidationError::DuplicateTransaction(tx.id));
    }
    Ok(())
}
