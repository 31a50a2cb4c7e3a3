//! Graph walks over the DAG
//!
//! Parents always predate their children, so every walk terminates; the
//! visited sets only keep shared ancestors from being expanded twice.

use crate::config::SimulatorConfig;
use crate::domain::entities::LedgerState;
use crate::domain::value_objects::{Address, TransactionId, TransactionKind};
use std::collections::BTreeSet;

/// Every transaction reachable from `roots` through parent links, roots included.
///
/// Rejected transactions are part of the cone; callers filter by status.
pub fn past_cone(ledger: &LedgerState, roots: &[TransactionId]) -> BTreeSet<TransactionId> {
    let mut cone = BTreeSet::new();
    let mut stack: Vec<TransactionId> = roots.to_vec();

    while let Some(id) = stack.pop() {
        if !cone.insert(id) {
            continue;
        }
        if let Some(tx) = ledger.get(&id) {
            stack.extend(tx.parents.iter().filter(|p| !cone.contains(*p)).copied());
        }
    }

    cone
}

/// Every transaction that directly or indirectly approves `id`, excluding `id`.
pub fn future_cone(ledger: &LedgerState, id: &TransactionId) -> BTreeSet<TransactionId> {
    let mut cone = BTreeSet::new();
    let mut stack: Vec<TransactionId> = ledger.children(id).to_vec();

    while let Some(next) = stack.pop() {
        if cone.insert(next) {
            stack.extend(ledger.children(&next).iter().copied());
        }
    }

    cone
}

/// Net of `address` over the non-rejected members of `cone`.
pub fn cone_balance(
    ledger: &LedgerState,
    cone: &BTreeSet<TransactionId>,
    address: &Address,
) -> i128 {
    cone.iter()
        .filter_map(|id| ledger.get(id))
        .filter(|tx| !tx.is_rejected())
        .map(|tx| tx.delta_for(address))
        .sum()
}

/// Balance of `address` as seen by a transaction attaching to `parents`.
pub fn branch_balance(
    ledger: &LedgerState,
    parents: &[TransactionId],
    address: &Address,
) -> i128 {
    cone_balance(ledger, &past_cone(ledger, parents), address)
}

/// Weight a single transaction contributes to the ones it approves.
pub fn own_weight(kind: TransactionKind, config: &SimulatorConfig) -> u64 {
    match kind {
        TransactionKind::Milestone => config.milestone_weight,
        TransactionKind::Genesis | TransactionKind::Value => config.value_weight,
    }
}

/// Own weight plus the weight of every non-rejected approver.
///
/// Rejected approvers contribute nothing but are still walked through, since
/// live transactions may sit above them.
pub fn approval_weight(
    ledger: &LedgerState,
    id: &TransactionId,
    config: &SimulatorConfig,
) -> u64 {
    let Some(tx) = ledger.get(id) else {
        return 0;
    };
    if tx.is_rejected() {
        return 0;
    }

    future_cone(ledger, id)
        .iter()
        .filter_map(|child| ledger.get(child))
        .filter(|child| !child.is_rejected())
        .fold(own_weight(tx.kind, config), |total, child| {
            total.saturating_add(own_weight(child.kind, config))
        })
}
