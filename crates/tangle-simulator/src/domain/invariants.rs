//! Domain invariants for the ledger
//!
//! Each check recomputes its property from scratch so tests can assert it
//! after any sequence of operations.

use super::entities::LedgerState;
use super::value_objects::{Address, TransactionId};
use std::collections::{BTreeMap, BTreeSet};

/// Parents exist, were inserted earlier, and carry earlier timestamps.
pub fn invariant_parents_precede(ledger: &LedgerState) -> bool {
    ledger.transactions().enumerate().all(|(index, tx)| {
        tx.parents.iter().all(|parent| {
            let parent_index = ledger.index_of(parent);
            let parent_time = ledger.get(parent).map(|p| p.timestamp);
            matches!(parent_index, Some(i) if i < index)
                && matches!(parent_time, Some(t) if t < tx.timestamp)
        })
    })
}

/// Stored balances equal the net of all Confirmed transfers.
pub fn invariant_balances_reflect_confirmed(ledger: &LedgerState) -> bool {
    let Some(expected) = confirmed_balances(ledger) else {
        return false;
    };
    let stored: BTreeMap<Address, i128> = ledger
        .balances()
        .iter()
        .filter(|(_, balance)| **balance != 0)
        .map(|(address, balance)| (*address, i128::from(*balance)))
        .collect();
    stored == expected
}

/// Total confirmed balance equals the genesis supply.
pub fn invariant_conservation(ledger: &LedgerState) -> bool {
    let supply: i128 = ledger
        .get(&ledger.genesis_id())
        .map(|genesis| genesis.transfers.iter().map(|t| i128::from(t.delta)).sum())
        .unwrap_or(0);
    let total: i128 = ledger.balances().values().map(|b| i128::from(*b)).sum();
    total == supply
}

/// Confirmed transactions never approve a Pending transaction.
///
/// A parent may have been rejected after its child attached; the child can
/// still confirm as long as it spends nothing the parent credited.
pub fn invariant_confirmed_ancestry(ledger: &LedgerState) -> bool {
    ledger
        .transactions()
        .filter(|tx| tx.is_confirmed())
        .all(|tx| {
            tx.parents
                .iter()
                .all(|parent| ledger.get(parent).is_some_and(|p| !p.is_pending()))
        })
}

/// No combination of Confirmed transactions overdraws an address.
pub fn invariant_confirmed_solvent(ledger: &LedgerState) -> bool {
    confirmed_balances(ledger).is_some_and(|balances| balances.values().all(|b| *b >= 0))
}

/// The frontier is exactly the live transactions without live approvers.
pub fn invariant_frontier_sound(ledger: &LedgerState) -> bool {
    let expected: BTreeSet<TransactionId> = ledger
        .transactions()
        .filter(|tx| !tx.is_rejected())
        .filter(|tx| {
            ledger
                .children(&tx.id)
                .iter()
                .all(|child| ledger.get(child).map_or(true, |c| c.is_rejected()))
        })
        .map(|tx| tx.id)
        .collect();
    &expected == ledger.frontier()
}

/// Run every check
pub fn check_all(ledger: &LedgerState) -> bool {
    invariant_parents_precede(ledger)
        && invariant_balances_reflect_confirmed(ledger)
        && invariant_conservation(ledger)
        && invariant_confirmed_ancestry(ledger)
        && invariant_confirmed_solvent(ledger)
        && invariant_frontier_sound(ledger)
}

fn confirmed_balances(ledger: &LedgerState) -> Option<BTreeMap<Address, i128>> {
    let mut balances: BTreeMap<Address, i128> = BTreeMap::new();
    for tx in ledger.transactions().filter(|tx| tx.is_confirmed()) {
        for (address, delta) in tx.net_deltas() {
            let entry = balances.entry(address).or_insert(0);
            *entry = entry.checked_add(delta)?;
        }
    }
    balances.retain(|_, balance| *balance != 0);
    Some(balances)
}
