//! Conflict Resolver
//!
//! Finds double-spends between transactions that do not see each other and
//! keeps exactly one member of every conflict group alive.

use super::ancestry::{approval_weight, branch_balance, cone_balance, past_cone};
use crate::config::SimulatorConfig;
use crate::domain::entities::{LedgerState, Transaction};
use crate::domain::errors::LedgerError;
use crate::domain::value_objects::{Address, RejectionReason, TransactionId};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

/// Two transactions that cannot both be applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    /// Earlier of the pair in insertion order
    pub first: TransactionId,
    pub second: TransactionId,
    /// Lowest address on which the pair overdraws
    pub address: Address,
}

/// Connected component of the conflict graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictGroup {
    /// Members in insertion order
    pub members: Vec<TransactionId>,
}

/// Rejections made by one resolution pass, in the order they happened
pub type Rejections = Vec<(TransactionId, RejectionReason)>;

/// Detect every live conflicting pair in the ledger.
pub fn detect_conflicts(ledger: &LedgerState) -> Vec<Conflict> {
    let all: Vec<TransactionId> = ledger.transactions().map(|tx| tx.id).collect();
    detect_conflicts_among(ledger, &all)
}

/// Detect the live conflicting pairs with at least one member in `dirty`.
///
/// A pair conflicts on `address` when both debit it, neither approves the
/// other, at least one is still Pending, and the funds visible to the union
/// of their past cones cannot cover both debits.
///
/// Each dirty transaction's cone is walked once. Partners come from the
/// ledger's spender index and only contribute the part of their cone that
/// lies outside it, so a pair costs nothing beyond a lookup when one member
/// already sees the other.
pub fn detect_conflicts_among(ledger: &LedgerState, dirty: &[TransactionId]) -> Vec<Conflict> {
    let mut found: BTreeMap<(usize, usize), Conflict> = BTreeMap::new();

    for id in dirty {
        let Some(tx) = ledger.get(id).filter(|tx| !tx.is_rejected()) else {
            continue;
        };
        let debits = tx.debits();
        let Some(index) = ledger.index_of(id).filter(|_| !debits.is_empty()) else {
            continue;
        };
        let cone = past_cone(ledger, &tx.parents);

        for (address, debit) in &debits {
            let visible = cone_balance(ledger, &cone, address);

            for other_id in ledger.spenders(address) {
                if other_id == id || cone.contains(other_id) {
                    continue;
                }
                let Some(other) = ledger.get(other_id).filter(|o| !o.is_rejected()) else {
                    continue;
                };
                let Some(other_index) = ledger.index_of(other_id) else {
                    continue;
                };
                let key = (index.min(other_index), index.max(other_index));
                if (tx.is_confirmed() && other.is_confirmed()) || found.contains_key(&key) {
                    continue;
                }
                let Some(extra) = balance_outside(ledger, &cone, other, id, address) else {
                    continue;
                };

                let available = visible + extra;
                let required = debit.saturating_add(other.delta_for(address).unsigned_abs());
                if available < 0 || (available as u128) < required {
                    let (first, second) = if index < other_index {
                        (*id, *other_id)
                    } else {
                        (*other_id, *id)
                    };
                    found.insert(
                        key,
                        Conflict {
                            first,
                            second,
                            address: *address,
                        },
                    );
                }
            }
        }
    }

    found.into_values().collect()
}

/// Net of `address` over the live part of `other`'s past cone outside `cone`.
///
/// `cone` is closed under parent links, so the walk stops at its boundary.
/// Returns `None` if the walk reaches `ancestor`.
fn balance_outside(
    ledger: &LedgerState,
    cone: &BTreeSet<TransactionId>,
    other: &Transaction,
    ancestor: &TransactionId,
    address: &Address,
) -> Option<i128> {
    let mut seen = HashSet::new();
    let mut stack = other.parents.clone();
    let mut total = 0i128;

    while let Some(id) = stack.pop() {
        if cone.contains(&id) || !seen.insert(id) {
            continue;
        }
        if id == *ancestor {
            return None;
        }
        let Some(tx) = ledger.get(&id) else {
            continue;
        };
        if !tx.is_rejected() {
            total += tx.delta_for(address);
        }
        stack.extend(tx.parents.iter().copied());
    }

    Some(total)
}

/// Live transactions that approve any of `rejected`, in insertion order.
///
/// Only these can see a branch balance change after the rejections.
pub fn affected_by(ledger: &LedgerState, rejected: &[TransactionId]) -> Vec<TransactionId> {
    let mut seen = HashSet::new();
    let mut stack: Vec<TransactionId> = rejected
        .iter()
        .flat_map(|id| ledger.children(id).iter().copied())
        .collect();

    while let Some(id) = stack.pop() {
        if seen.insert(id) {
            stack.extend(ledger.children(&id).iter().copied());
        }
    }

    let mut affected: Vec<TransactionId> = seen
        .into_iter()
        .filter(|id| ledger.get(id).is_some_and(|tx| !tx.is_rejected()))
        .collect();
    affected.sort_by_key(|id| ledger.index_of(id));
    affected
}

/// Group conflicts into connected components, ordered by their earliest member.
pub fn conflict_groups(ledger: &LedgerState, conflicts: &[Conflict]) -> Vec<ConflictGroup> {
    let mut sets = DisjointSets::default();
    for conflict in conflicts {
        sets.union(conflict.first, conflict.second);
    }

    let mut groups: BTreeMap<TransactionId, Vec<TransactionId>> = BTreeMap::new();
    let members: BTreeSet<TransactionId> = conflicts
        .iter()
        .flat_map(|c| [c.first, c.second])
        .collect();
    for id in members {
        let root = sets.find(id);
        groups.entry(root).or_default().push(id);
    }

    let position = |id: &TransactionId| ledger.index_of(id).unwrap_or(usize::MAX);
    let mut groups: Vec<ConflictGroup> = groups
        .into_values()
        .map(|mut members| {
            members.sort_by_key(position);
            ConflictGroup { members }
        })
        .collect();
    groups.sort_by_key(|group| group.members.first().map(position));
    groups
}

/// Pick the surviving member of a group.
///
/// A Confirmed member is already settled and always wins. Otherwise the
/// heaviest member wins, ties going to the lowest id.
pub fn select_winner(
    ledger: &LedgerState,
    config: &SimulatorConfig,
    group: &ConflictGroup,
) -> Option<TransactionId> {
    let live = group
        .members
        .iter()
        .filter(|id| ledger.get(id).is_some_and(|tx| !tx.is_rejected()));

    if let Some(settled) = live
        .clone()
        .find(|id| ledger.get(id).is_some_and(|tx| tx.is_confirmed()))
    {
        return Some(*settled);
    }

    live.map(|id| (approval_weight(ledger, id, config), *id))
        .max_by(|(w1, id1), (w2, id2)| w1.cmp(w2).then_with(|| id2.cmp(id1)))
        .map(|(_, id)| id)
}

/// Resolve the groups formed by `conflicts`, then drop transactions the
/// rejections left without funds.
///
/// Pairs with a member that is no longer live are skipped, so a conflict
/// list may be carried over from an earlier pass.
pub fn resolve(
    ledger: &mut LedgerState,
    config: &SimulatorConfig,
    conflicts: &[Conflict],
) -> Result<Rejections, LedgerError> {
    let live = |id: &TransactionId| ledger.get(id).is_some_and(|tx| !tx.is_rejected());
    let conflicts: Vec<Conflict> = conflicts
        .iter()
        .filter(|c| live(&c.first) && live(&c.second))
        .cloned()
        .collect();
    let mut rejected = Vec::new();

    for group in conflict_groups(ledger, &conflicts) {
        let Some(winner) = select_winner(ledger, config, &group) else {
            continue;
        };
        debug!(?winner, members = group.members.len(), "Resolving conflict group");

        for member in group.members.iter().filter(|id| **id != winner) {
            if !ledger.get(member).is_some_and(|tx| tx.is_pending()) {
                continue;
            }
            let reason = RejectionReason::DoubleSpend { winner };
            ledger.reject(member, reason)?;
            warn!(id = ?member, ?winner, "Rejected double-spend");
            rejected.push((*member, reason));
        }
    }

    if !rejected.is_empty() {
        let losers: Vec<TransactionId> = rejected.iter().map(|(id, _)| *id).collect();
        let affected = affected_by(ledger, &losers);
        rejected.extend(invalidate_overdrawn(ledger, &affected)?);
    }
    Ok(rejected)
}

/// Reject the Pending members of `candidates` whose branch can no longer
/// fund their debits.
///
/// `candidates` must be in insertion order: ancestors then settle before
/// descendants, so one pass catches chains built on a rejected credit.
pub fn invalidate_overdrawn(
    ledger: &mut LedgerState,
    candidates: &[TransactionId],
) -> Result<Rejections, LedgerError> {
    let mut rejected = Vec::new();

    for id in candidates {
        let Some(tx) = ledger.get(id).filter(|tx| tx.is_pending()) else {
            continue;
        };
        let parents = tx.parents.clone();
        let shortfall = tx.debits().into_iter().find(|(address, required)| {
            let available = branch_balance(ledger, &parents, address);
            available < 0 || (available as u128) < *required
        });

        if let Some((address, _)) = shortfall {
            let reason = RejectionReason::InsufficientBalance { address };
            ledger.reject(id, reason)?;
            warn!(?id, ?address, "Rejected overdrawn transaction");
            rejected.push((*id, reason));
        }
    }

    Ok(rejected)
}

/// Ids of transactions that still have a live conflict partner
pub fn contested(conflicts: &[Conflict]) -> HashSet<TransactionId> {
    conflicts
        .iter()
        .flat_map(|c| [c.first, c.second])
        .collect()
}

#[derive(Default)]
struct DisjointSets {
    parent: BTreeMap<TransactionId, TransactionId>,
}

impl DisjointSets {
    fn find(&mut self, id: TransactionId) -> TransactionId {
        let mut root = id;
        while let Some(next) = self.parent.get(&root).copied().filter(|next| *next != root) {
            root = next;
        }
        // Path compression
        let mut current = id;
        while current != root {
            let next = self.parent.get(&current).copied().unwrap_or(root);
            self.parent.insert(current, root);
            current = next;
        }
        root
    }

    fn union(&mut self, a: TransactionId, b: TransactionId) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent.insert(root_b, root_a);
        }
    }
}
