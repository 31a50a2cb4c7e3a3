//! Core entities: transactions and the ledger state that owns them

use super::errors::LedgerError;
use super::value_objects::{
    Address, RejectionReason, TransactionId, TransactionKind, TransactionStatus, Transfer,
};
use crate::config::SimulatorConfig;
use indexmap::IndexMap;
use primitive_types::H256;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A vertex of the DAG.
///
/// Contents are fixed at creation; only the status (and rejection reason)
/// changes, and only through [`LedgerState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    /// Approved transactions, in the order the issuer listed them
    pub parents: Vec<TransactionId>,
    pub transfers: Vec<Transfer>,
    /// Logical issuance time assigned by the simulator
    pub timestamp: u64,
    pub nonce: u64,
    status: TransactionStatus,
    rejection: Option<RejectionReason>,
}

impl Transaction {
    /// Create a Pending transaction and derive its id from the contents.
    pub fn new(
        kind: TransactionKind,
        parents: Vec<TransactionId>,
        transfers: Vec<Transfer>,
        timestamp: u64,
        nonce: u64,
    ) -> Self {
        let id = Self::compute_id(kind, &parents, &transfers, timestamp, nonce);
        Self {
            id,
            kind,
            parents,
            transfers,
            timestamp,
            nonce,
            status: TransactionStatus::Pending,
            rejection: None,
        }
    }

    /// The root vertex: no parents, mints `supply` to `faucet`, born Confirmed.
    pub fn genesis(faucet: Address, supply: i64) -> Self {
        let mut tx = Self::new(
            TransactionKind::Genesis,
            Vec::new(),
            vec![Transfer::new(faucet, supply)],
            0,
            0,
        );
        tx.status = TransactionStatus::Confirmed;
        tx
    }

    /// SHA-256 over a canonical little-endian encoding of the contents.
    pub fn compute_id(
        kind: TransactionKind,
        parents: &[TransactionId],
        transfers: &[Transfer],
        timestamp: u64,
        nonce: u64,
    ) -> TransactionId {
        let mut hasher = Sha256::new();
        hasher.update([kind.tag()]);
        hasher.update(timestamp.to_le_bytes());
        hasher.update(nonce.to_le_bytes());
        hasher.update((parents.len() as u64).to_le_bytes());
        for parent in parents {
            hasher.update(parent.as_bytes());
        }
        hasher.update((transfers.len() as u64).to_le_bytes());
        for transfer in transfers {
            hasher.update(transfer.address.as_bytes());
            hasher.update(transfer.delta.to_le_bytes());
        }
        H256::from_slice(&hasher.finalize())
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn rejection(&self) -> Option<RejectionReason> {
        self.rejection
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == TransactionStatus::Confirmed
    }

    pub fn is_rejected(&self) -> bool {
        self.status == TransactionStatus::Rejected
    }

    pub fn is_genesis(&self) -> bool {
        self.kind == TransactionKind::Genesis
    }

    /// Net change per address, merging repeated addresses.
    pub fn net_deltas(&self) -> BTreeMap<Address, i128> {
        let mut net = BTreeMap::new();
        for transfer in &self.transfers {
            *net.entry(transfer.address).or_insert(0i128) += i128::from(transfer.delta);
        }
        net
    }

    /// Net debit per address (addresses whose net change is negative).
    pub fn debits(&self) -> BTreeMap<Address, u128> {
        self.net_deltas()
            .into_iter()
            .filter(|(_, delta)| *delta < 0)
            .map(|(address, delta)| (address, delta.unsigned_abs()))
            .collect()
    }

    /// Net change this transaction makes to `address`.
    pub fn delta_for(&self, address: &Address) -> i128 {
        self.transfers
            .iter()
            .filter(|t| &t.address == address)
            .map(|t| i128::from(t.delta))
            .sum()
    }
}

/// Authoritative data model of one session.
///
/// Transactions live in an insertion-ordered arena keyed by id; parent and
/// child links are id references only.
#[derive(Debug, Clone)]
pub struct LedgerState {
    transactions: IndexMap<TransactionId, Transaction>,
    children: HashMap<TransactionId, Vec<TransactionId>>,
    balances: BTreeMap<Address, u64>,
    frontier: BTreeSet<TransactionId>,
    /// Debiting transactions per address, in insertion order
    spenders: HashMap<Address, Vec<TransactionId>>,
    genesis: TransactionId,
    latest_milestone: Option<TransactionId>,
    clock: u64,
    milestone_count: u64,
    max_transactions: usize,
}

impl LedgerState {
    /// Fresh ledger holding only the genesis transaction.
    ///
    /// `config` must have passed [`SimulatorConfig::validate`]; an oversized
    /// supply is clamped to `i64::MAX`.
    pub fn new(config: &SimulatorConfig) -> Self {
        let faucet = H256::from(config.faucet_address);
        let supply = i64::try_from(config.genesis_supply).unwrap_or(i64::MAX);
        let genesis = Transaction::genesis(faucet, supply);
        let genesis_id = genesis.id;

        let mut balances = BTreeMap::new();
        balances.insert(faucet, supply.unsigned_abs());

        let mut transactions = IndexMap::new();
        transactions.insert(genesis_id, genesis);

        let mut frontier = BTreeSet::new();
        frontier.insert(genesis_id);

        Self {
            transactions,
            children: HashMap::new(),
            balances,
            frontier,
            spenders: HashMap::new(),
            genesis: genesis_id,
            latest_milestone: None,
            clock: 0,
            milestone_count: 0,
            max_transactions: config.max_transactions,
        }
    }

    pub fn genesis_id(&self) -> TransactionId {
        self.genesis
    }

    pub fn get(&self, id: &TransactionId) -> Option<&Transaction> {
        self.transactions.get(id)
    }

    pub fn contains(&self, id: &TransactionId) -> bool {
        self.transactions.contains_key(id)
    }

    /// Position in insertion order
    pub fn index_of(&self, id: &TransactionId) -> Option<usize> {
        self.transactions.get_index_of(id)
    }

    /// All transactions in insertion order
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Direct approvers of `id`, in insertion order
    pub fn children(&self, id: &TransactionId) -> &[TransactionId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Transactions with a net debit on `address`, in insertion order
    pub fn spenders(&self, address: &Address) -> &[TransactionId] {
        self.spenders.get(address).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn frontier(&self) -> &BTreeSet<TransactionId> {
        &self.frontier
    }

    /// Up to `max` frontier ids in ascending order.
    pub fn tips(&self, max: usize) -> Vec<TransactionId> {
        self.frontier.iter().take(max).copied().collect()
    }

    /// Confirmed balance of `address`
    pub fn balance(&self, address: &Address) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn balances(&self) -> &BTreeMap<Address, u64> {
        &self.balances
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Timestamp the next inserted transaction must carry
    pub fn next_timestamp(&self) -> u64 {
        self.clock + 1
    }

    pub fn milestone_count(&self) -> u64 {
        self.milestone_count
    }

    /// Most recently issued milestone, if any
    pub fn latest_milestone(&self) -> Option<TransactionId> {
        self.latest_milestone
    }

    /// Free slots before the ledger refuses new transactions
    pub fn remaining_capacity(&self) -> usize {
        self.max_transactions.saturating_sub(self.transactions.len())
    }

    pub fn check_capacity(&self, additional: usize) -> Result<(), LedgerError> {
        if additional > self.remaining_capacity() {
            return Err(LedgerError::CapacityExhausted {
                max: self.max_transactions,
            });
        }
        Ok(())
    }

    /// Append an accepted Pending transaction.
    ///
    /// Parents leave the frontier and the new transaction joins it.
    pub fn insert(&mut self, tx: Transaction) -> Result<(), LedgerError> {
        self.check_capacity(1)?;
        for parent in &tx.parents {
            if !self.transactions.contains_key(parent) {
                return Err(LedgerError::UnknownTransaction(*parent));
            }
        }

        let id = tx.id;
        for parent in &tx.parents {
            self.children.entry(*parent).or_default().push(id);
            self.frontier.remove(parent);
        }
        self.frontier.insert(id);
        for address in tx.debits().into_keys() {
            self.spenders.entry(address).or_default().push(id);
        }
        self.clock = self.clock.max(tx.timestamp);
        if tx.kind == TransactionKind::Milestone {
            self.milestone_count += 1;
            self.latest_milestone = Some(id);
        }
        self.transactions.insert(id, tx);
        Ok(())
    }

    /// Promote a Pending transaction and apply its transfers exactly once.
    ///
    /// Fails without side effects if any confirmed balance would go negative.
    pub fn confirm(&mut self, id: &TransactionId) -> Result<(), LedgerError> {
        let tx = self
            .transactions
            .get(id)
            .ok_or(LedgerError::UnknownTransaction(*id))?;
        Self::check_transition(tx, TransactionStatus::Confirmed)?;

        let mut updated = Vec::new();
        for (address, delta) in tx.net_deltas() {
            let current = i128::from(self.balance(&address));
            let next = u64::try_from(current + delta)
                .map_err(|_| LedgerError::BalanceUnderflow { address })?;
            updated.push((address, next));
        }

        self.balances.extend(updated);
        if let Some(tx) = self.transactions.get_mut(id) {
            tx.status = TransactionStatus::Confirmed;
        }
        Ok(())
    }

    /// Reject a Pending transaction. Its balances were never applied.
    ///
    /// Parents left without live approvers return to the frontier.
    pub fn reject(
        &mut self,
        id: &TransactionId,
        reason: RejectionReason,
    ) -> Result<(), LedgerError> {
        let tx = self
            .transactions
            .get_mut(id)
            .ok_or(LedgerError::UnknownTransaction(*id))?;
        Self::check_transition(tx, TransactionStatus::Rejected)?;
        tx.status = TransactionStatus::Rejected;
        tx.rejection = Some(reason);
        let parents = tx.parents.clone();

        self.frontier.remove(id);
        for parent in parents {
            if self.is_tip(&parent) {
                self.frontier.insert(parent);
            }
        }
        Ok(())
    }

    /// Live transaction with no live approver
    fn is_tip(&self, id: &TransactionId) -> bool {
        let live = self.transactions.get(id).is_some_and(|tx| !tx.is_rejected());
        live && self
            .children(id)
            .iter()
            .all(|child| self.transactions.get(child).map_or(true, Transaction::is_rejected))
    }

    fn check_transition(tx: &Transaction, to: TransactionStatus) -> Result<(), LedgerError> {
        if !tx.status.can_transition_to(to) {
            return Err(LedgerError::InvalidTransition {
                id: tx.id,
                from: tx.status,
                to,
            });
        }
        Ok(())
    }
}
