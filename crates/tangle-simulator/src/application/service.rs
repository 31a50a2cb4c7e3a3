//! Session
//!
//! One isolated ledger plus the pipeline that drives it:
//!
//! 1. Decode the request frame
//! 2. Validate the operation against the ledger
//! 3. Insert the accepted transaction(s)
//! 4. Resolve conflicts and advance confirmations until nothing changes
//! 5. Encode the receipt

use crate::algorithms::ancestry::approval_weight;
use crate::algorithms::conflict_resolver::{self, Conflict};
use crate::algorithms::{confirmation, validator};
use crate::codec::Codec;
use crate::config::SimulatorConfig;
use crate::domain::entities::{LedgerState, Transaction};
use crate::domain::errors::{LedgerError, SimulatorError, SimulatorResult};
use crate::domain::operations::{
    AdvanceReceipt, BalanceView, IssueReceipt, LedgerSnapshot, Operation, Outcome, Query,
    SettlementReport, TransactionView,
};
use crate::domain::value_objects::{Address, RejectionReason, TransactionId};
use crate::ports::inbound::TangleSimulatorApi;
use tracing::{debug, info, warn};

/// A single simulator session.
///
/// Owns its ledger outright; concurrent access goes through the registry.
pub struct Session {
    config: SimulatorConfig,
    ledger: LedgerState,
    codec: Codec,
}

impl Session {
    /// Create a session holding only the genesis transaction.
    pub fn new(config: SimulatorConfig) -> SimulatorResult<Self> {
        config.validate()?;
        let ledger = LedgerState::new(&config);
        let codec = Codec::new(config.max_request_bytes);
        info!(genesis = ?ledger.genesis_id(), "Session created");
        Ok(Self {
            config,
            ledger,
            codec,
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Read access for tests and invariant checks
    pub fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    pub fn transaction(&self, id: &TransactionId) -> Option<TransactionView> {
        self.ledger.get(id).map(|tx| self.view(tx))
    }

    /// Confirmed balance plus the net of Pending transfers
    pub fn balance(&self, address: &Address) -> BalanceView {
        let pending_delta = self
            .ledger
            .transactions()
            .filter(|tx| tx.is_pending())
            .map(|tx| tx.delta_for(address))
            .sum();
        BalanceView {
            address: *address,
            confirmed: self.ledger.balance(address),
            pending_delta,
        }
    }

    /// Frontier in ascending id order
    pub fn tips(&self) -> Vec<TransactionId> {
        self.ledger.frontier().iter().copied().collect()
    }

    /// Newest milestone, or `None` before the first Advance
    pub fn latest_milestone(&self) -> Option<TransactionView> {
        self.ledger
            .latest_milestone()
            .and_then(|id| self.transaction(&id))
    }

    fn query(&self, query: &Query) -> Outcome {
        match query {
            Query::Transaction(id) => Outcome::Transaction(self.transaction(id)),
            Query::Balance(address) => Outcome::Balance(self.balance(address)),
            Query::Tips => Outcome::Tips(self.tips()),
            Query::LatestMilestone => Outcome::Transaction(self.latest_milestone()),
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            clock: self.ledger.clock(),
            milestone_count: self.ledger.milestone_count(),
            genesis: self.ledger.genesis_id(),
            balances: self
                .ledger
                .balances()
                .iter()
                .map(|(address, balance)| (*address, *balance))
                .collect(),
            transactions: self.ledger.transactions().map(|tx| self.view(tx)).collect(),
            frontier: self.tips(),
        }
    }

    fn view(&self, tx: &Transaction) -> TransactionView {
        TransactionView {
            id: tx.id,
            kind: tx.kind,
            parents: tx.parents.clone(),
            transfers: tx.transfers.clone(),
            timestamp: tx.timestamp,
            nonce: tx.nonce,
            status: tx.status(),
            rejection: tx.rejection(),
            approval_weight: approval_weight(&self.ledger, &tx.id, &self.config),
        }
    }

    /// Insert an accepted transaction and settle.
    fn accept(&mut self, tx: Transaction) -> SimulatorResult<IssueReceipt> {
        let id = tx.id;
        self.insert(tx)?;
        let settlement = self.settle(&[id])?;
        let status = self
            .ledger
            .get(&id)
            .map(|tx| tx.status())
            .ok_or(LedgerError::UnknownTransaction(id))?;

        info!(?id, ?status, "Transaction accepted");
        Ok(IssueReceipt {
            transaction_id: id,
            status,
            settlement,
        })
    }

    fn advance_milestones(&mut self, count: u32) -> SimulatorResult<AdvanceReceipt> {
        validator::validate_milestone_count(&self.config, count)?;
        // All or nothing: refuse up front rather than stopping part way
        self.ledger
            .check_capacity(count as usize)
            .map_err(capacity_to_allocation)?;

        let mut milestones = Vec::with_capacity(count as usize);
        let mut settlement = SettlementReport::default();
        for _ in 0..count {
            let milestone = validator::build_milestone(&self.ledger, &self.config);
            let id = milestone.id;
            milestones.push(id);
            self.insert(milestone)?;
            settlement.merge(self.settle(&[id])?);
        }

        info!(
            milestones = milestones.len(),
            confirmed = settlement.confirmed.len(),
            rejected = settlement.rejected.len(),
            "Advanced"
        );
        Ok(AdvanceReceipt {
            milestones,
            settlement,
        })
    }

    fn insert(&mut self, tx: Transaction) -> SimulatorResult<()> {
        self.ledger.insert(tx).map_err(capacity_to_allocation)
    }

    /// Alternate conflict resolution and confirmation until neither changes
    /// anything.
    ///
    /// Between calls the ledger holds no live conflict, so only pairs with a
    /// member in `inserted` can conflict at first. Later pairs can only open
    /// up among the approvers of a rejected transaction, whose branch
    /// balances dropped. Each round detects those once and hands them to
    /// confirmation as contested. Terminates because every round moves at
    /// least one transaction out of Pending.
    fn settle(&mut self, inserted: &[TransactionId]) -> SimulatorResult<SettlementReport> {
        let mut report = SettlementReport::default();
        let mut conflicts = conflict_resolver::detect_conflicts_among(&self.ledger, inserted);

        loop {
            let rejected = conflict_resolver::resolve(&mut self.ledger, &self.config, &conflicts)?;
            conflicts = self.conflicts_after(&rejected);
            let contested = conflict_resolver::contested(&conflicts);
            let promoted = confirmation::advance(&mut self.ledger, &self.config, &contested)?;
            conflicts.extend(self.conflicts_after(&promoted.rejected));

            if rejected.is_empty() && promoted.is_empty() {
                break;
            }
            debug!(
                rejected = rejected.len() + promoted.rejected.len(),
                confirmed = promoted.confirmed.len(),
                open = conflicts.len(),
                "Settlement round"
            );
            report.merge(SettlementReport {
                confirmed: promoted.confirmed,
                rejected: rejected.into_iter().chain(promoted.rejected).collect(),
            });
        }
        Ok(report)
    }

    /// Conflicts among the approvers of freshly rejected transactions
    fn conflicts_after(&self, rejected: &[(TransactionId, RejectionReason)]) -> Vec<Conflict> {
        if rejected.is_empty() {
            return Vec::new();
        }
        let ids: Vec<TransactionId> = rejected.iter().map(|(id, _)| *id).collect();
        let affected = conflict_resolver::affected_by(&self.ledger, &ids);
        conflict_resolver::detect_conflicts_among(&self.ledger, &affected)
    }
}

fn capacity_to_allocation(err: LedgerError) -> SimulatorError {
    match err {
        LedgerError::CapacityExhausted { .. } => SimulatorError::Allocation(err.to_string()),
        other => SimulatorError::Ledger(other),
    }
}

impl TangleSimulatorApi for Session {
    fn execute(&mut self, request: &[u8]) -> Vec<u8> {
        let operation = match self.codec.decode_request(request) {
            Ok(operation) => operation,
            Err(err) => {
                warn!(%err, len = request.len(), "Rejected undecodable request");
                return self.codec.encode_error(&SimulatorError::from(err));
            }
        };

        debug!(operation = operation.name(), "Request decoded");
        let result = self.apply(operation);
        if let Err(err) = &result {
            warn!(%err, "Operation failed");
        }
        self.codec.encode_result(&result)
    }

    fn apply(&mut self, operation: Operation) -> SimulatorResult<Outcome> {
        match operation {
            Operation::Issue(request) => {
                let tx = validator::validate_issue(&self.ledger, &self.config, &request)?;
                self.accept(tx).map(Outcome::Issued)
            }
            Operation::RequestFunds(request) => {
                let tx = validator::validate_funds_request(&self.ledger, &self.config, &request)?;
                self.accept(tx).map(Outcome::Issued)
            }
            Operation::Advance { milestones } => {
                self.advance_milestones(milestones).map(Outcome::Advanced)
            }
            Operation::Query(query) => Ok(self.query(&query)),
            Operation::Snapshot => Ok(Outcome::Snapshot(self.snapshot())),
        }
    }
}
