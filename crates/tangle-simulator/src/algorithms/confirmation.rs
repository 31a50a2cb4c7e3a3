//! Confirmation Engine
//!
//! Promotes Pending transactions whose approval weight has reached the
//! configured threshold.

use super::ancestry::approval_weight;
use crate::config::SimulatorConfig;
use crate::domain::entities::LedgerState;
use crate::domain::errors::LedgerError;
use crate::domain::value_objects::{RejectionReason, TransactionId};
use std::collections::HashSet;
use tracing::{info, warn};

/// Status changes made by one confirmation pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfirmationReport {
    /// Promoted, in insertion order
    pub confirmed: Vec<TransactionId>,
    /// Would have overdrawn a confirmed balance
    pub rejected: Vec<(TransactionId, RejectionReason)>,
}

impl ConfirmationReport {
    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.rejected.is_empty()
    }
}

/// Run one confirmation pass.
///
/// A Pending transaction is promoted when it is not in `contested`, none of
/// its parents is still Pending, and its approval weight is at least
/// `confirmation_threshold`. Visiting in insertion order lets a parent and
/// its child both settle in the same pass.
pub fn advance(
    ledger: &mut LedgerState,
    config: &SimulatorConfig,
    contested: &HashSet<TransactionId>,
) -> Result<ConfirmationReport, LedgerError> {
    let pending: Vec<TransactionId> = ledger
        .transactions()
        .filter(|tx| tx.is_pending())
        .map(|tx| tx.id)
        .collect();
    let mut report = ConfirmationReport::default();

    for id in pending {
        if contested.contains(&id) {
            continue;
        }
        let Some(tx) = ledger.get(&id) else {
            continue;
        };
        let parents_settled = tx
            .parents
            .iter()
            .all(|parent| ledger.get(parent).is_some_and(|p| !p.is_pending()));
        if !parents_settled {
            continue;
        }

        let weight = approval_weight(ledger, &id, config);
        if weight < config.confirmation_threshold {
            continue;
        }

        match ledger.confirm(&id) {
            Ok(()) => {
                info!(?id, weight, "Transaction confirmed");
                report.confirmed.push(id);
            }
            Err(LedgerError::BalanceUnderflow { address }) => {
                let reason = RejectionReason::InsufficientBalance { address };
                ledger.reject(&id, reason)?;
                warn!(?id, ?address, "Confirmation would overdraw balance, rejected");
                report.rejected.push((id, reason));
            }
            Err(err) => return Err(err),
        }
    }

    Ok(report)
}
