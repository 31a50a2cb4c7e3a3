//! Algorithms module for the Tangle Simulator
//!
//! Contains:
//! - Ancestry walks (past/future cones, branch balances, approval weight)
//! - Validator for issued transactions, faucet payouts and milestones
//! - Conflict resolver
//! - Confirmation engine

pub mod ancestry;
pub mod confirmation;
pub mod conflict_resolver;
pub mod validator;

pub use ancestry::{approval_weight, branch_balance, past_cone};
pub use confirmation::{advance, ConfirmationReport};
pub use conflict_resolver::{
    affected_by, contested, detect_conflicts, detect_conflicts_among, resolve, Conflict,
    ConflictGroup,
};
pub use validator::{build_milestone, validate_funds_request, validate_issue};
