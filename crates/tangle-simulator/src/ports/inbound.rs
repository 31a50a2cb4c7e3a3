//! Inbound ports (driving side)

use crate::domain::errors::SimulatorResult;
use crate::domain::operations::{Operation, Outcome};

/// Primary API of a single simulator session.
///
/// `execute` is the byte-level boundary used by hosts; `apply` is the same
/// pipeline without the codec, for in-process callers and tests.
pub trait TangleSimulatorApi {
    /// Decode one request frame, apply it, and encode the response frame.
    ///
    /// Never fails: every error is reported inside the response envelope.
    fn execute(&mut self, request: &[u8]) -> Vec<u8>;

    /// Apply a decoded operation and settle the ledger.
    ///
    /// ## Errors
    ///
    /// - `Validation`: the operation was refused; the ledger is unchanged
    /// - `Allocation`: the session is out of transaction capacity
    fn apply(&mut self, operation: Operation) -> SimulatorResult<Outcome>;
}
