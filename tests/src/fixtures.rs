//! Shared fixtures: drive a registry handle through encoded frames
//!
//! Every helper goes through `codec::encode_request` and
//! `codec::decode_response`, so flows built on top exercise the full wire
//! path rather than calling `Session` directly.

use primitive_types::H256;
use std::sync::Arc;
use tangle_simulator::codec::{self, payloads::*};
use tangle_simulator::{
    FundsRequest, IssueRequest, Operation, Query, RegistryConfig, SimulatorConfig,
    SimulatorHandle, SimulatorRegistry, Transfer,
};

/// Deterministic test address
pub fn address(seed: u64) -> H256 {
    H256::from_low_u64_be(seed)
}

/// Configuration used by the flows: threshold 3, small enough to reason about
pub fn test_config() -> SimulatorConfig {
    SimulatorConfig {
        confirmation_threshold: 3,
        max_parents: 4,
        ..SimulatorConfig::default()
    }
}

/// One handle on a shared registry
pub struct Harness {
    pub registry: Arc<SimulatorRegistry>,
    pub handle: SimulatorHandle,
    pub genesis: H256,
    pub faucet: H256,
    /// Milestones that always confirm a freshly attached payout
    pub settle_depth: u32,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(simulator: SimulatorConfig) -> Self {
        let settle_depth = simulator.confirmation_threshold as u32;
        let registry = Arc::new(SimulatorRegistry::new(RegistryConfig {
            simulator,
            ..RegistryConfig::default()
        }));
        Self::attach(registry, settle_depth)
    }

    /// Open a new handle on an existing registry.
    pub fn attach(registry: Arc<SimulatorRegistry>, settle_depth: u32) -> Self {
        let handle = registry.create().expect("registry has room for a session");
        let mut harness = Self {
            registry,
            handle,
            genesis: H256::zero(),
            faucet: H256::zero(),
            settle_depth,
        };
        let snapshot = harness.snapshot();
        harness.genesis = H256(snapshot.genesis);
        harness.faucet = H256(snapshot.balances[0].0);
        harness
    }

    /// Send raw bytes and decode whatever comes back.
    pub fn call_raw(&self, request: &[u8]) -> ResponseEnvelope {
        let response = self.registry.execute(self.handle, request);
        let envelope = codec::decode_response(response.as_bytes()).expect("response decodes");
        self.registry
            .release_response_buffer(response)
            .expect("fresh buffer releases");
        envelope
    }

    pub fn call(&self, operation: &Operation) -> ResponseEnvelope {
        let request = codec::encode_request(operation).expect("operation encodes");
        self.call_raw(&request)
    }

    /// Issue a transaction; `Err` carries the error code on rejection.
    pub fn issue(
        &self,
        parents: &[H256],
        transfers: &[(H256, i64)],
        nonce: u64,
    ) -> Result<IssueReceiptPayload, ErrorCode> {
        let operation = Operation::Issue(IssueRequest {
            parents: parents.to_vec(),
            transfers: transfers
                .iter()
                .map(|(address, delta)| Transfer::new(*address, *delta))
                .collect(),
            nonce,
        });
        match self.call(&operation) {
            ResponseEnvelope {
                body: Some(ResponseBody::Issued(receipt)),
                ..
            } => Ok(receipt),
            envelope => Err(error_code(envelope)),
        }
    }

    /// Move `amount` from `from` to `to`, attached to `parents`.
    pub fn spend(
        &self,
        parents: &[H256],
        from: H256,
        to: H256,
        amount: i64,
        nonce: u64,
    ) -> Result<IssueReceiptPayload, ErrorCode> {
        self.issue(parents, &[(from, -amount), (to, amount)], nonce)
    }

    pub fn request_funds(&self, to: H256, amount: u64) -> Result<IssueReceiptPayload, ErrorCode> {
        let operation = Operation::RequestFunds(FundsRequest {
            address: to,
            amount,
        });
        match self.call(&operation) {
            ResponseEnvelope {
                body: Some(ResponseBody::Issued(receipt)),
                ..
            } => Ok(receipt),
            envelope => Err(error_code(envelope)),
        }
    }

    pub fn advance(&self, milestones: u32) -> Result<AdvanceReceiptPayload, ErrorCode> {
        match self.call(&Operation::Advance { milestones }) {
            ResponseEnvelope {
                body: Some(ResponseBody::Advanced(receipt)),
                ..
            } => Ok(receipt),
            envelope => Err(error_code(envelope)),
        }
    }

    pub fn transaction(&self, id: H256) -> Option<TransactionPayload> {
        match self.call(&Operation::Query(Query::Transaction(id))).body {
            Some(ResponseBody::Transaction(tx)) => tx,
            other => panic!("unexpected transaction response: {other:?}"),
        }
    }

    pub fn status(&self, id: H256) -> tangle_simulator::TransactionStatus {
        self.transaction(id).expect("transaction exists").status
    }

    pub fn balance(&self, address: H256) -> BalancePayload {
        match self.call(&Operation::Query(Query::Balance(address))).body {
            Some(ResponseBody::Balance(balance)) => balance,
            other => panic!("unexpected balance response: {other:?}"),
        }
    }

    pub fn snapshot(&self) -> SnapshotPayload {
        match self.call(&Operation::Snapshot).body {
            Some(ResponseBody::Snapshot(snapshot)) => snapshot,
            other => panic!("unexpected snapshot response: {other:?}"),
        }
    }

    /// Fund `to` from the faucet and confirm the payout.
    pub fn funded(&self, to: H256, amount: u64) -> H256 {
        let receipt = self.request_funds(to, amount).expect("faucet pays out");
        self.advance(self.settle_depth).expect("advance succeeds");
        H256(receipt.transaction_id)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = self.registry.destroy(self.handle);
    }
}

fn error_code(envelope: ResponseEnvelope) -> ErrorCode {
    envelope
        .error
        .unwrap_or_else(|| panic!("expected an error, got {:?}", envelope.body))
        .code
}
