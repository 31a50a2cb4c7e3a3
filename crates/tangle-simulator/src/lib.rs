//! # Tangle Simulator
//!
//! Deterministic, in-memory execution engine for an IOTA-style DAG ledger.
//! Callers create an isolated session, feed it serialized requests and get
//! serialized receipts back, without running a network.
//!
//! ## Architecture
//!
//! - **Domain**: Core entities (Transaction, LedgerState), value objects, errors, invariants
//! - **Algorithms**: Validation, conflict resolution, confirmation (approval weight)
//! - **Codec**: Versioned request/response frames and their payloads
//! - **Ports**: Inbound (TangleSimulatorApi) and Outbound (WireSerializer)
//! - **Adapters**: bincode wire serializer
//! - **Application**: Session pipeline and the handle registry
//!
//! ## Pipeline
//!
//! ```text
//! request bytes ──decode──→ Operation ──validate──→ Transaction (Pending)
//!                                                        │
//!                              ┌─────────────────────────┘
//!                              ↓
//!                    resolve conflicts ⇄ advance confirmations
//!                              │         (until fixpoint)
//!                              ↓
//!                    receipt ──encode──→ response bytes
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use tangle_simulator::{codec, Operation, SimulatorRegistry};
//!
//! let registry = SimulatorRegistry::default();
//! let handle = registry.create()?;
//! let request = codec::encode_request(&Operation::Snapshot)?;
//! let response = registry.execute(handle, &request);
//! let envelope = codec::decode_response(response.as_bytes())?;
//! registry.release_response_buffer(response)?;
//! registry.destroy(handle)?;
//! ```

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod codec;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::registry::{ResponseBuffer, SimulatorHandle, SimulatorRegistry};
pub use application::service::Session;
pub use config::{RegistryConfig, SimulatorConfig};
pub use domain::entities::*;
pub use domain::errors::{DecodeError, LedgerError, SimulatorError, ValidationError};
pub use domain::operations::*;
pub use domain::value_objects::*;
pub use ports::inbound::TangleSimulatorApi;
pub use ports::outbound::WireSerializer;
