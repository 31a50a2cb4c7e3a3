//! # Tangle-Sim Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # criterion benchmarks of the execution pipeline
//! └── src/
//!     ├── fixtures.rs   # Harness driving a session through the wire codec
//!     └── integration/  # Cross-component flows
//!         ├── flows.rs      # Registry, handles, threads
//!         ├── randomized.rs # Seeded random scripts checked against invariants
//!         └── scaling.rs    # Settlement cost on ledgers of a few thousand
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p tangle-tests
//!
//! # By category
//! cargo test -p tangle-tests integration::flows
//! cargo test -p tangle-tests integration::randomized
//! cargo test -p tangle-tests --release integration::scaling
//!
//! # Benchmarks
//! cargo bench -p tangle-tests
//! ```

pub mod fixtures;
pub mod integration;
