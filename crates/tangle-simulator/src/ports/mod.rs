//! # Ports Layer
//!
//! Defines the port traits for the Tangle Simulator.
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving ports (API exposed to hosts and test harnesses)
//! - `outbound.rs` - Driven ports (wire serialization used by the codec)

pub mod inbound;
pub mod outbound;
