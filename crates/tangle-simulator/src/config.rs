//! Configuration for the Tangle Simulator
//!
//! Defaults are tuned for test harnesses; every field can be overridden from
//! the environment with a `TANGLE_SIM_` prefixed variable.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Per-session simulator configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Approval weight a transaction needs before it can be confirmed
    pub confirmation_threshold: u64,
    /// Maximum parents a single transaction may reference
    pub max_parents: usize,
    /// Maximum transactions a session may hold (genesis included)
    pub max_transactions: usize,
    /// Maximum size of a single request frame
    pub max_request_bytes: usize,
    /// Maximum milestones issued by one Advance request
    pub max_milestones_per_request: u32,
    /// Supply minted to the faucet address by genesis
    pub genesis_supply: u64,
    /// Address funded by genesis and debited by RequestFunds
    pub faucet_address: [u8; 32],
    /// Weight contributed by each value transaction
    pub value_weight: u64,
    /// Weight contributed by each milestone
    pub milestone_weight: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            confirmation_threshold: 3,
            max_parents: 8,
            max_transactions: 100_000,
            max_request_bytes: 1024 * 1024,
            max_milestones_per_request: 64,
            genesis_supply: 1_000_000_000,
            faucet_address: [0xFF; 32],
            value_weight: 1,
            milestone_weight: 1,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("confirmation_threshold must be at least 1")]
    ZeroThreshold,

    #[error("max_parents must be at least 1")]
    ZeroMaxParents,

    #[error("max_transactions must leave room beyond genesis")]
    NoTransactionCapacity,

    #[error("genesis_supply exceeds the signed delta range")]
    SupplyTooLarge,
}

impl SimulatorConfig {
    /// Load defaults and apply `TANGLE_SIM_*` environment overrides.
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        override_from_env("TANGLE_SIM_CONFIRMATION_THRESHOLD", &mut config.confirmation_threshold);
        override_from_env("TANGLE_SIM_MAX_PARENTS", &mut config.max_parents);
        override_from_env("TANGLE_SIM_MAX_TRANSACTIONS", &mut config.max_transactions);
        override_from_env("TANGLE_SIM_MAX_REQUEST_BYTES", &mut config.max_request_bytes);
        override_from_env(
            "TANGLE_SIM_MAX_MILESTONES_PER_REQUEST",
            &mut config.max_milestones_per_request,
        );
        override_from_env("TANGLE_SIM_GENESIS_SUPPLY", &mut config.genesis_supply);
        override_from_env("TANGLE_SIM_VALUE_WEIGHT", &mut config.value_weight);
        override_from_env("TANGLE_SIM_MILESTONE_WEIGHT", &mut config.milestone_weight);

        if let Ok(address_hex) = std::env::var("TANGLE_SIM_FAUCET_ADDRESS") {
            match hex::decode(address_hex.trim_start_matches("0x")) {
                Ok(bytes) if bytes.len() == 32 => {
                    config.faucet_address.copy_from_slice(&bytes);
                    info!("Loaded faucet address from environment");
                }
                _ => warn!("TANGLE_SIM_FAUCET_ADDRESS must be 32 bytes (64 hex chars)"),
            }
        }

        config
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.confirmation_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.max_parents == 0 {
            return Err(ConfigError::ZeroMaxParents);
        }
        if self.max_transactions < 2 {
            return Err(ConfigError::NoTransactionCapacity);
        }
        if i64::try_from(self.genesis_supply).is_err() {
            return Err(ConfigError::SupplyTooLarge);
        }
        Ok(())
    }
}

/// Handle registry configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Maximum live sessions before `create` reports allocation exhaustion
    pub max_sessions: usize,
    /// Configuration applied to every new session
    pub simulator: SimulatorConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1024,
            simulator: SimulatorConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Load defaults and apply `TANGLE_SIM_*` environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self {
            max_sessions: RegistryConfig::default().max_sessions,
            simulator: SimulatorConfig::from_env(),
        };
        override_from_env("TANGLE_SIM_MAX_SESSIONS", &mut config.max_sessions);
        config
    }
}

fn override_from_env<T: std::str::FromStr>(key: &str, target: &mut T) {
    let Ok(raw) = std::env::var(key) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *target = value,
        Err(_) => warn!(key, value = %raw, "Ignoring unparsable configuration override"),
    }
}
