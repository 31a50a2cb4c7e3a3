//! Replay script format
//!
//! ```json
//! {
//!   "config": { "confirmation_threshold": 3, ... },
//!   "steps": [
//!     { "op": "request_funds", "address": "<64 hex>", "amount": 100 },
//!     { "op": "issue", "parents": ["@0"], "transfers": [...] },
//!     { "op": "advance", "milestones": 2 }
//!   ]
//! }
//! ```
//!
//! Transaction references are `genesis`, `@N` (the transaction issued by
//! step N) or 64 hex characters. Addresses are `faucet` or 64 hex characters.

use anyhow::{anyhow, bail, Context, Result};
use primitive_types::H256;
use serde::Deserialize;
use tangle_simulator::{
    codec, FundsRequest, IssueRequest, Operation, Query, SimulatorConfig, Transfer,
};

#[derive(Debug, Deserialize)]
pub struct Script {
    /// Replaces the environment-derived configuration when present
    #[serde(default)]
    pub config: Option<SimulatorConfig>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct TransferStep {
    pub address: String,
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Issue {
        parents: Vec<String>,
        transfers: Vec<TransferStep>,
        #[serde(default)]
        nonce: u64,
    },
    RequestFunds {
        address: String,
        amount: u64,
    },
    Advance {
        milestones: u32,
    },
    Transaction {
        id: String,
    },
    Balance {
        address: String,
    },
    Tips,
    LatestMilestone,
    Snapshot,
    /// Send bytes verbatim, for exercising decode errors
    Raw {
        hex: String,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Issue { .. } => "issue",
            Step::RequestFunds { .. } => "request_funds",
            Step::Advance { .. } => "advance",
            Step::Transaction { .. } => "transaction",
            Step::Balance { .. } => "balance",
            Step::Tips => "tips",
            Step::LatestMilestone => "latest_milestone",
            Step::Snapshot => "snapshot",
            Step::Raw { .. } => "raw",
        }
    }
}

/// Names the script can refer to
pub struct References {
    pub genesis: H256,
    pub faucet: H256,
    /// Transaction issued by each step so far, if any
    pub issued: Vec<Option<H256>>,
}

impl References {
    pub fn new(genesis: H256, faucet: H256) -> Self {
        Self {
            genesis,
            faucet,
            issued: Vec::new(),
        }
    }

    fn transaction(&self, reference: &str) -> Result<H256> {
        if reference == "genesis" {
            return Ok(self.genesis);
        }
        if let Some(step) = reference.strip_prefix('@') {
            let index: usize = step
                .parse()
                .with_context(|| format!("bad step reference {reference:?}"))?;
            return self
                .issued
                .get(index)
                .copied()
                .flatten()
                .ok_or_else(|| anyhow!("step {index} did not issue a transaction"));
        }
        parse_h256(reference)
    }

    fn address(&self, reference: &str) -> Result<H256> {
        if reference == "faucet" {
            return Ok(self.faucet);
        }
        parse_h256(reference)
    }

    /// Encode a step as a request frame.
    pub fn encode(&self, step: &Step) -> Result<Vec<u8>> {
        let operation = match step {
            Step::Raw { hex } => {
                return hex::decode(hex.trim_start_matches("0x")).context("raw step is not hex")
            }
            Step::Issue {
                parents,
                transfers,
                nonce,
            } => Operation::Issue(IssueRequest {
                parents: parents
                    .iter()
                    .map(|p| self.transaction(p))
                    .collect::<Result<_>>()?,
                transfers: transfers
                    .iter()
                    .map(|t| Ok(Transfer::new(self.address(&t.address)?, t.delta)))
                    .collect::<Result<_>>()?,
                nonce: *nonce,
            }),
            Step::RequestFunds { address, amount } => Operation::RequestFunds(FundsRequest {
                address: self.address(address)?,
                amount: *amount,
            }),
            Step::Advance { milestones } => Operation::Advance {
                milestones: *milestones,
            },
            Step::Transaction { id } => {
                Operation::Query(Query::Transaction(self.transaction(id)?))
            }
            Step::Balance { address } => {
                Operation::Query(Query::Balance(self.address(address)?))
            }
            Step::Tips => Operation::Query(Query::Tips),
            Step::LatestMilestone => Operation::Query(Query::LatestMilestone),
            Step::Snapshot => Operation::Snapshot,
        };
        Ok(codec::encode_request(&operation)?)
    }
}

fn parse_h256(text: &str) -> Result<H256> {
    let bytes = hex::decode(text.trim_start_matches("0x"))
        .with_context(|| format!("{text:?} is not hex"))?;
    if bytes.len() != 32 {
        bail!("{text:?} must be 32 bytes, got {}", bytes.len());
    }
    Ok(H256::from_slice(&bytes))
}
