//! tangle-sim: replay a JSON script against a fresh simulator session
//!
//! Every step is encoded into a request frame, executed through the handle
//! registry and the decoded response is printed, so the output doubles as a
//! trace of the wire protocol.

mod render;
mod script;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use primitive_types::H256;
use tangle_simulator::codec::{self, payloads::ResponseBody};
use tangle_simulator::{Operation, RegistryConfig, SimulatorConfig, SimulatorRegistry};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use script::{References, Script};

/// Replay a JSON script against the Tangle Simulator
#[derive(Parser, Debug)]
#[command(name = "tangle-sim")]
#[command(about = "Replay JSON scripts against an in-memory Tangle simulator")]
struct Args {
    /// Path to the script file
    script: PathBuf,

    /// Print each response as raw hex after the decoded form
    #[arg(long)]
    hex: bool,

    /// Stop at the first step that returns an error
    #[arg(long)]
    fail_fast: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading {}", args.script.display()))?;
    let script: Script = serde_json::from_str(&text).context("parsing script")?;

    let simulator = script.config.clone().unwrap_or_else(SimulatorConfig::from_env);
    let faucet = H256(simulator.faucet_address);
    let registry = SimulatorRegistry::new(RegistryConfig {
        simulator,
        ..RegistryConfig::from_env()
    });
    let handle = registry.create()?;
    info!(%handle, steps = script.steps.len(), "Replaying script");

    let genesis = genesis(&registry, handle)?;
    let mut refs = References::new(genesis, faucet);

    for (index, step) in script.steps.iter().enumerate() {
        let request = refs
            .encode(step)
            .with_context(|| format!("step {index} ({})", step.name()))?;
        debug!(index, len = request.len(), "Executing step");

        let response = registry.execute(handle, &request);
        let envelope = codec::decode_response(response.as_bytes())?;
        println!("[{index}] {} -> {}", step.name(), render::render(&envelope));
        if args.hex {
            println!("    {}", hex::encode(response.as_bytes()));
        }
        registry.release_response_buffer(response)?;

        let issued = match &envelope.body {
            Some(ResponseBody::Issued(receipt)) => Some(H256(receipt.transaction_id)),
            _ => None,
        };
        refs.issued.push(issued);

        if args.fail_fast && !envelope.success {
            bail!("step {index} failed");
        }
    }

    registry.destroy(handle)?;
    Ok(())
}

fn genesis(
    registry: &SimulatorRegistry,
    handle: tangle_simulator::SimulatorHandle,
) -> Result<H256> {
    let request = codec::encode_request(&Operation::Snapshot)?;
    let response = registry.execute(handle, &request);
    let envelope = codec::decode_response(response.as_bytes())?;
    registry.release_response_buffer(response)?;
    match envelope.body {
        Some(ResponseBody::Snapshot(snapshot)) => Ok(H256(snapshot.genesis)),
        _ => bail!("snapshot did not return a ledger"),
    }
}
