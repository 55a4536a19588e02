//! Validate and simulate commands

use std::path::Path;
use std::sync::Arc;

use gate_seal::{
    Address, Clock, GateSeal, GateSealConfig, GateSealError, GateSealFactory, GateSealParams,
    InMemoryDirectory, ManualClock, MockSealable, SealReceipt, Sealable, SystemClock, Timestamp,
};
use serde::Serialize;
use tracing::info;

use crate::error::CliResult;
use crate::OutputFormat;

/// Result of `validate`
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub params: GateSealParams,
    pub created_at: Timestamp,
    pub expiry_timestamp: Timestamp,
}

/// Paused state of one mock sealable after a simulation
#[derive(Debug, Serialize)]
pub struct SealableStatus {
    pub address: Address,
    pub paused: bool,
    pub pause_calls: usize,
}

/// Result of `simulate`
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub gate_seal: Address,
    pub caller: Address,
    pub subset: Vec<Address>,
    pub receipt: Option<SealReceipt>,
    pub rejection: Option<String>,
    pub expired: bool,
    pub sealables: Vec<SealableStatus>,
    #[serde(skip)]
    pub error: Option<GateSealError>,
}

fn parse_addresses(raw: &[String]) -> CliResult<Vec<Address>> {
    Ok(raw
        .iter()
        .map(|s| s.parse::<Address>())
        .collect::<Result<Vec<_>, _>>()?)
}

/// Load a deployment file and check it the way the gate would.
pub fn validate(config_path: &Path) -> CliResult<ValidationReport> {
    let params = GateSealConfig::load(config_path)?.to_params();
    GateSeal::validate(&params).map_err(GateSealError::from)?;

    let created_at = SystemClock.now();
    let expiry_timestamp = created_at.saturating_add(params.expiry_period_seconds);
    info!(config = %config_path.display(), "Deployment config is valid");
    Ok(ValidationReport {
        params,
        created_at,
        expiry_timestamp,
    })
}

/// Deploy against mock sealables, optionally let time pass, then seal.
///
/// A rejected seal is part of the report, not an early return.
pub fn simulate(
    config_path: &Path,
    caller: Option<&str>,
    seal: &[String],
    advance: u64,
) -> CliResult<SimulationReport> {
    let params = GateSealConfig::load(config_path)?.to_params();

    let clock = Arc::new(ManualClock::new(SystemClock.now()));
    let directory = Arc::new(InMemoryDirectory::new());
    let mocks: Vec<(Address, Arc<MockSealable>)> = params
        .sealables
        .iter()
        .map(|address| {
            let mock = Arc::new(MockSealable::new(clock.clone()));
            directory.register(*address, mock.clone());
            (*address, mock)
        })
        .collect();

    let factory = GateSealFactory::new(
        Address::derive(b"gate-seal-cli/simulation"),
        clock.clone(),
        directory,
    );
    let committee = params.sealing_committee;
    let gate = factory.create(params)?;

    let caller = match caller {
        Some(raw) => raw.parse::<Address>()?,
        None => committee,
    };
    let subset = if seal.is_empty() {
        gate.sealables().to_vec()
    } else {
        parse_addresses(seal)?
    };

    clock.advance(advance);
    let outcome = gate.seal(caller, &subset);

    let sealables = mocks
        .iter()
        .map(|(address, mock)| SealableStatus {
            address: *address,
            paused: mock.is_paused(),
            pause_calls: mock.pause_calls(),
        })
        .collect();

    let (receipt, error) = match outcome {
        Ok(receipt) => (Some(receipt), None),
        Err(e) => (None, Some(e)),
    };

    Ok(SimulationReport {
        gate_seal: gate.id(),
        caller,
        subset,
        receipt,
        rejection: error.as_ref().map(|e| e.to_string()),
        expired: gate.is_expired(),
        sealables,
        error,
    })
}

pub fn print_validation(report: &ValidationReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            println!("sealing committee: {}", report.params.sealing_committee);
            println!("seal duration:     {}s", report.params.seal_duration_seconds);
            println!("expiry period:     {}s", report.params.expiry_period_seconds);
            println!("sealables:");
            for sealable in &report.params.sealables {
                println!("  {sealable}");
            }
            println!("if deployed now, expires at {}", report.expiry_timestamp);
        }
    }
    Ok(())
}

/// Print the report; a rejected seal becomes the command's error.
pub fn print_simulation(report: &SimulationReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            println!("gate seal: {}", report.gate_seal);
            println!("caller:    {}", report.caller);
            match (&report.receipt, &report.rejection) {
                (Some(receipt), _) => println!(
                    "sealed {} sealable(s) at {}",
                    receipt.events.len(),
                    receipt.sealed_at
                ),
                (None, Some(reason)) => println!("seal rejected: {reason}"),
                (None, None) => {}
            }
            println!("expired:   {}", report.expired);
            for status in &report.sealables {
                let state = if status.paused { "paused" } else { "active" };
                println!("  {} {}", status.address, state);
            }
        }
    }
    match &report.error {
        Some(err) => Err(err.clone().into()),
        None => Ok(()),
    }
}
