//! GateSeal CLI
//!
//! Validates gate seal deployment files and dry-runs a seal against an
//! in-memory host.

use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

pub use commands::{SealableStatus, SimulationReport, ValidationReport};
pub use error::{CliError, CliResult};

/// GateSeal CLI application
#[derive(Parser)]
#[command(name = "gate-seal")]
#[command(about = "GateSeal - one-shot emergency pause gate", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Check a deployment file and print the resulting gate parameters
    Validate {
        /// Deployment file (TOML)
        #[arg(short, long, env = "GATE_SEAL_CONFIG")]
        config: PathBuf,
    },

    /// Deploy against mock sealables and perform a seal
    Simulate {
        /// Deployment file (TOML)
        #[arg(short, long, env = "GATE_SEAL_CONFIG")]
        config: PathBuf,

        /// Identity calling seal (defaults to the committee)
        #[arg(long)]
        caller: Option<String>,

        /// Sealables to seal (defaults to all configured)
        #[arg(long = "seal", num_args = 1..)]
        seal: Vec<String>,

        /// Seconds to advance the clock between deployment and seal
        #[arg(long, default_value_t = 0)]
        advance: u64,
    },
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).without_time())
        .try_init();

    match cli.command {
        Commands::Validate { config } => {
            let report = commands::validate(&config)?;
            commands::print_validation(&report, cli.output)
        }
        Commands::Simulate {
            config,
            caller,
            seal,
            advance,
        } => {
            let report = commands::simulate(&config, caller.as_deref(), &seal, advance)?;
            commands::print_simulation(&report, cli.output)
        }
    }
}
