//! CLI error types

use gate_seal::{AddressError, ConfigError, GateSealError};
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Deployment file could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Gate construction or seal rejected
    #[error("GateSeal error: {0}")]
    Gate(#[from] GateSealError),

    /// Malformed address on the command line
    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
