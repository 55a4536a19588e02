//! Deployment configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::{Address, GateSealParams};

/// Errors loading a deployment file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid deployment config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parameters of one gate seal deployment, as written in a TOML file.
///
/// ```toml
/// sealing_committee = "0x8772e3a2d86b9347a2688f9bc1808a6d8917760c"
/// seal_duration_seconds = 518400
/// expiry_period_seconds = 31536000
/// sealables = ["0x1111111111111111111111111111111111111111"]
/// ```
///
/// Values are checked only when the gate is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSealConfig {
    pub sealing_committee: Address,
    pub seal_duration_seconds: u64,
    pub sealables: Vec<Address>,
    pub expiry_period_seconds: u64,
}

impl GateSealConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_params(&self) -> GateSealParams {
        GateSealParams::new(
            self.sealing_committee,
            self.seal_duration_seconds,
            self.sealables.clone(),
            self.expiry_period_seconds,
        )
    }
}

impl From<GateSealConfig> for GateSealParams {
    fn from(config: GateSealConfig) -> Self {
        GateSealParams::new(
            config.sealing_committee,
            config.seal_duration_seconds,
            config.sealables,
            config.expiry_period_seconds,
        )
    }
}
