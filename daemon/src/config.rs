//! Daemon configuration with TOML file support.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use agora_types::{GovernanceParams, TypesError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid TOML: {0}")]
    Parse(String),

    #[error(transparent)]
    Params(#[from] TypesError),
}

/// Base parameter set the `[governance]` overrides are applied to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamsProfile {
    /// Whole-token amounts and a one-hour voting window.
    #[default]
    Dev,
    /// 18-decimal amounts and a one-week voting window.
    Standard,
}

impl ParamsProfile {
    pub fn params(self) -> GovernanceParams {
        match self {
            Self::Dev => GovernanceParams::dev_defaults(),
            Self::Standard => GovernanceParams::standard(),
        }
    }
}

/// Per-field overrides of the profile's parameters.
///
/// TOML integers are signed 64-bit, so amounts set here are limited to
/// `i64::MAX` minor units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsOverrides {
    pub voting_period_secs: Option<u64>,
    pub quorum_pct: Option<u8>,
    pub approval_threshold_pct: Option<u8>,
    pub proposal_threshold: Option<u64>,
    pub unit: Option<u64>,
    pub max_supply: Option<u64>,
    pub settlement_batch_size: Option<usize>,
    pub refund_on_expiry: Option<bool>,
}

impl ParamsOverrides {
    pub fn apply(&self, mut params: GovernanceParams) -> GovernanceParams {
        if let Some(v) = self.voting_period_secs {
            params.voting_period_secs = v;
        }
        if let Some(v) = self.quorum_pct {
            params.quorum_pct = v;
        }
        if let Some(v) = self.approval_threshold_pct {
            params.approval_threshold_pct = v;
        }
        if let Some(v) = self.proposal_threshold {
            params.proposal_threshold = v as u128;
        }
        if let Some(v) = self.unit {
            params.unit = v as u128;
        }
        if let Some(v) = self.max_supply {
            params.max_supply = v as u128;
        }
        if let Some(v) = self.settlement_batch_size {
            params.settlement_batch_size = v;
        }
        if let Some(v) = self.refund_on_expiry {
            params.refund_on_expiry = v;
        }
        params
    }
}

/// Tokens credited to an account before the first command runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAllocation {
    pub account: String,
    pub amount: u64,
}

/// Configuration for the governance daemon.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; every field
/// has a default, so an empty file is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Clock reading (Unix seconds) when replay starts.
    #[serde(default = "default_start_time")]
    pub start_time: u64,

    #[serde(default)]
    pub profile: ParamsProfile,

    #[serde(default)]
    pub governance: ParamsOverrides,

    #[serde(default)]
    pub genesis: Vec<GenesisAllocation>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_start_time() -> u64 {
    1_700_000_000
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The profile with overrides applied, validated.
    pub fn effective_params(&self) -> Result<GovernanceParams, ConfigError> {
        let params = self.governance.apply(self.profile.params());
        params.validate()?;
        Ok(params)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
            start_time: default_start_time(),
            profile: ParamsProfile::default(),
            governance: ParamsOverrides::default(),
            genesis: Vec::new(),
        }
    }
}
