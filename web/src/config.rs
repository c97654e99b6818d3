//! Page configuration with TOML file support.

use agora_types::Address;
use agora_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("invalid contract address {0:?}")]
    InvalidAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Configuration for the voting page.
///
/// Can be loaded from a TOML file via [`WebConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// JSON-RPC endpoint of the wallet provider / node.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Deployed proposal contract. Sessions cannot be established without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,

    /// Interface descriptor (JSON ABI or build artifact).
    #[serde(default = "default_abi_path")]
    pub abi_path: PathBuf,

    /// Whether a wallet provider is offered to the page at all.
    #[serde(default = "default_true")]
    pub enable_wallet: bool,

    /// Interval between transaction receipt polls.
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,

    /// Interval between authorized-account polls.
    #[serde(default = "default_account_poll_ms")]
    pub account_poll_ms: u64,

    /// Timeout for a single JSON-RPC round-trip.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_abi_path() -> PathBuf {
    PathBuf::from("abi.json")
}

fn default_true() -> bool {
    true
}

fn default_receipt_poll_ms() -> u64 {
    1000
}

fn default_account_poll_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WebConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("receipt_poll_ms", self.receipt_poll_ms),
            ("account_poll_ms", self.account_poll_ms),
            ("request_timeout_secs", self.request_timeout_secs),
        ];
        match intervals.into_iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(ConfigError::ZeroInterval(field)),
            None => Ok(()),
        }
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The configured contract address, if any.
    pub fn contract_address(&self) -> Result<Option<Address>, ConfigError> {
        match self.contract_address.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidAddress(raw.to_string())),
        }
    }

    pub fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }

    pub fn account_poll(&self) -> Duration {
        Duration::from_millis(self.account_poll_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            rpc_url: default_rpc_url(),
            contract_address: None,
            abi_path: default_abi_path(),
            enable_wallet: default_true(),
            receipt_poll_ms: default_receipt_poll_ms(),
            account_poll_ms: default_account_poll_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
