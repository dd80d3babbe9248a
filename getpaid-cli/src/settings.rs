//! CLI settings: config file plus flag and environment overrides.
//!
//! Resolution order for each setting is flag (or its `GETPAID_*` variable),
//! then the config file, then the client default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use getpaid_http::ClientConfig;
use tracing::{debug, info};

use crate::Cli;

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.json";

/// Returns the default config directory (`<config dir>/getpaid`).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("getpaid")
}

/// Returns the default config file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join(CONFIG_FILE)
}

/// Returns the config file the CLI should use.
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config_file.clone().unwrap_or_else(default_config_path)
}

/// Loads a client configuration; a missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<ClientConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(ClientConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;

    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Writes a client configuration as pretty JSON, creating parent directories.
pub fn save_to(config: &ClientConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), "Saved configuration");
    Ok(())
}

/// Flag-level overrides on top of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Base URL.
    pub base_url: Option<String>,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Retries after the first attempt.
    pub retries: Option<u32>,
    /// Backoff base delay in milliseconds.
    pub retry_delay_ms: Option<u64>,
}

impl Overrides {
    /// Collects the overrides given on the command line.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            base_url: cli.base_url.clone(),
            timeout_ms: cli.timeout,
            retries: cli.retries,
            retry_delay_ms: cli.retry_delay,
        }
    }

    /// Applies the overrides to a loaded configuration.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(ms) = self.retry_delay_ms {
            config.retry_delay = Duration::from_millis(ms);
        }
        config
    }
}

/// Loads the effective client configuration for this invocation.
pub fn resolve(cli: &Cli) -> Result<ClientConfig> {
    let file = load_from(&config_path(cli))?;
    Ok(Overrides::from_cli(cli).apply(file))
}

// ============================================================================
// Tests
// ============================================================================
