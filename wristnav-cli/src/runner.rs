//! Shared setup for commands that talk to the bridge.

use std::path::{Path, PathBuf};

use tracing::info;
use wristnav::config::{config_file_path, BridgeConfig};
use wristnav::logging::{self, WorkerGuard};

use crate::error::CliError;

/// Loads configuration, installs logging and owns the Tokio runtime.
pub struct CliRunner {
    config: BridgeConfig,
    config_path: PathBuf,
    runtime: tokio::runtime::Runtime,
    // Flushes the log file on drop
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Set up from an optional config path override.
    pub fn new(config_path: Option<&Path>, verbose: bool) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = BridgeConfig::load_from(&config_path)?;

        let mut log_settings = config.logging.clone();
        if verbose {
            log_settings.level = "debug".to_string();
        }
        let log_guard = logging::init(&log_settings);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(e.to_string()))?;

        Ok(Self {
            config,
            config_path,
            runtime,
            _log_guard: log_guard,
        })
    }

    /// Log which command is starting and with which config.
    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = wristnav::VERSION,
            config = %self.config_path.display(),
            named_addresses = self.config.named_addresses.len(),
            "wristnav starting"
        );
    }

    /// Loaded configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Runtime for async commands.
    pub fn runtime(&self) -> &tokio::runtime::Runtime {
        &self.runtime
    }
}
