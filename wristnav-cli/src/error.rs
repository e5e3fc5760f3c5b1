//! CLI error types.

use std::fmt;
use std::path::PathBuf;

use wristnav::config::ConfigError;

/// Errors reported to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or missing configuration.
    Config(String),

    /// The config file could not be read or written.
    ConfigFile(ConfigError),

    /// A fixture file could not be read or parsed.
    Fixture { path: PathBuf, message: String },

    /// A command argument is not usable.
    InvalidInput(String),

    /// The Tokio runtime could not be created.
    Runtime(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Fixture { path, message } => {
                write!(f, "Failed to load {}: {}", path.display(), message)
            }
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Runtime(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}
