//! Bridge configuration.
//!
//! Settings live in an INI file at `~/.wristnav/config.ini`:
//!
//! ```ini
//! [named_addresses]
//! Home = 1 Main St
//! Work = 42 Harbour Road
//!
//! [tracking]
//! enable_high_accuracy = true
//! timeout_ms = 5000
//! maximum_age_ms = 0
//!
//! [logging]
//! level = info
//! directory = /var/log/wristnav
//! ```
//!
//! A missing file yields the defaults. Named addresses keep file order, which
//! is the order searches are matched against them.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::request::{NamedAddress, NamedAddressProvider};
use crate::tracker::WatchOptions;

/// Directory name under the home directory.
pub const CONFIG_DIR_NAME: &str = ".wristnav";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const SECTION_NAMED_ADDRESSES: &str = "named_addresses";
const SECTION_TRACKING: &str = "tracking";
const SECTION_LOGGING: &str = "logging";

/// Errors loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid INI.
    #[error("Failed to parse config file: {0}")]
    Parse(String),

    /// A key holds a value of the wrong type.
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

/// Get the configuration directory (`~/.wristnav`).
///
/// Falls back to the current directory when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Get the default configuration file path.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// `[tracking]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSettings {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        let options = WatchOptions::default();
        Self {
            enable_high_accuracy: options.enable_high_accuracy,
            timeout_ms: options.timeout.as_millis() as u64,
            maximum_age_ms: options.maximum_age.as_millis() as u64,
        }
    }
}

impl TrackingSettings {
    /// Options to pass when subscribing to positions.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            enable_high_accuracy: self.enable_high_accuracy,
            timeout: Duration::from_millis(self.timeout_ms),
            maximum_age: Duration::from_millis(self.maximum_age_ms),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Filter directive used when no log environment variable is set.
    pub level: String,
    /// Write a daily log file here in addition to stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
        }
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Aliases substituted for search text, in match order.
    pub named_addresses: Vec<NamedAddress>,
    pub tracking: TrackingSettings,
    pub logging: LoggingSettings,
}

impl BridgeConfig {
    /// Load from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, returning defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(io) => ConfigError::Io(io),
            ini::Error::Parse(parse) => ConfigError::Parse(parse.to_string()),
        })?;

        let config = Self::from_ini(&ini)?;
        debug!(
            path = %path.display(),
            named_addresses = config.named_addresses.len(),
            "Loaded config"
        );
        Ok(config)
    }

    /// Parse from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    /// Save to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.to_ini().write_to_file(path)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Add a named address, replacing one with the same name (ignoring case).
    ///
    /// Returns `true` if an existing entry was replaced.
    pub fn add_named_address(&mut self, name: &str, address: &str) -> bool {
        let existing = self
            .named_addresses
            .iter_mut()
            .find(|entry| entry.name.to_lowercase() == name.to_lowercase());

        match existing {
            Some(entry) => {
                entry.address = address.to_string();
                true
            }
            None => {
                self.named_addresses.push(NamedAddress::new(name, address));
                false
            }
        }
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some(SECTION_NAMED_ADDRESSES)) {
            config.named_addresses = section
                .iter()
                .map(|(name, address)| NamedAddress::new(name, address))
                .collect();
        }

        if let Some(section) = ini.section(Some(SECTION_TRACKING)) {
            if let Some(v) = section.get("enable_high_accuracy") {
                config.tracking.enable_high_accuracy =
                    parse_bool(v).ok_or_else(|| invalid("tracking.enable_high_accuracy", v))?;
            }
            if let Some(v) = section.get("timeout_ms") {
                config.tracking.timeout_ms = parse_number(v, "tracking.timeout_ms")?;
            }
            if let Some(v) = section.get("maximum_age_ms") {
                config.tracking.maximum_age_ms = parse_number(v, "tracking.maximum_age_ms")?;
            }
        }

        if let Some(section) = ini.section(Some(SECTION_LOGGING)) {
            if let Some(v) = section.get("level") {
                let v = v.trim();
                if v.is_empty() {
                    return Err(invalid("logging.level", v));
                }
                config.logging.level = v.to_string();
            }
            if let Some(v) = section.get("directory") {
                let v = v.trim();
                config.logging.directory = (!v.is_empty()).then(|| PathBuf::from(v));
            }
        }

        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        for entry in &self.named_addresses {
            ini.with_section(Some(SECTION_NAMED_ADDRESSES))
                .set(entry.name.as_str(), entry.address.as_str());
        }

        ini.with_section(Some(SECTION_TRACKING))
            .set(
                "enable_high_accuracy",
                self.tracking.enable_high_accuracy.to_string(),
            )
            .set("timeout_ms", self.tracking.timeout_ms.to_string())
            .set("maximum_age_ms", self.tracking.maximum_age_ms.to_string());

        ini.with_section(Some(SECTION_LOGGING))
            .set("level", self.logging.level.as_str());
        if let Some(directory) = &self.logging.directory {
            ini.with_section(Some(SECTION_LOGGING))
                .set("directory", directory.to_string_lossy());
        }

        ini
    }
}

impl NamedAddressProvider for BridgeConfig {
    fn named_addresses(&self) -> Vec<NamedAddress> {
        self.named_addresses.clone()
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_number<T: FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}
