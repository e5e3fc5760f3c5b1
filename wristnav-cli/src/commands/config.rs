//! Configuration management CLI commands.
//!
//! Provides `config path`, `config list` and `config add-address` for
//! viewing the configuration and maintaining named addresses from the
//! command line.

use std::path::Path;

use clap::Subcommand;
use wristnav::config::BridgeConfig;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// List all configuration settings
    List,

    /// Add or replace a named address
    AddAddress {
        /// Name typed on the watch (matched ignoring case)
        name: String,

        /// Address sent to the routing backend instead
        address: String,
    },
}

/// Run a config subcommand against the file at `path`.
pub fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(path),
        ConfigCommands::List => run_list(path),
        ConfigCommands::AddAddress { name, address } => run_add_address(path, &name, &address),
    }
}

/// Show the configuration file path.
fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    Ok(())
}

/// List all configuration settings.
fn run_list(path: &Path) -> Result<(), CliError> {
    let config = BridgeConfig::load_from(path)?;
    print!("{}", render(&config));
    Ok(())
}

/// Add a named address and save.
fn run_add_address(path: &Path, name: &str, address: &str) -> Result<(), CliError> {
    let name = name.trim();
    let address = address.trim();
    if name.is_empty() || address.is_empty() {
        return Err(CliError::Config(
            "Named addresses need a non-empty name and address.".to_string(),
        ));
    }

    let mut config = BridgeConfig::load_from(path)?;
    let replaced = config.add_named_address(name, address);
    config.save_to(path)?;

    if replaced {
        println!("Updated {} = {}", name, address);
    } else {
        println!("Added {} = {}", name, address);
    }
    Ok(())
}

fn render(config: &BridgeConfig) -> String {
    let mut out = String::new();
    out.push_str("Configuration Settings\n");
    out.push_str("======================\n\n");

    out.push_str("[named_addresses]\n");
    if config.named_addresses.is_empty() {
        out.push_str("  (none)\n");
    }
    for entry in &config.named_addresses {
        out.push_str(&format!("  {} = {}\n", entry.name, entry.address));
    }

    out.push_str("\n[tracking]\n");
    out.push_str(&format!(
        "  enable_high_accuracy = {}\n",
        config.tracking.enable_high_accuracy
    ));
    out.push_str(&format!("  timeout_ms = {}\n", config.tracking.timeout_ms));
    out.push_str(&format!(
        "  maximum_age_ms = {}\n",
        config.tracking.maximum_age_ms
    ));

    out.push_str("\n[logging]\n");
    out.push_str(&format!("  level = {}\n", config.logging.level));
    match &config.logging.directory {
        Some(directory) => out.push_str(&format!("  directory = {}\n", directory.display())),
        None => out.push_str("  directory = (not set)\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_defaults() {
        let text = render(&BridgeConfig::default());
        assert!(text.contains("[named_addresses]\n  (none)\n"));
        assert!(text.contains("  timeout_ms = 5000\n"));
        assert!(text.contains("  directory = (not set)\n"));
    }

    #[test]
    fn test_add_address_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wristnav").join("config.ini");

        run_add_address(&path, "Home", "1 Main St").unwrap();
        run_add_address(&path, "work", " 42 Harbour Road ").unwrap();
        run_add_address(&path, "home", "2 New Road").unwrap();

        let config = BridgeConfig::load_from(&path).unwrap();
        let pairs: Vec<_> = config
            .named_addresses
            .iter()
            .map(|e| (e.name.as_str(), e.address.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Home", "2 New Road"), ("work", "42 Harbour Road")]);
    }

    #[test]
    fn test_add_address_rejects_blank() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        assert!(run_add_address(&path, " ", "1 Main St").is_err());
        assert!(!path.exists());
    }
}
