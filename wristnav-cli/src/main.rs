//! Wristnav CLI - Command-line interface
//!
//! Drives the wristnav bridge against file-backed collaborators so route
//! transfers and live step updates can be exercised without a watch.

mod commands;
mod error;
mod fixture;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use wristnav::config::config_file_path;

use commands::config::ConfigCommands;
use commands::search::SearchArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "wristnav", version, about = "Route transfer bridge for navigation watches")]
struct Cli {
    /// Use this config file instead of ~/.wristnav/config.ini
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG and WRISTNAV_LOG still take precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one search and print every message sent to the watch
    Search {
        /// SEARCH value: route type digit followed by the address, e.g. "1Brockhofweg 9"
        input: String,

        /// JSON route fixture answering the lookup
        #[arg(long, value_name = "FILE")]
        route: PathBuf,

        /// JSON array of position samples to replay while tracking
        #[arg(long, value_name = "FILE")]
        positions: Option<PathBuf>,

        /// Delay between replayed samples in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Print messages as JSON field dictionaries
        #[arg(long)]
        json: bool,
    },

    /// Unpack a SUCCESS value into status code and request number
    DecodeStatus {
        /// Value of the SUCCESS field
        value: u64,
    },

    /// View or edit the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Search {
            input,
            route,
            positions,
            interval_ms,
            json,
        } => {
            let runner = CliRunner::new(cli.config.as_deref(), cli.verbose)?;
            commands::search::run(
                &runner,
                SearchArgs {
                    input,
                    route,
                    positions,
                    interval_ms,
                    json,
                },
            )
        }
        Commands::DecodeStatus { value } => commands::decode::run(value),
        Commands::Config { command } => {
            let path = cli.config.unwrap_or_else(config_file_path);
            commands::config::run(command, &path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_with_global_flags() {
        let cli = Cli::try_parse_from([
            "wristnav",
            "search",
            "1Brockhofweg 9",
            "--route",
            "route.json",
            "--config",
            "/tmp/config.ini",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.ini")));
        match cli.command {
            Commands::Search {
                input,
                route,
                positions,
                interval_ms,
                json,
            } => {
                assert_eq!(input, "1Brockhofweg 9");
                assert_eq!(route, PathBuf::from("route.json"));
                assert!(positions.is_none());
                assert_eq!(interval_ms, 500);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_add_address() {
        let cli =
            Cli::try_parse_from(["wristnav", "config", "add-address", "Home", "1 Main St"]).unwrap();
        match cli.command {
            Commands::Config {
                command: ConfigCommands::AddAddress { name, address },
            } => {
                assert_eq!(name, "Home");
                assert_eq!(address, "1 Main St");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_decode_status_requires_number() {
        assert!(Cli::try_parse_from(["wristnav", "decode-status", "abc"]).is_err());
    }
}
