//! Tracing subscriber setup.
//!
//! Logs go to stderr and, when a directory is configured, to a daily rolling
//! file. The filter is chosen in this order:
//!
//! 1. `RUST_LOG`
//! 2. `WRISTNAV_LOG`
//! 3. `[logging] level` from the config file
//! 4. `info`
//!
//! Unparseable or empty directives fall through to the next source.

use std::env;

pub use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LoggingSettings, DEFAULT_LOG_LEVEL};

/// Application log filter variable.
pub const LOG_ENV_VAR: &str = "WRISTNAV_LOG";

/// Prefix of the daily log files.
pub const LOG_FILE_PREFIX: &str = "wristnav.log";

/// Install the global subscriber.
///
/// Returns the guard of the file writer, if one was set up. Dropping it
/// flushes and closes the file, so hold it until exit. Calling `init` again
/// after a subscriber is installed has no effect.
pub fn init(settings: &LoggingSettings) -> Option<WorkerGuard> {
    let filter = filter_from_sources([
        env::var(EnvFilter::DEFAULT_ENV).ok(),
        env::var(LOG_ENV_VAR).ok(),
        Some(settings.level.clone()),
    ]);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::rfc_3339())
        .with_target(true);

    let mut file_error = None;
    let (file_layer, guard) = match &settings.directory {
        Some(directory) => match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .build(directory)
        {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_timer(LocalTime::rfc_3339());
                (Some(layer), Some(guard))
            }
            Err(e) => {
                file_error = Some(e.to_string());
                (None, None)
            }
        },
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if let (Some(directory), Some(error)) = (&settings.directory, file_error) {
        tracing::warn!(
            directory = %directory.display(),
            error = %error,
            "Log file unavailable, logging to stderr only"
        );
    }

    guard
}

/// Pick the first usable directive, falling back to `info`.
fn filter_from_sources<const N: usize>(sources: [Option<String>; N]) -> EnvFilter {
    sources
        .into_iter()
        .flatten()
        .filter(|directive| !directive.trim().is_empty())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}
