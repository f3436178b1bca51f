/*!
 * Logging and tracing initialization
 */

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::SplitConfig;
use crate::error::{Result, SplitError};

/// Timestamp layout of every log line
pub const LOG_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Initialize structured logging based on configuration.
///
/// Log lines go to stdout unless disabled. When the configuration resolves a log
/// file, the same events are appended to it through a single mutex-guarded
/// writer so lines from concurrent workers never interleave.
pub fn init_logging(config: &SplitConfig) -> Result<()> {
    let log_level = effective_level(config);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("switchboard={}", log_level)))
        .map_err(|e| SplitError::Config(format!("Failed to create log filter: {}", e)))?;

    let stdout_layer = config.log_to_stdout.then(|| {
        fmt::layer()
            .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_span_events(FmtSpan::NONE)
            .compact()
    });

    let file_layer = match config.effective_log_file() {
        Some(path) => {
            let file = open_append(&path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
                    .with_target(false)
                    .with_thread_names(true)
                    .with_ansi(false), // No ANSI colors in file
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| SplitError::Config(format!("Failed to install log subscriber: {}", e)))?;

    Ok(())
}

/// `verbose` forces debug regardless of the configured level
fn effective_level(config: &SplitConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

/// Open the log file in append mode, creating parent directories
fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            SplitError::Config(format!(
                "Failed to create log directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SplitError::Config(format!("Failed to open log file: {}", e)))
}

/// Initialize logging with custom format for testing
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("switchboard=debug"));

        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok(); // Ignore error if already initialized
    });
}
