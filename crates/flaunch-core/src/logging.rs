//! Logging configuration using tracing
//!
//! All output goes to a rolling file, never to stdout/stderr: in `--machine`
//! mode stdout belongs to the protocol stream and must stay clean.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Initialize the logging subsystem
///
/// Logs are written to the platform data directory under `flaunch/logs/`.
/// Log level is controlled by the `FLAUNCH_LOG` environment variable.
///
/// # Examples
/// ```bash
/// FLAUNCH_LOG=debug flaunch
/// FLAUNCH_LOG=trace flaunch
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "flaunch.log");

    // Default to info, allow override via FLAUNCH_LOG
    let env_filter =
        EnvFilter::try_from_env("FLAUNCH_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("flaunch starting, log directory: {}", log_dir.display());

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("flaunch").join("logs")
}
