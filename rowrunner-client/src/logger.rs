//! Logging Infrastructure
//!
//! Console output through `tracing-subscriber`, plus an optional
//! daily-rolling file under the configured log directory.

use crate::config::ClientConfig;
use std::fs;
use std::path::Path;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// File name prefix of the rolling log files
pub const LOG_FILE_PREFIX: &str = "rowrunner";

/// Initialize the logger (console, `info`)
pub fn init_logger() -> anyhow::Result<()> {
    init_logger_with_file("info", false, None)
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` overrides `level` when set. Fails if a global subscriber is
/// already installed.
///
/// # Examples
/// ```no_run
/// // Development setup (console only)
/// rowrunner_client::logger::init_logger_with_file("debug", false, None)?;
///
/// // Console + daily file
/// rowrunner_client::logger::init_logger_with_file("info", true, Some("./logs".as_ref()))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if json_format {
        layers.push(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .boxed(),
        );
    }

    if let Some(dir) = log_dir {
        fs::create_dir_all(dir)?;
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(std::sync::Mutex::new(appender))
                .boxed(),
        );
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;
    Ok(())
}

/// Initialize from the client configuration
pub fn init_from_config(config: &ClientConfig) -> anyhow::Result<()> {
    init_logger_with_file(
        &config.log_level,
        false,
        config.log_dir.as_deref().map(Path::new),
    )
}
