use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::get_log_dir;

const DEFAULT_FILTER: &str = "componentry=info";
const VERBOSE_FILTER: &str = "componentry=debug";

/// Initialize logging for the componentry CLI
///
/// Logs are written to:
/// - XDG_DATA_HOME/componentry/logs/ on Unix (typically ~/.local/share/componentry/logs/)
/// - ~/Library/Application Support/componentry/logs/ on macOS
/// - {FOLDERID_LocalAppData}/componentry/logs/ on Windows
///
/// Log files are rotated daily with the pattern: componentry.log.YYYY-MM-DD
///
/// The terminal only shows warnings and errors unless `verbose` is set. The
/// file log level can be controlled via the RUST_LOG environment variable:
/// - RUST_LOG=componentry=debug componentry add button
pub fn init(verbose: bool) -> Result<()> {
    let file_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    });
    let stderr_filter = EnvFilter::new(if verbose {
        VERBOSE_FILTER
    } else {
        "componentry=warn"
    });

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true) // ANSI colors for terminal
        .with_target(false)
        .compact()
        .with_filter(stderr_filter);

    // A missing or unwritable data directory only disables the file log
    let file_layer = match file_appender() {
        Ok(appender) => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(appender)
                .with_ansi(false) // No ANSI colors in log files
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_filter(file_filter),
        ),
        Err(e) => {
            eprintln!("warning: file logging disabled: {:#}", e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!("Logging initialized");

    Ok(())
}

fn file_appender() -> Result<tracing_appender::rolling::RollingFileAppender> {
    let log_dir = get_log_dir()?;

    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    Ok(tracing_appender::rolling::daily(&log_dir, "componentry.log"))
}
