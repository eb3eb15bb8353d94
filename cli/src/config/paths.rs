//! Directory path management for componentry
//!
//! User-level paths are centralized here. Project-level files
//! (`components.json`) live in [`super::project`].

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "componentry";

/// Get the base componentry directory (~/.config/componentry/)
pub fn get_componentry_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .context("Failed to get config directory")?
        .join(APP_DIR)
        .pipe(Ok)
}

/// Get the settings file path (~/.config/componentry/config.toml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_componentry_dir()?.join("config.toml"))
}

/// Get the log directory (~/.local/share/componentry/logs/ on Linux)
///
/// Logs follow the platform data directory rather than the config directory.
pub fn get_log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .context("Failed to determine data directory (XDG_DATA_HOME or platform equivalent)")?;

    Ok(data_dir.join(APP_DIR).join("logs"))
}

// Utility trait for Result<PathBuf> → Ok(PathBuf)
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl Pipe for PathBuf {}
