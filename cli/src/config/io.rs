//! Settings file I/O operations
//!
//! Reading, writing, and updating `config.toml`. All operations validate.

use super::paths::get_config_path;
use super::schema::{SETTING_KEYS, Settings};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load settings from the user config directory
///
/// Returns the defaults if the file doesn't exist.
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_config_path()?)
}

/// Load settings from an explicit path
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let content =
        fs::read_to_string(path).context(format!("Failed to read config: {}", path.display()))?;

    let settings: Settings =
        toml::from_str(&content).context(format!("Failed to parse config: {}", path.display()))?;

    if let Err(errors) = settings.validate() {
        anyhow::bail!(
            "Config validation failed in {}:\n  {}",
            path.display(),
            errors.join("\n  ")
        );
    }

    Ok(settings)
}

/// Save settings to the user config directory
pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&get_config_path()?, settings)
}

/// Save settings to an explicit path
///
/// Creates parent directories if needed.
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Err(errors) = settings.validate() {
        anyhow::bail!("cannot save invalid config:\n  {}", errors.join("\n  "));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(format!(
            "Failed to create config directory: {}",
            parent.display()
        ))?;
    }

    let content = toml::to_string_pretty(settings).context("Failed to serialize config")?;

    fs::write(path, content).context(format!("Failed to write config: {}", path.display()))?;

    Ok(())
}

/// Update settings with a modification function
///
/// Handles the load → modify → validate → save cycle.
pub fn update_settings<F>(f: F) -> Result<Settings>
where
    F: FnOnce(&mut Settings) -> Result<()>,
{
    let path = get_config_path()?;
    let mut settings = load_settings_from(&path)?;
    f(&mut settings)?;
    save_settings_to(&path, &settings)?;
    Ok(settings)
}

/// Assign a single setting by key
pub fn set_setting(key: &str, value: &str) -> Result<Settings> {
    update_settings(|settings| apply_setting(settings, key, value))
}

fn apply_setting(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    if !settings.set(key, value) {
        anyhow::bail!(
            "unknown setting '{}'. Valid settings: {}",
            key,
            SETTING_KEYS.join(", ")
        );
    }
    Ok(())
}
