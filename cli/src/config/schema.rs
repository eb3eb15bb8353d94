//! User settings schema
//!
//! Every field carries a default so a partial (or missing) `config.toml`
//! still yields a usable configuration.

use serde::{Deserialize, Serialize};

/// Registry serving `<url>/r/<name>.json` manifests
pub const DEFAULT_REGISTRY_URL: &str = "https://ui.componentry.dev";

/// Directory-listing endpoint enumerating published manifests
pub const DEFAULT_LISTING_URL: &str =
    "https://api.github.com/repos/componentry/ui/contents/registry";

/// File name of the consumer project configuration
pub const DEFAULT_PROJECT_CONFIG: &str = "components.json";

/// Keys accepted by `componentry config set`
pub const SETTING_KEYS: &[&str] = &["registry_url", "listing_url", "project_config"];

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the component registry
    pub registry_url: String,

    /// URL returning the registry's directory listing
    pub listing_url: String,

    /// Name of the project configuration file, relative to the project root
    pub project_config: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            listing_url: DEFAULT_LISTING_URL.to_string(),
            project_config: DEFAULT_PROJECT_CONFIG.to_string(),
        }
    }
}

impl Settings {
    /// Validate the settings for common errors
    ///
    /// Returns Ok(()) if valid, or Err with a list of error messages
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (key, url) in [
            ("registry_url", &self.registry_url),
            ("listing_url", &self.listing_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(format!(
                    "{} must be an http:// or https:// URL, got '{}'",
                    key, url
                ));
            }
        }

        if self.project_config.trim().is_empty() {
            errors.push("project_config cannot be empty".to_string());
        } else if self.project_config.contains('/') || self.project_config.contains('\\') {
            errors.push(format!(
                "project_config must be a file name, got '{}'",
                self.project_config
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Read a setting by key
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "registry_url" => Some(&self.registry_url),
            "listing_url" => Some(&self.listing_url),
            "project_config" => Some(&self.project_config),
            _ => None,
        }
    }

    /// Assign a setting by key, returning false for unknown keys
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let slot = match key {
            "registry_url" => &mut self.registry_url,
            "listing_url" => &mut self.listing_url,
            "project_config" => &mut self.project_config,
            _ => return false,
        };
        *slot = value.trim_end_matches('/').to_string();
        true
    }
}
