//! Consumer project configuration (`components.json`)
//!
//! ```json
//! {
//!   "rootDir": "src",
//!   "aliases": {
//!     "components": "@/components",
//!     "utils": "@/lib/utils"
//!   }
//! }
//! ```
//!
//! Alias values are what gets written into installed sources. To place files
//! on disk, values starting with `@/` or `~/` are mapped under `rootDir`;
//! any other value is taken relative to the project root.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Alias key naming the directory components are installed into
pub const COMPONENTS_ALIAS: &str = "components";

const ROOT_PREFIXES: &[&str] = &["@/", "~/"];

fn default_root_dir() -> String {
    "src".to_string()
}

/// Mapping from placeholder keys to the consumer's import aliases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AliasConfiguration {
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Directory that `@/` and `~/` aliases point into
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
}

impl Default for AliasConfiguration {
    fn default() -> Self {
        Self {
            aliases: BTreeMap::new(),
            root_dir: default_root_dir(),
        }
    }
}

impl AliasConfiguration {
    /// Alias value for a placeholder key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.aliases.get(key).map(String::as_str)
    }

    /// Filesystem location an alias refers to, relative to `project_root`
    pub fn resolve_path(&self, project_root: &Path, key: &str) -> Option<PathBuf> {
        let value = self.get(key)?;
        let mapped = match ROOT_PREFIXES
            .iter()
            .find_map(|prefix| value.strip_prefix(prefix))
        {
            Some(rest) => project_root.join(&self.root_dir).join(rest),
            None => project_root.join(value.trim_start_matches("./")),
        };
        Some(mapped)
    }

    /// Directory installed components are written into
    pub fn components_dir(&self, project_root: &Path) -> Result<PathBuf> {
        self.resolve_path(project_root, COMPONENTS_ALIAS)
            .with_context(|| {
                format!(
                    "no '{}' alias configured; add it to the project configuration",
                    COMPONENTS_ALIAS
                )
            })
    }

    /// Validate the configuration for common errors
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.aliases.contains_key(COMPONENTS_ALIAS) {
            errors.push(format!("missing required alias '{}'", COMPONENTS_ALIAS));
        }

        for (key, value) in &self.aliases {
            if value.trim().is_empty() {
                errors.push(format!("alias '{}' has an empty value", key));
            } else if Path::new(value)
                .components()
                .any(|c| matches!(c, Component::ParentDir))
            {
                errors.push(format!(
                    "alias '{}' must not leave the project: '{}'",
                    key, value
                ));
            }
        }

        if Path::new(&self.root_dir).is_absolute() {
            errors.push(format!(
                "rootDir must be relative to the project, got '{}'",
                self.root_dir
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Load and validate a project configuration file
pub fn load_project_config(path: &Path) -> Result<AliasConfiguration> {
    if !path.exists() {
        anyhow::bail!(
            "project configuration '{}' not found, run `componentry init` first",
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read project config: {}", path.display()))?;

    let config: AliasConfiguration = serde_json::from_str(&content)
        .context(format!("Failed to parse project config: {}", path.display()))?;

    if let Err(errors) = config.validate() {
        anyhow::bail!(
            "Project config validation failed in {}:\n  {}",
            path.display(),
            errors.join("\n  ")
        );
    }

    Ok(config)
}
