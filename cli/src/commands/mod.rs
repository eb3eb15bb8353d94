//! CLI command implementations
//!
//! `main.rs` parses arguments and dispatches here; everything that talks to
//! the terminal lives in these modules.

pub mod add;
pub mod build;
pub mod list;

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Settings;
use crate::error::RegistryError;
use crate::registry::{ComponentManifest, LocalRegistry, ManifestSource, RegistryClient};

/// Where `add` and `list` read components from
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    /// Built registry directory on disk
    pub registry_dir: Option<PathBuf>,
    /// Registry base URL overriding the configured one
    pub registry_url: Option<String>,
}

/// Registry selected from command-line flags and settings
#[derive(Debug, Clone)]
pub enum RegistrySource {
    Local(LocalRegistry),
    Remote(RegistryClient),
}

impl RegistrySource {
    /// Pick the registry to use
    ///
    /// A `--registry` URL override is assumed to be served by
    /// `componentry serve`, so its listing lives at `<url>/r`.
    pub fn from_options(options: &SourceOptions, settings: &Settings) -> Result<Self> {
        if let Some(dir) = &options.registry_dir {
            return Ok(Self::Local(LocalRegistry::new(dir)));
        }

        let client = match &options.registry_url {
            Some(url) => {
                let url = url.trim_end_matches('/');
                RegistryClient::new(url, format!("{}/r", url))?
            }
            None => RegistryClient::new(&settings.registry_url, &settings.listing_url)?,
        };
        Ok(Self::Remote(client))
    }

    /// Human-readable location of the registry
    pub fn describe(&self) -> String {
        match self {
            Self::Local(registry) => registry.dir().display().to_string(),
            Self::Remote(client) => client.registry_url().to_string(),
        }
    }
}

impl ManifestSource for RegistrySource {
    async fn list_components(&self) -> Result<Vec<String>, RegistryError> {
        match self {
            Self::Local(registry) => registry.list_components().await,
            Self::Remote(client) => client.list_components().await,
        }
    }

    async fn fetch_component(&self, name: &str) -> Result<ComponentManifest, RegistryError> {
        match self {
            Self::Local(registry) => registry.fetch_component(name).await,
            Self::Remote(client) => client.fetch_component(name).await,
        }
    }
}
