//! `componentry list`: show what a registry publishes

use anyhow::{Context, Result};

use super::{RegistrySource, SourceOptions};
use crate::config;
use crate::registry::ManifestSource;

pub async fn list(options: &SourceOptions) -> Result<Vec<String>> {
    let settings = config::load_settings()?;
    let source = RegistrySource::from_options(options, &settings)?;

    let names = source
        .list_components()
        .await
        .context(format!("Failed to list components from {}", source.describe()))?;

    if names.is_empty() {
        println!("No components published in {}", source.describe());
    } else {
        for name in &names {
            println!("{}", name);
        }
    }
    Ok(names)
}
