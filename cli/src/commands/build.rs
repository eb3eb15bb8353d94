//! `componentry build`: publish a component source tree as a registry

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::registry::{BuildReport, BuilderConfig, RegistryBuilder};

/// Build `source` into `output`, printing one line per component
///
/// Fails when any component failed to build; the rest are still written.
pub async fn build(
    source: &Path,
    output: &Path,
    config_path: Option<PathBuf>,
) -> Result<BuildReport> {
    let config = match config_path {
        Some(path) => BuilderConfig::load(&path)?,
        None => BuilderConfig::default(),
    };

    let report = RegistryBuilder::new(config).build(source, output).await?;

    for built in &report.built {
        let status = if built.changed { "updated" } else { "unchanged" };
        println!("  ✅ {} ({})", built.name, status);
    }
    for (name, error) in &report.failed {
        println!("  ❌ {}: {}", name, error);
    }

    println!(
        "\nBuilt {} of {} components into {}",
        report.built.len(),
        report.built.len() + report.failed.len(),
        output.display()
    );

    if !report.is_success() {
        anyhow::bail!("{} component(s) failed to build", report.failed.len());
    }
    Ok(report)
}
