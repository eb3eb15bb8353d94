//! `componentry add`: resolve, install, and report components

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::info;

use super::{RegistrySource, SourceOptions};
use crate::config::{self, AliasConfiguration};
use crate::install::{InstallReport, Installer, Outcome};
use crate::prompt;
use crate::registry::ManifestSource;
use crate::resolve::resolve;

/// Options for one `add` run
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Requested component names; empty opens the picker
    pub components: Vec<String>,
    /// Replace already-installed components without asking
    pub overwrite: bool,
    /// Never prompt; already-installed components are skipped
    pub yes: bool,
    /// Project root containing the project configuration
    pub cwd: PathBuf,
    pub source: SourceOptions,
}

/// Run `add` against the configured registry using the terminal for prompts
///
/// Fails when any component failed to install.
pub async fn add(options: AddOptions) -> Result<InstallReport> {
    let settings = config::load_settings()?;
    let aliases = config::load_project_config(&options.cwd.join(&settings.project_config))?;
    let source = RegistrySource::from_options(&options.source, &settings)?;
    info!("Using registry {}", source.describe());

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();

    let report = run(&source, &aliases, &options, &mut input, &mut output).await?;

    if report.has_failures() {
        let failed = report
            .iter()
            .filter(|(_, outcome)| matches!(outcome, Outcome::Failed { .. }))
            .count();
        anyhow::bail!("{} component(s) failed to install", failed);
    }
    Ok(report)
}

/// The `add` workflow over any registry and any terminal streams
pub async fn run<S, R, W>(
    source: &S,
    aliases: &AliasConfiguration,
    options: &AddOptions,
    input: &mut R,
    output: &mut W,
) -> Result<InstallReport>
where
    S: ManifestSource,
    R: BufRead,
    W: Write,
{
    let requested = if options.components.is_empty() {
        if options.yes {
            anyhow::bail!("no components given; name them or drop --yes to pick interactively");
        }
        let available = source
            .list_components()
            .await
            .context("Failed to list registry components")?;
        if available.is_empty() {
            anyhow::bail!("the registry has no components");
        }
        prompt::pick_components(&available, input, output)?
    } else {
        options.components.clone()
    };

    if requested.is_empty() {
        writeln!(output, "No components selected.")?;
        return Ok(InstallReport::default());
    }

    let plan = resolve(&requested, source).await;
    if plan.len() > requested.len() {
        writeln!(output, "Resolved: {}", plan.names().join(" → "))?;
    }

    let installer = Installer::new(source, aliases, &options.cwd);
    let mut report = installer.install_plan(&plan).await;

    for action in report.pending_overwrites() {
        let proceed = if options.overwrite {
            true
        } else if options.yes {
            false
        } else {
            prompt::confirm(
                &format!("'{}' is already installed. Overwrite?", action.name()),
                input,
                output,
            )?
        };

        if !proceed {
            report.mark_skipped(action.name(), "already installed");
            continue;
        }

        let outcome = match action.run(&installer).await {
            Ok(installed) => Outcome::Installed(installed),
            Err(e) => Outcome::Failed {
                error: format!("{:#}", e),
            },
        };
        report.set(action.name(), outcome);
    }

    print_report(&report, output)?;
    Ok(report)
}

/// Write the per-component summary and the external packages to install
pub fn print_report<W: Write>(report: &InstallReport, output: &mut W) -> Result<()> {
    let width = report.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    for (name, outcome) in report.iter() {
        match outcome {
            Outcome::Installed(installed) => writeln!(
                output,
                "  ✅ {:<width$}  installed ({} files)",
                name, installed.files_written
            )?,
            Outcome::AlreadyInstalled { .. } => {
                writeln!(output, "  ⏭  {:<width$}  already installed", name)?
            }
            Outcome::Skipped { reason } => {
                writeln!(output, "  ⏭  {:<width$}  skipped: {}", name, reason)?
            }
            Outcome::Failed { error } => {
                writeln!(output, "  ❌ {:<width$}  failed: {}", name, error)?
            }
        }
    }

    let external = report.external_dependencies();
    if !external.is_empty() {
        writeln!(output)?;
        writeln!(output, "Install the external dependencies with your package manager:")?;
        writeln!(output, "  npm install {}", external.join(" "))?;
    }

    Ok(())
}
