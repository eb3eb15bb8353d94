//! Configuration scaffolding for `componentry init`
//!
//! Starter files are embedded at compile time and rendered with liquid:
//!
//! - `project/` - a consumer `components.json`
//! - `registry/` - a registry author's `componentry.toml` build settings

use anyhow::{Context, Result};
use include_dir::{Dir, include_dir};
use liquid::ParserBuilder;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::load_project_config;
use crate::registry::BuilderConfig;

// Embed templates at compile time
static TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Which starter configuration to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InitKind {
    /// A project that installs components
    Project,
    /// A component source tree that publishes a registry
    Registry,
}

impl InitKind {
    fn template_dir(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Registry => "registry",
        }
    }
}

/// Values substituted into the starter templates
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub kind: InitKind,
    /// Directory `@/` resolves to
    pub root_dir: String,
    /// Import alias prefix (`@/` or `~/`)
    pub alias_prefix: String,
    /// Optional subdirectory of `components` installs go into
    pub ui_subdir: String,
    /// Component source directory (registry kind only)
    pub source_dir: String,
    pub force: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            kind: InitKind::Project,
            root_dir: "src".to_string(),
            alias_prefix: "@/".to_string(),
            ui_subdir: "ui".to_string(),
            source_dir: "components".to_string(),
            force: false,
        }
    }
}

/// Write the starter files into `output_dir`, returning the paths written
pub fn init(output_dir: &Path, options: &InitOptions) -> Result<Vec<PathBuf>> {
    let template_dir = TEMPLATES
        .get_dir(options.kind.template_dir())
        .ok_or_else(|| anyhow::anyhow!("template not found: {}", options.kind.template_dir()))?;

    if !options.force {
        for file in template_dir.files() {
            if let Some(name) = file.path().file_name() {
                let target = output_dir.join(name);
                if target.exists() {
                    anyhow::bail!(
                        "'{}' already exists, use --force to overwrite",
                        target.display()
                    );
                }
            }
        }
    }

    fs::create_dir_all(output_dir).context("Failed to create output directory")?;

    let project_name = output_dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "components".to_string());

    let root_dir = options.root_dir.as_str();
    let alias_prefix = options.alias_prefix.as_str();
    let ui_subdir = options.ui_subdir.trim_matches('/');
    let source_dir = options.source_dir.as_str();

    let context = liquid::object!({
        "project_name": project_name,
        "root_dir": root_dir,
        "alias_prefix": alias_prefix,
        "ui_subdir": ui_subdir,
        "source_dir": source_dir,
    });

    let parser = ParserBuilder::with_stdlib().build()?;

    let mut written = Vec::new();
    render_embedded_dir(template_dir, output_dir, &parser, &context, &mut written)?;

    for path in &written {
        check_rendered(options.kind, path)?;
    }

    Ok(written)
}

/// Recursively render an embedded directory to the filesystem
fn render_embedded_dir(
    dir: &Dir,
    output_base: &Path,
    parser: &liquid::Parser,
    context: &liquid::Object,
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    for file in dir.files() {
        let file_name = file
            .path()
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid file name"))?;
        let content = file
            .contents_utf8()
            .ok_or_else(|| anyhow::anyhow!("File is not valid UTF-8: {:?}", file.path()))?;

        let rendered = parser
            .parse(content)
            .context(format!("Failed to parse template: {:?}", file.path()))?
            .render(context)
            .context(format!("Failed to render template: {:?}", file.path()))?;

        let output_path = output_base.join(file_name);
        fs::write(&output_path, rendered)
            .context(format!("Failed to write file: {}", output_path.display()))?;
        written.push(output_path);
    }

    for subdir in dir.dirs() {
        let subdir_name = subdir
            .path()
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid directory name"))?;
        let output_subdir = output_base.join(subdir_name);
        fs::create_dir_all(&output_subdir)?;
        render_embedded_dir(subdir, &output_subdir, parser, context, written)?;
    }

    Ok(())
}

/// Generated files must load with the same code that reads them later
fn check_rendered(kind: InitKind, path: &Path) -> Result<()> {
    match kind {
        InitKind::Project => {
            load_project_config(path)?;
        }
        InitKind::Registry => {
            BuilderConfig::load(path)?;
        }
    }
    Ok(())
}
