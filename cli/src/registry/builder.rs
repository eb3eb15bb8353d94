//! Registry builder
//!
//! Turns a source tree laid out as `<source>/<component>/**` into a registry
//! output directory:
//!
//! ```text
//! <output>/
//!   index.json        { "registry": ["button", "dialog", ...] }
//!   button.json       ComponentManifest
//!   dialog.json
//! ```
//!
//! Components are built concurrently. A failure in one component is logged
//! and reported without affecting the others, and `index.json` only lists
//! components whose manifest was written.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};
use walkdir::WalkDir;

use super::analyzer::{AnalyzerConfig, analyze, parse_imports};
use super::manifest::{
    COMPONENT_KIND, ComponentManifest, INDEX_FILE, ManifestFile, RegistryIndex, sort_files,
};
use crate::error::BuildError;
use crate::template::templatize;

/// Build settings, loadable from a TOML file
///
/// ```toml
/// kind = "registry:component"
/// code_extensions = ["ts", "tsx"]
///
/// [analyzer]
/// ignore = ["react", "react-dom"]
/// internal_prefix = "@/"
/// components_alias = "@/components"
///
/// [aliases]
/// components = "@/components"
/// utils = "@/lib/utils"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuilderConfig {
    /// Value of the `kind` field in every manifest
    pub kind: String,

    /// Extensions of files that are scanned for imports
    pub code_extensions: Vec<String>,

    /// Placeholder key → import prefix used in the source tree
    pub aliases: BTreeMap<String, String>,

    pub analyzer: AnalyzerConfig,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            kind: COMPONENT_KIND.to_string(),
            code_extensions: ["ts", "tsx", "js", "jsx", "mjs", "cjs"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            aliases: BTreeMap::from([
                ("components".to_string(), "@/components".to_string()),
                ("hooks".to_string(), "@/hooks".to_string()),
                ("lib".to_string(), "@/lib".to_string()),
                ("utils".to_string(), "@/lib/utils".to_string()),
            ]),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl BuilderConfig {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read build config: {}", path.display()))?;
        toml::from_str(&content)
            .context(format!("Failed to parse build config: {}", path.display()))
    }

    /// Whether a file should be scanned for imports
    pub fn is_code(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.code_extensions.iter().any(|c| c == ext))
    }
}

/// A manifest that was written to the output directory
#[derive(Debug, Clone)]
pub struct BuiltComponent {
    pub name: String,
    pub path: PathBuf,
    /// Whether the published files differ from the previous build
    pub changed: bool,
}

/// Outcome of a registry build
#[derive(Debug, Default)]
pub struct BuildReport {
    pub built: Vec<BuiltComponent>,
    pub failed: Vec<(String, BuildError)>,
}

impl BuildReport {
    /// Names of every successfully built component
    pub fn names(&self) -> Vec<String> {
        self.built.iter().map(|c| c.name.clone()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builds registry manifests from a component source tree.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    config: BuilderConfig,
}

impl RegistryBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// Build every component under `source_dir` into `output_dir`
    ///
    /// Errors only for problems affecting the whole build (unreadable source
    /// directory, unwritable output directory or index); per-component
    /// failures are collected in the report.
    #[instrument(
        skip_all,
        fields(source = %source_dir.display(), output = %output_dir.display())
    )]
    pub async fn build(&self, source_dir: &Path, output_dir: &Path) -> Result<BuildReport> {
        let names = discover_components(source_dir)?;
        info!("Building {} components", names.len());

        tokio::fs::create_dir_all(output_dir)
            .await
            .context(format!(
                "Failed to create output directory: {}",
                output_dir.display()
            ))?;

        let results = join_all(names.iter().map(|name| {
            let component_dir = source_dir.join(name);
            async move {
                let result = self.build_component(&component_dir, name, output_dir).await;
                (name.clone(), result)
            }
        }))
        .await;

        let mut report = BuildReport::default();
        for (name, result) in results {
            match result {
                Ok(built) => report.built.push(built),
                Err(e) => {
                    error!("Failed to build component '{}': {}", name, e);
                    report.failed.push((name, e));
                }
            }
        }

        write_index(output_dir, report.names()).await?;
        info!(
            "Built {} components ({} failed)",
            report.built.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// Build a single component directory into `<output_dir>/<name>.json`
    pub async fn build_component(
        &self,
        component_dir: &Path,
        name: &str,
        output_dir: &Path,
    ) -> Result<BuiltComponent, BuildError> {
        let sources = collect_files(component_dir.to_path_buf(), name).await?;
        if sources.is_empty() {
            return Err(BuildError::Empty {
                name: name.to_string(),
            });
        }

        let mut external = BTreeSet::new();
        let mut registry = BTreeSet::new();
        let mut files = Vec::with_capacity(sources.len());

        for (relative, content) in sources {
            let content = if self.config.is_code(&relative) {
                let imports = parse_imports(&content).map_err(|source| BuildError::Parse {
                    path: format!("{}/{}", name, relative),
                    source,
                })?;
                let deps = analyze(&imports, name, &self.config.analyzer);
                external.extend(deps.external);
                registry.extend(deps.registry);
                templatize(&content, &self.config.aliases)
            } else {
                content
            };
            files.push(ManifestFile::new(relative, content));
        }
        sort_files(&mut files);

        let path = output_dir.join(format!("{}.json", name));
        let previous = read_previous(&path).await;
        let (created_at, updated_at, changed) = stamp(previous.as_ref(), &files, Utc::now());

        let manifest = ComponentManifest {
            name: name.to_string(),
            kind: self.config.kind.clone(),
            external_dependencies: external.into_iter().collect(),
            registry_dependencies: registry.into_iter().collect(),
            files,
            created_at,
            updated_at,
        };

        let json = serde_json::to_string_pretty(&manifest).map_err(|source| {
            BuildError::Serialize {
                name: name.to_string(),
                source,
            }
        })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| BuildError::Write {
                path: path.display().to_string(),
                source,
            })?;

        debug!(changed, "Wrote manifest {}", path.display());
        Ok(BuiltComponent {
            name: name.to_string(),
            path,
            changed,
        })
    }
}

/// Timestamps for a freshly built manifest: `(created_at, updated_at, changed)`
///
/// `created_at` survives rebuilds. `updated_at` only moves when the published
/// files differ from the previous manifest.
pub fn stamp(
    previous: Option<&ComponentManifest>,
    files: &[ManifestFile],
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>, bool) {
    match previous {
        Some(prev) if prev.same_files(files) => (prev.created_at, prev.updated_at, false),
        Some(prev) => (prev.created_at, now, true),
        None => (now, now, true),
    }
}

/// Immediate, non-hidden subdirectories of the source tree, sorted
fn discover_components(source_dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(source_dir).context(format!(
        "Failed to read source directory: {}",
        source_dir.display()
    ))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.context(format!(
            "Failed to read source directory: {}",
            source_dir.display()
        ))?;
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Every file in a component directory as `(relative path, content)`
async fn collect_files(dir: PathBuf, name: &str) -> Result<Vec<(String, String)>, BuildError> {
    let task_name = name.to_string();
    tokio::task::spawn_blocking(move || walk_component(&dir, &task_name))
        .await
        .map_err(|e| BuildError::Task {
            name: name.to_string(),
            message: e.to_string(),
        })?
}

fn walk_component(dir: &Path, name: &str) -> Result<Vec<(String, String)>, BuildError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
        });

    for entry in walker {
        let entry = entry.map_err(|e| BuildError::Read {
            path: name.to_string(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = std::fs::read_to_string(entry.path()).map_err(|source| BuildError::Read {
            path: format!("{}/{}", name, relative),
            source,
        })?;
        files.push((relative, content));
    }
    Ok(files)
}

/// Previously published manifest, if one exists and parses
async fn read_previous(path: &Path) -> Option<ComponentManifest> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    match serde_json::from_str(&content) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            warn!(
                "Ignoring unreadable previous manifest {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

async fn write_index(output_dir: &Path, names: Vec<String>) -> Result<()> {
    let path = output_dir.join(INDEX_FILE);
    let index = RegistryIndex::new(names);
    let json = serde_json::to_string_pretty(&index).context("Failed to serialize index")?;
    tokio::fs::write(&path, json)
        .await
        .context(format!("Failed to write index: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn read_manifest(dir: &Path, name: &str) -> ComponentManifest {
        let content = std::fs::read_to_string(dir.join(format!("{}.json", name))).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    fn source_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(
            root,
            "button/index.tsx",
            r#"import * as React from "react";
import { cva } from "class-variance-authority";
import { cn } from "@/lib/utils";
export { Button } from "./button";
"#,
        );
        write(
            root,
            "button/button.tsx",
            r#"import { Slot } from "@radix-ui/react-slot";
import clsx from "clsx";
export function Button() { return null; }
"#,
        );
        write(root, "button/button.css", ".btn { color: red; }\n");
        write(
            root,
            "dialog/index.tsx",
            r#"import { Button } from "@/components/button";
import { Portal } from "@floating-ui/react/portal";
export const Dialog = () => <Button>Don't close</Button>;
"#,
        );
        write(root, "dialog/namespace.ts", "export * from \"./index\";\n");
        write(root, "dialog/parts/title.tsx", "export const Title = 1;\n");
        temp_dir
    }

    #[test]
    fn test_stamp() {
        let t0 = Utc::now() - Duration::days(3);
        let t1 = Utc::now();
        let files = vec![ManifestFile::new("index.tsx", "a")];
        let previous = ComponentManifest {
            name: "x".to_string(),
            kind: COMPONENT_KIND.to_string(),
            external_dependencies: vec![],
            registry_dependencies: vec![],
            files: files.clone(),
            created_at: t0,
            updated_at: t0,
        };

        assert_eq!(stamp(None, &files, t1), (t1, t1, true));
        assert_eq!(stamp(Some(&previous), &files, t1), (t0, t0, false));

        let changed = vec![ManifestFile::new("index.tsx", "b")];
        assert_eq!(stamp(Some(&previous), &changed, t1), (t0, t1, true));
    }

    #[test]
    fn test_builder_config_from_toml() {
        let config: BuilderConfig = toml::from_str(
            r#"
code_extensions = ["ts"]

[analyzer]
ignore = ["vue"]

[aliases]
utils = "~/utils"
"#,
        )
        .unwrap();
        assert_eq!(config.kind, COMPONENT_KIND);
        assert!(config.is_code("a/b.ts"));
        assert!(!config.is_code("a/b.tsx"));
        assert_eq!(config.analyzer.ignore, vec!["vue"]);
        assert_eq!(config.analyzer.components_alias, "@/components");
        assert_eq!(config.aliases.len(), 1);
    }

    #[tokio::test]
    async fn test_build_registry() {
        let source = source_tree();
        let output = TempDir::new().unwrap();

        let report = RegistryBuilder::default()
            .build(source.path(), output.path())
            .await
            .unwrap();
        assert!(report.is_success());
        assert_eq!(report.names(), vec!["button", "dialog"]);

        let button = read_manifest(output.path(), "button");
        assert_eq!(button.kind, COMPONENT_KIND);
        assert_eq!(
            button.external_dependencies,
            vec!["class-variance-authority", "clsx"]
        );
        assert!(button.registry_dependencies.is_empty());
        let names: Vec<&str> = button.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["index.tsx", "button.css", "button.tsx"]);
        assert!(button.files[0].content.contains(r#"from "{{ utils }}";"#));
        assert_eq!(button.files[1].content, ".btn { color: red; }\n");

        let dialog = read_manifest(output.path(), "dialog");
        assert_eq!(dialog.external_dependencies, vec!["@floating-ui/react"]);
        assert_eq!(dialog.registry_dependencies, vec!["button"]);
        let names: Vec<&str> = dialog.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["index.tsx", "namespace.ts", "parts/title.tsx"]);
        assert!(dialog.files[0].content.contains("{{ components }}/button"));

        let index: RegistryIndex = serde_json::from_str(
            &std::fs::read_to_string(output.path().join(INDEX_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(index.registry, vec!["button", "dialog"]);
    }

    #[tokio::test]
    async fn test_rebuild_preserves_timestamps_when_unchanged() {
        let source = source_tree();
        let output = TempDir::new().unwrap();
        let builder = RegistryBuilder::default();

        builder.build(source.path(), output.path()).await.unwrap();
        let first = read_manifest(output.path(), "button");
        let dialog_before = read_manifest(output.path(), "dialog");

        let report = builder.build(source.path(), output.path()).await.unwrap();
        assert!(report.built.iter().all(|c| !c.changed));
        let second = read_manifest(output.path(), "button");
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(first.updated_at, second.updated_at);

        write(source.path(), "button/button.css", ".btn { color: blue; }\n");
        let report = builder.build(source.path(), output.path()).await.unwrap();
        let changed: Vec<(&str, bool)> = report
            .built
            .iter()
            .map(|c| (c.name.as_str(), c.changed))
            .collect();
        assert_eq!(changed, vec![("button", true), ("dialog", false)]);
        let third = read_manifest(output.path(), "button");
        assert_eq!(third.created_at, first.created_at);
        assert!(third.updated_at > first.updated_at);
        assert_ne!(third.files, first.files);

        let dialog = read_manifest(output.path(), "dialog");
        assert_eq!(dialog.updated_at, dialog_before.updated_at);
    }

    #[tokio::test]
    async fn test_failed_component_does_not_stop_others() {
        let source = source_tree();
        write(
            source.path(),
            "broken/index.tsx",
            "import { a } from \"unterminated;\n",
        );
        let output = TempDir::new().unwrap();

        let report = RegistryBuilder::default()
            .build(source.path(), output.path())
            .await
            .unwrap();

        assert_eq!(report.names(), vec!["button", "dialog"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert!(matches!(report.failed[0].1, BuildError::Parse { .. }));
        assert!(!output.path().join("broken.json").exists());

        let index: RegistryIndex = serde_json::from_str(
            &std::fs::read_to_string(output.path().join(INDEX_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(index.registry, vec!["button", "dialog"]);
    }

    #[tokio::test]
    async fn test_corrupt_previous_manifest_is_replaced() {
        let source = source_tree();
        let output = TempDir::new().unwrap();
        std::fs::write(output.path().join("button.json"), "garbage").unwrap();

        let report = RegistryBuilder::default()
            .build(source.path(), output.path())
            .await
            .unwrap();
        assert!(report.is_success());
        let button = read_manifest(output.path(), "button");
        assert_eq!(button.created_at, button.updated_at);
    }

    #[tokio::test]
    async fn test_missing_source_dir_is_fatal() {
        let output = TempDir::new().unwrap();
        let result = RegistryBuilder::default()
            .build(&output.path().join("nope"), output.path())
            .await;
        assert!(result.is_err());
    }
}
