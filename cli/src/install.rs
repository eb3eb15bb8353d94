//! Component installation
//!
//! Every component in a plan is installed concurrently into
//! `<components dir>/<name>/`. Each one ends in exactly one [`Outcome`];
//! a failure never stops the others.
//!
//! Files are written to a temporary sibling and renamed into place, so an
//! interrupted install never leaves a half-written source file behind.

use anyhow::{Context, Result};
use futures_util::future::join_all;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

use crate::config::AliasConfiguration;
use crate::registry::source::is_valid_component_name;
use crate::registry::{ComponentManifest, ManifestSource};
use crate::resolve::InstallPlan;
use crate::template;

/// Summary of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub files_written: usize,
    pub external_dependencies: Vec<String>,
    pub registry_dependencies: Vec<String>,
}

/// Deferred "replace the installed copy" step for an already-installed component.
///
/// Running it deletes the component directory, fetches a fresh manifest and
/// writes it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwriteAction {
    name: String,
    target_dir: PathBuf,
}

impl OverwriteAction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub async fn run<S: ManifestSource>(&self, installer: &Installer<'_, S>) -> Result<Installed> {
        installer.overwrite(self).await
    }
}

/// What happened to one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Installed(Installed),
    AlreadyInstalled { overwrite: OverwriteAction },
    Failed { error: String },
    Skipped { reason: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Installed(_) => "installed",
            Self::AlreadyInstalled { .. } => "already installed",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }
}

/// Per-component outcomes, in install-plan order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    entries: Vec<(String, Outcome)>,
}

impl InstallReport {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.entries.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }

    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    /// Replace the outcome recorded for `name`
    pub fn set(&mut self, name: &str, outcome: Outcome) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = outcome,
            None => self.entries.push((name.to_string(), outcome)),
        }
    }

    /// Record that the user declined to overwrite `name`
    pub fn mark_skipped(&mut self, name: &str, reason: impl Into<String>) {
        self.set(
            name,
            Outcome::Skipped {
                reason: reason.into(),
            },
        );
    }

    /// Overwrite actions for every already-installed component
    pub fn pending_overwrites(&self) -> Vec<OverwriteAction> {
        self.entries
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                Outcome::AlreadyInstalled { overwrite } => Some(overwrite.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, outcome)| matches!(outcome, Outcome::Failed { .. }))
    }

    /// External packages needed by the components installed in this run
    pub fn external_dependencies(&self) -> Vec<String> {
        let mut deps: Vec<String> = self
            .entries
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                Outcome::Installed(installed) => Some(installed.external_dependencies.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        deps.sort();
        deps.dedup();
        deps
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Writes registry components into a consumer project.
pub struct Installer<'a, S> {
    source: &'a S,
    config: &'a AliasConfiguration,
    project_root: PathBuf,
}

impl<'a, S: ManifestSource> Installer<'a, S> {
    pub fn new(
        source: &'a S,
        config: &'a AliasConfiguration,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            config,
            project_root: project_root.into(),
        }
    }

    /// Directory a component is installed into
    ///
    /// Names that could leave the components directory (`..`, `a/b`) are
    /// rejected before any path is built.
    pub fn target_dir(&self, name: &str) -> Result<PathBuf> {
        if !is_valid_component_name(name) {
            anyhow::bail!("invalid component name '{}'", name);
        }
        Ok(self.config.components_dir(&self.project_root)?.join(name))
    }

    /// Install the components of a resolved plan, reusing its manifests
    #[instrument(skip_all, fields(count = plan.len()))]
    pub async fn install_plan(&self, plan: &InstallPlan) -> InstallReport {
        self.install_all(plan.names(), |name| plan.manifest(name))
            .await
    }

    /// Install components by name, fetching each manifest
    pub async fn install(&self, names: &[String]) -> InstallReport {
        self.install_all(names, |_| None).await
    }

    async fn install_all<'p, F>(&self, names: &[String], cached: F) -> InstallReport
    where
        F: Fn(&str) -> Option<&'p ComponentManifest>,
    {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = names.iter().filter(|n| seen.insert(n.as_str())).collect();

        let outcomes = join_all(unique.iter().map(|name| {
            let manifest = cached(name);
            async move { (name.to_string(), self.install_one(name, manifest).await) }
        }))
        .await;

        let mut report = InstallReport::default();
        for (name, outcome) in outcomes {
            info!("{}: {}", name, outcome.label());
            report.set(&name, outcome);
        }
        report
    }

    async fn install_one(&self, name: &str, cached: Option<&ComponentManifest>) -> Outcome {
        let target_dir = match self.target_dir(name) {
            Ok(dir) => dir,
            Err(e) => {
                return Outcome::Failed {
                    error: format!("{:#}", e),
                };
            }
        };

        match tokio::fs::try_exists(&target_dir).await {
            Ok(true) => {
                debug!("'{}' already present at {}", name, target_dir.display());
                return Outcome::AlreadyInstalled {
                    overwrite: OverwriteAction {
                        name: name.to_string(),
                        target_dir,
                    },
                };
            }
            Ok(false) => {}
            Err(e) => {
                return Outcome::Failed {
                    error: format!("Failed to inspect {}: {}", target_dir.display(), e),
                };
            }
        }

        let manifest = match cached {
            Some(manifest) => manifest.clone(),
            None => match self.source.fetch_component(name).await {
                Ok(manifest) => manifest,
                Err(e) => {
                    error!("Failed to fetch '{}': {}", name, e);
                    return Outcome::Failed {
                        error: e.to_string(),
                    };
                }
            },
        };

        match self.write_component(&manifest, &target_dir).await {
            Ok(installed) => Outcome::Installed(installed),
            Err(e) => {
                error!("Failed to install '{}': {:#}", name, e);
                // Nothing existed here before this run
                if let Err(cleanup) = tokio::fs::remove_dir_all(&target_dir).await {
                    debug!("Cleanup of {} failed: {}", target_dir.display(), cleanup);
                }
                Outcome::Failed {
                    error: format!("{:#}", e),
                }
            }
        }
    }

    /// Replace an installed component with a freshly fetched copy
    #[instrument(skip_all, fields(name = %action.name))]
    pub async fn overwrite(&self, action: &OverwriteAction) -> Result<Installed> {
        if self.target_dir(&action.name)? != action.target_dir {
            anyhow::bail!(
                "refusing to overwrite {}: not the directory of component '{}'",
                action.target_dir.display(),
                action.name
            );
        }

        match tokio::fs::remove_dir_all(&action.target_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).context(format!(
                    "Failed to remove {}",
                    action.target_dir.display()
                ));
            }
        }

        let manifest = self.source.fetch_component(&action.name).await?;
        self.write_component(&manifest, &action.target_dir).await
    }

    async fn write_component(
        &self,
        manifest: &ComponentManifest,
        target_dir: &Path,
    ) -> Result<Installed> {
        tokio::fs::create_dir_all(target_dir)
            .await
            .context(format!("Failed to create directory: {}", target_dir.display()))?;

        for file in &manifest.files {
            let relative = safe_relative_path(&file.name)?;
            let rendered = template::render(&file.content, self.config);

            let missing = template::unresolved(&rendered, self.config);
            if !missing.is_empty() {
                warn!(
                    "{}/{} uses unconfigured aliases: {}",
                    manifest.name,
                    file.name,
                    missing.join(", ")
                );
            }

            write_atomic(&target_dir.join(relative), &rendered).await?;
        }

        info!(
            "Installed '{}' ({} files) into {}",
            manifest.name,
            manifest.files.len(),
            target_dir.display()
        );

        Ok(Installed {
            files_written: manifest.files.len(),
            external_dependencies: manifest.external_dependencies.clone(),
            registry_dependencies: manifest.registry_dependencies.clone(),
        })
    }
}

/// A manifest file name that stays inside the component directory
fn safe_relative_path(name: &str) -> Result<PathBuf> {
    let path = PathBuf::from(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if name.is_empty() || escapes {
        anyhow::bail!("refusing to write file '{}' outside the component directory", name);
    }
    Ok(path)
}

/// Write `content` to a temporary sibling of `path`, then rename it into place
async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .context(format!("{} has no parent directory", path.display()))?;
    tokio::fs::create_dir_all(parent)
        .await
        .context(format!("Failed to create directory: {}", parent.display()))?;

    let file_name = path
        .file_name()
        .context(format!("{} has no file name", path.display()))?;
    let tmp = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    tokio::fs::write(&tmp, content)
        .await
        .context(format!("Failed to write {}", tmp.display()))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).context(format!("Failed to move file into place: {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::source::MemoryRegistry;
    use crate::resolve::resolve;
    use tempfile::TempDir;

    fn alias_config() -> AliasConfiguration {
        let mut config = AliasConfiguration::default();
        config
            .aliases
            .insert("components".to_string(), "@/components/ui".to_string());
        config
            .aliases
            .insert("utils".to_string(), "@/lib/utils".to_string());
        config
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn component_dir(project: &Path, name: &str) -> PathBuf {
        project.join("src/components/ui").join(name)
    }

    #[test]
    fn test_safe_relative_path() {
        assert!(safe_relative_path("index.tsx").is_ok());
        assert!(safe_relative_path("parts/title.tsx").is_ok());
        assert!(safe_relative_path("../escape.tsx").is_err());
        assert!(safe_relative_path("/etc/passwd").is_err());
        assert!(safe_relative_path("").is_err());
    }

    #[tokio::test]
    async fn test_install_renders_placeholders() {
        let project = TempDir::new().unwrap();
        let registry = MemoryRegistry::default().with(
            "button",
            &[],
            "import { cn } from \"{{ utils }}\";\n",
        );
        let config = alias_config();
        let installer = Installer::new(&registry, &config, project.path());

        let report = installer.install(&names(&["button"])).await;
        assert!(matches!(
            report.get("button"),
            Some(Outcome::Installed(Installed { files_written: 1, .. }))
        ));

        let written =
            std::fs::read_to_string(component_dir(project.path(), "button").join("index.tsx"))
                .unwrap();
        assert_eq!(written, "import { cn } from \"@/lib/utils\";\n");
    }

    #[tokio::test]
    async fn test_second_install_reports_already_installed() {
        let project = TempDir::new().unwrap();
        let registry = MemoryRegistry::default().with("button", &[], "v1");
        let config = alias_config();
        let installer = Installer::new(&registry, &config, project.path());

        installer.install(&names(&["button"])).await;
        let path = component_dir(project.path(), "button").join("index.tsx");
        std::fs::write(&path, "local edits").unwrap();

        let report = installer.install(&names(&["button"])).await;
        let Some(Outcome::AlreadyInstalled { overwrite }) = report.get("button") else {
            panic!("expected already installed, got {:?}", report.get("button"));
        };
        assert_eq!(overwrite.name(), "button");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "local edits");
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_directory() {
        let project = TempDir::new().unwrap();
        let registry = MemoryRegistry::default().with("button", &[], "fresh");
        let config = alias_config();
        let installer = Installer::new(&registry, &config, project.path());

        let dir = component_dir(project.path(), "button");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.tsx"), "old").unwrap();

        let report = installer.install(&names(&["button"])).await;
        let actions = report.pending_overwrites();
        assert_eq!(actions.len(), 1);

        let installed = actions[0].run(&installer).await.unwrap();
        assert_eq!(installed.files_written, 1);
        assert!(!dir.join("stale.tsx").exists());
        assert_eq!(std::fs::read_to_string(dir.join("index.tsx")).unwrap(), "fresh");
        assert_eq!(registry.fetch_count("button"), 1);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let project = TempDir::new().unwrap();
        let registry = MemoryRegistry::default().with("card", &["ghost"], "card");
        let config = alias_config();
        let installer = Installer::new(&registry, &config, project.path());

        let plan = resolve(&names(&["card"]), &registry).await;
        let report = installer.install_plan(&plan).await;

        let order: Vec<&str> = report.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["ghost", "card"]);
        assert!(matches!(report.get("ghost"), Some(Outcome::Failed { error }) if error == "Component not found in the registry"));
        assert!(matches!(report.get("card"), Some(Outcome::Installed(_))));
        assert!(report.has_failures());
        assert!(!component_dir(project.path(), "ghost").exists());
    }

    #[tokio::test]
    async fn test_plan_manifests_are_not_refetched() {
        let project = TempDir::new().unwrap();
        let registry = MemoryRegistry::default()
            .with("dialog", &["button"], "dialog")
            .with("button", &[], "button");
        let config = alias_config();
        let installer = Installer::new(&registry, &config, project.path());

        let plan = resolve(&names(&["dialog"]), &registry).await;
        let report = installer.install_plan(&plan).await;
        assert_eq!(report.len(), 2);
        assert_eq!(registry.fetch_count("dialog"), 1);
        assert_eq!(registry.fetch_count("button"), 1);
    }

    #[tokio::test]
    async fn test_unsafe_file_name_fails_without_leftovers() {
        let project = TempDir::new().unwrap();
        let registry = MemoryRegistry::default();
        let config = alias_config();
        let installer = Installer::new(&registry, &config, project.path());

        let now = chrono::Utc::now();
        let manifest = ComponentManifest {
            name: "evil".to_string(),
            kind: crate::registry::manifest::COMPONENT_KIND.to_string(),
            external_dependencies: vec![],
            registry_dependencies: vec![],
            files: vec![crate::registry::ManifestFile::new("../../escape.tsx", "x")],
            created_at: now,
            updated_at: now,
        };
        let outcome = installer.install_one("evil", Some(&manifest)).await;
        assert!(matches!(outcome, Outcome::Failed { .. }));
        assert!(!component_dir(project.path(), "evil").exists());
        assert!(!project.path().join("src/escape.tsx").exists());
    }

    #[tokio::test]
    async fn test_missing_components_alias_fails() {
        let project = TempDir::new().unwrap();
        let registry = MemoryRegistry::default().with("button", &[], "x");
        let config = AliasConfiguration::default();
        let installer = Installer::new(&registry, &config, project.path());

        let report = installer.install(&names(&["button"])).await;
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_escaping_names_fail_before_touching_disk() {
        let project = TempDir::new().unwrap();
        let hooks = project.path().join("src/hooks");
        std::fs::create_dir_all(&hooks).unwrap();
        std::fs::write(hooks.join("use-user.ts"), "user code").unwrap();
        std::fs::create_dir_all(component_dir(project.path(), "card")).unwrap();

        let registry = MemoryRegistry::default().with("button", &[], "x");
        let config = alias_config();
        let installer = Installer::new(&registry, &config, project.path());

        let report = installer
            .install(&names(&["card/../../hooks", "..", "../..", "button"]))
            .await;
        for name in ["card/../../hooks", "..", "../.."] {
            assert!(
                matches!(report.get(name), Some(Outcome::Failed { .. })),
                "{} should fail",
                name
            );
        }
        assert!(matches!(report.get("button"), Some(Outcome::Installed(_))));
        assert!(report.pending_overwrites().is_empty());
        assert_eq!(registry.fetch_count("card/../../hooks"), 0);
        assert_eq!(
            std::fs::read_to_string(hooks.join("use-user.ts")).unwrap(),
            "user code"
        );
    }

    #[tokio::test]
    async fn test_overwrite_rejects_foreign_directory() {
        let project = TempDir::new().unwrap();
        let hooks = project.path().join("src/hooks");
        std::fs::create_dir_all(&hooks).unwrap();

        let registry = MemoryRegistry::default().with("button", &[], "x");
        let config = alias_config();
        let installer = Installer::new(&registry, &config, project.path());

        let escaping = OverwriteAction {
            name: "card/../../hooks".to_string(),
            target_dir: component_dir(project.path(), "card/../../hooks"),
        };
        assert!(installer.overwrite(&escaping).await.is_err());

        let mismatched = OverwriteAction {
            name: "button".to_string(),
            target_dir: hooks.clone(),
        };
        assert!(installer.overwrite(&mismatched).await.is_err());
        assert!(hooks.is_dir());
    }

    #[tokio::test]
    async fn test_component_without_files_installs_once() {
        let project = TempDir::new().unwrap();
        let mut registry = MemoryRegistry::default().with("marker", &[], "");
        registry.clear_files("marker");
        let config = alias_config();
        let installer = Installer::new(&registry, &config, project.path());

        let first = installer.install(&names(&["marker"])).await;
        assert!(matches!(
            first.get("marker"),
            Some(Outcome::Installed(Installed { files_written: 0, .. }))
        ));
        assert!(component_dir(project.path(), "marker").is_dir());

        let second = installer.install(&names(&["marker"])).await;
        assert!(matches!(
            second.get("marker"),
            Some(Outcome::AlreadyInstalled { .. })
        ));
    }

    #[test]
    fn test_mark_skipped_keeps_order() {
        let mut report = InstallReport::default();
        report.set(
            "a",
            Outcome::Failed {
                error: "x".to_string(),
            },
        );
        report.set(
            "b",
            Outcome::AlreadyInstalled {
                overwrite: OverwriteAction {
                    name: "b".to_string(),
                    target_dir: PathBuf::from("/tmp/b"),
                },
            },
        );
        report.mark_skipped("b", "overwrite declined");

        let order: Vec<(&str, &str)> = report.iter().map(|(n, o)| (n, o.label())).collect();
        assert_eq!(order, vec![("a", "failed"), ("b", "skipped")]);
        assert!(report.pending_overwrites().is_empty());
    }
}
