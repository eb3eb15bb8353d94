//! Where manifests come from
//!
//! The resolver and installer only need two operations from a registry, so
//! they are written against [`ManifestSource`]. [`super::RegistryClient`]
//! implements it over HTTP and [`LocalRegistry`] over a built output
//! directory on disk.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::manifest::{ComponentManifest, INDEX_FILE, RegistryIndex};
use crate::error::RegistryError;

/// A registry that can list and serve component manifests.
pub trait ManifestSource {
    /// Names of every component the registry publishes
    fn list_components(&self) -> impl Future<Output = Result<Vec<String>, RegistryError>> + Send;

    /// Fetch a single component manifest by name
    fn fetch_component(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ComponentManifest, RegistryError>> + Send;
}

/// Whether `name` can safely be used as a manifest file stem
pub fn is_valid_component_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// A registry output directory read straight from disk.
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    dir: PathBuf,
}

impl LocalRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn manifest_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl ManifestSource for LocalRegistry {
    async fn list_components(&self) -> Result<Vec<String>, RegistryError> {
        let path = self.dir.join(INDEX_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| RegistryError::Unknown {
                name: None,
                message: format!("{}: {}", path.display(), e),
            })?;
        let index: RegistryIndex =
            serde_json::from_str(&content).map_err(|e| RegistryError::Unknown {
                name: None,
                message: format!("{}: {}", path.display(), e),
            })?;
        Ok(index.registry)
    }

    async fn fetch_component(&self, name: &str) -> Result<ComponentManifest, RegistryError> {
        if !is_valid_component_name(name) {
            return Err(RegistryError::NotFound {
                name: name.to_string(),
            });
        }

        let path = self.manifest_path(name);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RegistryError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => {
                return Err(RegistryError::Unknown {
                    name: Some(name.to_string()),
                    message: e.to_string(),
                });
            }
        };

        serde_json::from_str(&content).map_err(|e| RegistryError::Unknown {
            name: Some(name.to_string()),
            message: format!("invalid manifest: {}", e),
        })
    }
}

/// In-memory registry for unit tests, recording every fetch
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryRegistry {
    manifests: std::collections::HashMap<String, ComponentManifest>,
    pub fetches: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MemoryRegistry {
    /// Add a component with the given dependencies and a single `index.tsx`
    pub fn with(mut self, name: &str, deps: &[&str], content: &str) -> Self {
        let now = chrono::Utc::now();
        self.manifests.insert(
            name.to_string(),
            ComponentManifest {
                name: name.to_string(),
                kind: super::manifest::COMPONENT_KIND.to_string(),
                external_dependencies: vec![],
                registry_dependencies: deps.iter().map(|d| d.to_string()).collect(),
                files: vec![super::manifest::ManifestFile::new("index.tsx", content)],
                created_at: now,
                updated_at: now,
            },
        );
        self
    }

    /// Publish `name` with an empty file list
    pub fn clear_files(&mut self, name: &str) {
        if let Some(manifest) = self.manifests.get_mut(name) {
            manifest.files.clear();
        }
    }

    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.as_str() == name)
            .count()
    }
}

#[cfg(test)]
impl ManifestSource for MemoryRegistry {
    async fn list_components(&self) -> Result<Vec<String>, RegistryError> {
        let mut names: Vec<String> = self.manifests.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn fetch_component(&self, name: &str) -> Result<ComponentManifest, RegistryError> {
        self.fetches.lock().unwrap().push(name.to_string());
        self.manifests
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }
}
