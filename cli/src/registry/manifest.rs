//! Registry document types
//!
//! A registry is a directory of `<name>.json` manifests plus an `index.json`
//! listing every published component name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Discriminator written into every published manifest
pub const COMPONENT_KIND: &str = "registry:component";

/// File name of the registry index inside an output directory
pub const INDEX_FILE: &str = "index.json";

/// The unit of distribution: one component's files and dependencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentManifest {
    pub name: String,

    pub kind: String,

    #[serde(default)]
    pub external_dependencies: Vec<String>,

    #[serde(default)]
    pub registry_dependencies: Vec<String>,

    #[serde(default)]
    pub files: Vec<ManifestFile>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// A single published file, relative to the component directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestFile {
    pub name: String,
    pub content: String,
}

impl ManifestFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// `index.json`: every component name known to a registry, sorted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RegistryIndex {
    pub registry: Vec<String>,
}

impl RegistryIndex {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let mut registry: Vec<String> = names.into_iter().collect();
        registry.sort();
        registry.dedup();
        Self { registry }
    }
}

impl ComponentManifest {
    /// Whether this manifest publishes exactly `files` (by name and content)
    pub fn same_files(&self, files: &[ManifestFile]) -> bool {
        self.files.as_slice() == files
    }
}

/// Position of a file in the published `files` list.
///
/// `index` comes first, `namespace` second, everything else alphabetically.
/// The rank is taken from the file stem of a top-level entry, so `index.tsx`
/// ranks as `index` while `parts/index.tsx` sorts alphabetically.
fn file_rank(name: &str) -> u8 {
    if name.contains('/') {
        return 2;
    }
    let stem = name.split_once('.').map_or(name, |(stem, _)| stem);
    match stem {
        "index" => 0,
        "namespace" => 1,
        _ => 2,
    }
}

/// Ordering used for `files` in every manifest
pub fn compare_files(a: &ManifestFile, b: &ManifestFile) -> Ordering {
    file_rank(&a.name)
        .cmp(&file_rank(&b.name))
        .then_with(|| a.name.cmp(&b.name))
}

/// Sort files in place according to [`compare_files`]
pub fn sort_files(files: &mut [ManifestFile]) {
    files.sort_by(compare_files);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(files: &[ManifestFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_index_then_namespace_then_alphabetical() {
        let mut files = vec![
            ManifestFile::new("trigger.tsx", ""),
            ManifestFile::new("namespace.ts", ""),
            ManifestFile::new("content.tsx", ""),
            ManifestFile::new("index.ts", ""),
        ];
        sort_files(&mut files);
        assert_eq!(
            names(&files),
            vec!["index.ts", "namespace.ts", "content.tsx", "trigger.tsx"]
        );
    }

    #[test]
    fn test_nested_index_is_not_primary() {
        let mut files = vec![
            ManifestFile::new("parts/index.tsx", ""),
            ManifestFile::new("button.tsx", ""),
            ManifestFile::new("index.tsx", ""),
        ];
        sort_files(&mut files);
        assert_eq!(
            names(&files),
            vec!["index.tsx", "button.tsx", "parts/index.tsx"]
        );
    }

    #[test]
    fn test_manifest_json_shape() {
        let now = Utc::now();
        let manifest = ComponentManifest {
            name: "button".to_string(),
            kind: COMPONENT_KIND.to_string(),
            external_dependencies: vec!["clsx".to_string()],
            registry_dependencies: vec![],
            files: vec![ManifestFile::new("index.tsx", "export {}")],
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["kind"], "registry:component");
        assert_eq!(value["externalDependencies"][0], "clsx");
        assert!(value["registryDependencies"].as_array().unwrap().is_empty());
        assert_eq!(value["files"][0]["name"], "index.tsx");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn test_index_sorted_and_deduplicated() {
        let index = RegistryIndex::new(vec![
            "dialog".to_string(),
            "button".to_string(),
            "dialog".to_string(),
        ]);
        assert_eq!(index.registry, vec!["button", "dialog"]);

        let value = serde_json::to_value(&index).unwrap();
        assert_eq!(value, serde_json::json!({ "registry": ["button", "dialog"] }));
    }
}
