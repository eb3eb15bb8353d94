//! Dependency resolution
//!
//! Expands the components a user asked for into an install order where
//! every registry dependency comes before the components that need it.
//! Traversal is depth-first; each name is visited at most once, so cycles
//! terminate and shared dependencies appear a single time.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::registry::{ComponentManifest, ManifestSource};

/// Ordered component names plus the manifests fetched while resolving them.
#[derive(Debug, Default)]
pub struct InstallPlan {
    order: Vec<String>,
    manifests: HashMap<String, ComponentManifest>,
    unresolved: HashMap<String, RegistryError>,
}

impl InstallPlan {
    /// Component names, dependencies first
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Manifest fetched for `name` during resolution
    pub fn manifest(&self, name: &str) -> Option<&ComponentManifest> {
        self.manifests.get(name)
    }

    /// Fetch error for a name that is still in the plan
    pub fn unresolved(&self, name: &str) -> Option<&RegistryError> {
        self.unresolved.get(name)
    }
}

/// Resolve `requested` (in the order given) into an [`InstallPlan`]
///
/// A component whose manifest cannot be fetched is still placed in the plan;
/// installing it reports the failure.
pub async fn resolve<S: ManifestSource>(requested: &[String], source: &S) -> InstallPlan {
    let mut visited = HashSet::new();
    let mut plan = InstallPlan::default();

    for name in requested {
        resolve_recursive(name, source, &mut visited, &mut plan).await;
    }

    debug!("Resolved install order: {}", plan.order.join(" → "));
    plan
}

fn resolve_recursive<'a, S: ManifestSource + 'a>(
    name: &'a str,
    source: &'a S,
    visited: &'a mut HashSet<String>,
    plan: &'a mut InstallPlan,
) -> Pin<Box<dyn Future<Output = ()> + 'a>> {
    Box::pin(async move {
        // Mark before fetching so a cycle back to `name` stops here
        if !visited.insert(name.to_string()) {
            return;
        }

        match source.fetch_component(name).await {
            Ok(manifest) => {
                let dependencies = manifest.registry_dependencies.clone();
                plan.manifests.insert(name.to_string(), manifest);
                for dependency in &dependencies {
                    resolve_recursive(dependency, source, visited, plan).await;
                }
            }
            Err(e) => {
                warn!("Could not resolve '{}': {}", name, e);
                plan.unresolved.insert(name.to_string(), e);
            }
        }

        plan.order.push(name.to_string());
    })
}
