//! HTTP registry client
//!
//! Manifests are served at `<registry_url>/r/<name>.json`. The component
//! listing comes from a separate directory-listing endpoint returning an
//! array of `{ "name": "<file>.json" }` entries.
//!
//! Every request is bounded by a timeout whose timer is dropped as soon as
//! the response (or an error) arrives.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use super::manifest::{ComponentManifest, INDEX_FILE};
use super::source::ManifestSource;
use crate::error::RegistryError;

/// Upper bound on any single registry request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const LISTING_ACCEPT: &str = "application/vnd.github+json";
const MANIFEST_ACCEPT: &str = "application/json";

#[derive(Debug, Deserialize)]
struct ListingEntry {
    name: String,
}

/// Client for a remote component registry.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    registry_url: String,
    listing_url: String,
    timeout: Duration,
}

impl RegistryClient {
    /// Create a client for the given registry and listing endpoints
    pub fn new(
        registry_url: impl Into<String>,
        listing_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            http,
            registry_url: registry_url.into().trim_end_matches('/').to_string(),
            listing_url: listing_url.into(),
            timeout: REQUEST_TIMEOUT,
        })
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// URL a component manifest is served from
    pub fn component_url(&self, name: &str) -> String {
        format!("{}/r/{}.json", self.registry_url, name)
    }

    /// List the names of every published component
    #[instrument(skip(self), fields(url = %self.listing_url))]
    pub async fn list_components(&self) -> Result<Vec<String>, RegistryError> {
        let entries: Vec<ListingEntry> = self
            .get_json(&self.listing_url, LISTING_ACCEPT, None)
            .await?;

        let mut names: Vec<String> = entries
            .into_iter()
            .map(|entry| {
                entry
                    .name
                    .strip_suffix(".json")
                    .map(str::to_string)
                    .unwrap_or(entry.name)
            })
            .filter(|name| format!("{}.json", name) != INDEX_FILE)
            .collect();
        names.sort();
        names.dedup();

        info!("Registry lists {} components", names.len());
        Ok(names)
    }

    /// Fetch one component manifest
    #[instrument(skip(self))]
    pub async fn fetch_component(&self, name: &str) -> Result<ComponentManifest, RegistryError> {
        let url = self.component_url(name);
        self.get_json(&url, MANIFEST_ACCEPT, Some(name)).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        accept: &str,
        name: Option<&str>,
    ) -> Result<T, RegistryError> {
        let request = async {
            debug!("Sending HTTP GET request to {}", url);
            let response = self
                .http
                .get(url)
                .header(ACCEPT, accept)
                .header(USER_AGENT, concat!("componentry/", env!("CARGO_PKG_VERSION")))
                .send()
                .await
                .map_err(|e| classify(e, name, self.timeout))?;

            let status = response.status();
            debug!("Received HTTP response with status: {}", status);

            if !status.is_success() {
                error!("Non-success status code: {}", status);
                return Err(status_error(status, name));
            }

            response
                .json::<T>()
                .await
                .map_err(|e| classify(e, name, self.timeout))
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => {
                error!("Request to {} timed out", url);
                Err(RegistryError::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

fn status_error(status: StatusCode, name: Option<&str>) -> RegistryError {
    match name {
        Some(name) if status == StatusCode::NOT_FOUND => RegistryError::NotFound {
            name: name.to_string(),
        },
        _ => RegistryError::FetchFailed {
            name: name.map(str::to_string),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        },
    }
}

fn classify(err: reqwest::Error, name: Option<&str>, timeout: Duration) -> RegistryError {
    let name = name.map(str::to_string);
    if err.is_timeout() {
        RegistryError::Timeout {
            seconds: timeout.as_secs(),
        }
    } else if err.is_connect() || err.is_request() {
        error!("HTTP request failed: {}", err);
        RegistryError::Network { name }
    } else {
        RegistryError::Unknown {
            name,
            message: err.to_string(),
        }
    }
}

impl ManifestSource for RegistryClient {
    async fn list_components(&self) -> Result<Vec<String>, RegistryError> {
        RegistryClient::list_components(self).await
    }

    async fn fetch_component(&self, name: &str) -> Result<ComponentManifest, RegistryError> {
        RegistryClient::fetch_component(self, name).await
    }
}
