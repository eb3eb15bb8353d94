//! Error types shared across the registry pipeline
//!
//! Every failure talking to a registry surfaces as a [`RegistryError`], so
//! callers can match on the variant instead of inspecting message text.

use thiserror::Error;

/// Failure while listing or fetching components from a registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry answered 404 for a specific component
    #[error("Component not found in the registry")]
    NotFound { name: String },

    /// Any other non-success HTTP status
    #[error("{}", fetch_failed_message(name.as_deref(), *status, status_text))]
    FetchFailed {
        name: Option<String>,
        status: u16,
        status_text: String,
    },

    /// Transport-level failure (DNS, refused connection, TLS, ...)
    #[error("{}", network_message(name.as_deref()))]
    Network { name: Option<String> },

    /// The request did not complete within the bounded timeout
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Anything else, including malformed response bodies
    #[error("{}", unknown_message(name.as_deref(), message))]
    Unknown {
        name: Option<String>,
        message: String,
    },
}

impl RegistryError {
    /// Component name the error refers to, when known
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::NotFound { name } => Some(name),
            Self::FetchFailed { name, .. }
            | Self::Network { name }
            | Self::Unknown { name, .. } => name.as_deref(),
            Self::Timeout { .. } => None,
        }
    }
}

fn fetch_failed_message(name: Option<&str>, status: u16, status_text: &str) -> String {
    match name {
        Some(name) => format!(
            "Failed to fetch component '{}' from the registry: {} {}",
            name, status, status_text
        ),
        None => format!("Failed to fetch the registry: {} {}", status, status_text),
    }
}

fn network_message(name: Option<&str>) -> String {
    match name {
        Some(name) => format!(
            "Failed to connect to the registry while fetching component '{}'. Check your network connection",
            name
        ),
        None => "Failed to connect to the registry. Check your network connection".to_string(),
    }
}

fn unknown_message(name: Option<&str>, message: &str) -> String {
    match name {
        Some(name) => format!(
            "An unknown error occurred while fetching component '{}': {}",
            name, message
        ),
        None => format!(
            "An unknown error occurred while fetching the registry: {}",
            message
        ),
    }
}

/// A source file whose import statements could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Failure building a single component's manifest.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize manifest for '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("component '{name}' has no files")]
    Empty { name: String },

    #[error("build task for '{name}' did not complete: {message}")]
    Task { name: String, message: String },
}
