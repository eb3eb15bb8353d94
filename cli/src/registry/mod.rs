//! Component registry: publishing side and consuming side
//!
//! - `analyzer` - import scanning and dependency classification
//! - `builder` - source tree → manifests + `index.json`
//! - `client` - HTTP access to a published registry
//! - `source` - the [`ManifestSource`] seam and an on-disk registry
//! - `server` - serve a built registry over HTTP

pub mod analyzer;
pub mod builder;
pub mod client;
pub mod manifest;
pub mod server;
pub mod source;

pub use builder::{BuildReport, BuilderConfig, RegistryBuilder};
pub use client::RegistryClient;
pub use manifest::{ComponentManifest, ManifestFile, RegistryIndex};
pub use source::{LocalRegistry, ManifestSource};
