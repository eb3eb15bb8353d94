//! Common test utilities and fixtures
//!
//! Shared helpers for the componentry integration tests: a small component
//! source tree, a built registry, a consumer project, and throwaway HTTP
//! servers.

#![allow(dead_code)]

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use componentry::config::AliasConfiguration;
use componentry::registry::server::router;
use componentry::registry::{BuilderConfig, RegistryBuilder};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub const BUTTON_SOURCE: &str = r#"import * as React from "react"
import { clsx } from "clsx"
import { cn } from "@/lib/utils"

export function Button(props: React.ComponentProps<"button">) {
  return <button className={cn(clsx("btn"), props.className)} {...props} />
}
"#;

pub const DIALOG_SOURCE: &str = r#"import * as React from "react"
import { Button } from "@/components/button"

export function Dialog({ children }: { children: React.ReactNode }) {
  return (
    <div role="dialog">
      {children}
      <Button>Close</Button>
    </div>
  )
}
"#;

/// Creates a temporary directory for test fixtures
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Write `content` to `root/relative`, creating parent directories
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(&path, content).expect("Failed to write fixture file");
    path
}

/// Component sources: `button` (no registry deps) and `dialog` (uses button)
pub fn create_component_sources(root: &Path) -> PathBuf {
    let source = root.join("components");
    write_file(&source, "button/button.tsx", BUTTON_SOURCE);
    write_file(&source, "dialog/dialog.tsx", DIALOG_SOURCE);
    write_file(&source, "dialog/README.md", "Accessible dialog\n");
    source
}

/// Build the fixture components into `root/public/r`
pub async fn build_registry(root: &Path) -> PathBuf {
    let source = create_component_sources(root);
    let output = root.join("public").join("r");
    let report = RegistryBuilder::new(BuilderConfig::default())
        .build(&source, &output)
        .await
        .expect("Registry build failed");
    assert!(report.is_success(), "fixture components failed to build");
    output
}

/// Consumer project configuration installing into `src/components/ui`
pub fn project_config() -> AliasConfiguration {
    let mut config = AliasConfiguration::default();
    config
        .aliases
        .insert("components".to_string(), "@/components/ui".to_string());
    config
        .aliases
        .insert("utils".to_string(), "@/lib/utils".to_string());
    config
}

/// Write the project configuration file to `root/components.json`
pub fn write_project_config(root: &Path) -> PathBuf {
    let json = serde_json::to_string_pretty(&project_config()).expect("serialize config");
    write_file(root, "components.json", &json)
}

/// Where a component lands in a project using [`project_config`]
pub fn installed_dir(project: &Path, name: &str) -> PathBuf {
    project.join("src").join("components").join("ui").join(name)
}

async fn spawn_app(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });
    addr
}

/// Serve a built registry directory on an ephemeral port
pub async fn spawn_registry_server(dir: &Path) -> SocketAddr {
    spawn_app(router(dir)).await
}

/// A server answering every request with `status`
pub async fn spawn_status_server(status: StatusCode) -> SocketAddr {
    spawn_app(Router::new().fallback(move || async move { status })).await
}

/// A server that answers only after `delay`
pub async fn spawn_slow_server(delay: Duration) -> SocketAddr {
    let app = Router::new().route(
        "/r/{file}",
        get(move || async move {
            tokio::time::sleep(delay).await;
            "{}"
        }),
    );
    spawn_app(app).await
}

/// An address nothing is listening on
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    addr
}

/// Base URL for a spawned server
pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}
