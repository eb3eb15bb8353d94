//! Static HTTP server for a built registry directory
//!
//! Routes:
//!
//! - `GET /r/<name>.json` - a component manifest (or `index.json`)
//! - `GET /r` - directory listing in the `[{ "name": "<file>.json" }]` shape
//!   the registry client expects from its listing endpoint

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Path as UrlPath, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde_json::json;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::manifest::{INDEX_FILE, RegistryIndex};
use super::source::is_valid_component_name;

#[derive(Debug)]
struct RegistryDir {
    root: PathBuf,
}

/// Router serving manifests from `dir`
pub fn router(dir: impl Into<PathBuf>) -> Router {
    let state = Arc::new(RegistryDir { root: dir.into() });
    Router::new()
        .route("/r", get(listing))
        .route("/r/{file}", get(manifest))
        .with_state(state)
}

async fn manifest(
    State(dir): State<Arc<RegistryDir>>,
    UrlPath(file): UrlPath<String>,
) -> Response {
    let Some(name) = file.strip_suffix(".json") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !is_valid_component_name(name) {
        debug!("Rejected manifest request for '{}'", file);
        return StatusCode::NOT_FOUND.into_response();
    }

    match tokio::fs::read(dir.root.join(&file)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No manifest for '{}'", name);
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            error!("Failed to read manifest '{}': {}", file, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn listing(State(dir): State<Arc<RegistryDir>>) -> Response {
    let path = dir.root.join(INDEX_FILE);
    let index = match tokio::fs::read_to_string(&path).await {
        Ok(content) => serde_json::from_str::<RegistryIndex>(&content),
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match index {
        Ok(index) => {
            let entries: Vec<_> = index
                .registry
                .iter()
                .map(|name| json!({ "name": format!("{}.json", name), "type": "file" }))
                .collect();
            Json(entries).into_response()
        }
        Err(e) => {
            error!("Invalid {}: {}", path.display(), e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve `dir` on `127.0.0.1:<port>` until Ctrl+C
pub async fn serve(dir: PathBuf, port: u16) -> Result<()> {
    if !dir.join(INDEX_FILE).exists() {
        anyhow::bail!(
            "'{}' is not a registry output directory (missing {})",
            dir.display(),
            INDEX_FILE
        );
    }

    let addr: SocketAddr = format!("127.0.0.1:{}", port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;

    info!("Serving registry {} on http://{}", dir.display(), addr);
    eprintln!("Serving registry {} on http://{}", dir.display(), addr);
    eprintln!("Manifests: http://{}/r/<name>.json", addr);

    axum::serve(listener, router(dir))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            eprintln!("Received shutdown signal...");
        })
        .await?;

    Ok(())
}
