//! HTTP server assembly for ngestream.
//!
//! Wires the JSON API from `ngestream-api` onto a SQLite-backed store, adds
//! request tracing and a liveness probe. The binary in `main.rs` only deals
//! with configuration and sockets.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, routing::get};
use ngestream_api::api_router;
use ngestream_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `NGESTREAM_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("~/.local/share/ngestream/ngestream.db"),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The full application: `/health` plus the API under `/api`.
pub fn router(store: Arc<SqliteStore>) -> Router {
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api_router(store))
    .layer(TraceLayer::new_for_http())
}
