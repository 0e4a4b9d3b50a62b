use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::{self, AppState, SharedState};
use crate::db::{BoardDb, DbHandle};

/// Configuration for the kanban API server.
pub struct ServerConfig {
    pub port: u16,
    pub db_path: std::path::PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            db_path: std::path::PathBuf::from("kanri.db"),
        }
    }
}

/// Build the application router. CORS is open for every origin, as the
/// browser client is served from a different port.
pub fn build_router(state: SharedState) -> Router {
    api::api_router()
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Open the database, bind the listener and serve until ctrl-c.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
    }

    let db = BoardDb::new(&config.db_path).context("Failed to initialize board database")?;
    let state = Arc::new(AppState {
        db: DbHandle::new(db),
    });
    let app = build_router(state);

    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    let local_addr = listener.local_addr()?;
    tracing::info!(db = %config.db_path.display(), "Kanban API listening on http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutting down");
}
