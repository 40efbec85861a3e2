//! HTTP prediction service.
//!
//! Routes: `GET /` (login page), `GET /home` (risk form) and
//! `POST /predict` (JSON prediction). The pages never depend on the model,
//! so the service stays up even when artifacts failed to load.
pub mod handlers;
pub mod pages;
pub mod state;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::path::Path;

use state::{ServingState, SharedState};

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_HOST: &str = "0.0.0.0";

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(pages::login))
        .route("/home", get(pages::home))
        .route("/predict", post(handlers::predict))
        .with_state(state)
}

/// Listener port from an optional `PORT` value, falling back to 5001.
pub fn resolve_port(value: Option<&str>) -> u16 {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid PORT '{}'; using {}", raw, DEFAULT_PORT);
            DEFAULT_PORT
        }),
        None => DEFAULT_PORT,
    }
}

pub async fn serve(artifacts_dir: &Path, host: &str, port: u16) -> Result<()> {
    let state = ServingState::load(artifacts_dir).shared();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Blocking entry point used by the CLI.
pub fn run_server(artifacts_dir: &Path, host: &str) -> Result<()> {
    let port = resolve_port(std::env::var("PORT").ok().as_deref());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    runtime.block_on(serve(artifacts_dir, host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_and_parses() {
        assert_eq!(resolve_port(None), 5001);
        assert_eq!(resolve_port(Some("8080")), 8080);
        assert_eq!(resolve_port(Some("not-a-port")), 5001);
    }
}
