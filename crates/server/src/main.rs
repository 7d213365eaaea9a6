//! Control plane entry point
//!
//! Composition root: resolves configuration and credentials, builds the
//! retrieval engine against the hosted providers, performs the fresh-session
//! cleanup, and serves the HTTP API.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use aidy_config::{load_settings, Credentials, Settings};
use aidy_rag::RagEngine;
use aidy_server::bootstrap::{build_engine, init_tracing};
use aidy_server::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("AIDY_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&config);

    tracing::info!("Starting Aidy server v{}", env!("CARGO_PKG_VERSION"));

    // Missing credentials are the one startup error with no fallback
    let credentials = Credentials::from_env()?;

    let engine = Arc::new(build_engine(&config, &credentials).await?);

    startup_cleanup(&config, &engine).await;

    let state = AppState::new(config.clone(), engine);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Fresh-session cleanup: drop the previous index and uploaded files
async fn startup_cleanup(config: &Settings, engine: &RagEngine) {
    tracing::info!("New session starting, clearing previous index and uploads");

    if let Err(e) = engine.clear_index().await {
        tracing::warn!(error = %e, "Failed to clear index on startup");
    }

    let uploads_dir = Path::new(&config.paths.uploads_dir);
    if let Ok(mut entries) = tokio::fs::read_dir(uploads_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                let _ = tokio::fs::remove_file(entry.path()).await;
            }
        }
    }

    tracing::info!("Startup cleanup complete");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
