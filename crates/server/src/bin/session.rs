//! Voice-session worker entry point
//!
//! Spawned by the control plane (`POST /api/agent/start`) or run directly.
//! Finalized utterances arrive on stdin, one per line; notification events
//! leave on stdout as JSON lines for the frontend bridge. `dev` mode raises
//! the log level, `console` keeps it quiet for interactive use.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use aidy_agent::{ConversationLogger, Session, SessionConfig};
use aidy_config::{load_settings, Credentials, Settings};
use aidy_core::events::NotificationEvent;
use aidy_core::traits::NotificationChannel;
use aidy_core::transcript::FinalizedUtterance;
use aidy_server::bootstrap::{build_chat_backend, build_engine, init_tracing};

/// Emits events as JSON lines on stdout
struct StdoutChannel;

#[async_trait]
impl NotificationChannel for StdoutChannel {
    async fn send(&self, event: &NotificationEvent) -> aidy_core::Result<()> {
        let line = serde_json::to_string(event)
            .map_err(|e| aidy_core::Error::Notification(e.to_string()))?;
        println!("{}", line);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "console".to_string());
    if !matches!(mode.as_str(), "console" | "dev") {
        anyhow::bail!("Unknown mode '{}'. Use 'console' or 'dev'", mode);
    }

    let env = std::env::var("AIDY_ENV").ok();
    let mut config = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };
    if mode == "dev" {
        config.observability.log_level = "debug".to_string();
    }

    init_tracing(&config);
    tracing::info!(mode = %mode, "Starting voice-session worker");

    let credentials = Credentials::from_env()?;

    let engine = Arc::new(build_engine(&config, &credentials).await?);
    let backend = Arc::new(build_chat_backend(&config, &credentials)?);
    let logger = Arc::new(ConversationLogger::new(&config.paths.log_dir)?);

    let session_config = SessionConfig {
        prompt_file: PathBuf::from(&config.paths.prompt_file),
        ..Default::default()
    };

    let mut session = Session::new(
        &session_config,
        engine,
        logger.clone(),
        Arc::new(StdoutChannel),
        backend,
        None,
    );

    let (utterance_tx, utterance_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(read_stdin(utterance_tx));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    session.run(utterance_rx, shutdown_rx).await?;

    logger.finalize()?;
    Ok(())
}

/// Forward stdin lines as finalized utterances until EOF
async fn read_stdin(tx: mpsc::Sender<FinalizedUtterance>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if tx.send(FinalizedUtterance::from(trimmed)).await.is_err() {
            break;
        }
    }
}
