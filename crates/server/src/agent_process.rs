//! Voice-session worker process management
//!
//! The control plane starts and stops the session worker as a child process.
//! One worker at a time; its exit is detected lazily on the next status or
//! start call.

use std::time::Duration;

use serde::Serialize;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::ServerError;

/// Worker modes accepted by the start endpoint
const VALID_MODES: &[&str] = &["console", "dev"];

/// Worker process status
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub mode: Option<String>,
}

impl AgentStatus {
    fn stopped() -> Self {
        Self {
            running: false,
            pid: None,
            mode: None,
        }
    }
}

struct RunningWorker {
    child: Child,
    mode: String,
}

/// Handle to the single voice-session worker
pub struct AgentProcess {
    command: String,
    worker: Mutex<Option<RunningWorker>>,
}

impl AgentProcess {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            worker: Mutex::new(None),
        }
    }

    /// Current worker status, reaping an exited child if found
    pub async fn status(&self) -> AgentStatus {
        let mut worker = self.worker.lock().await;

        match worker.as_mut() {
            Some(running) => match running.child.try_wait() {
                Ok(None) => AgentStatus {
                    running: true,
                    pid: running.child.id(),
                    mode: Some(running.mode.clone()),
                },
                _ => {
                    *worker = None;
                    AgentStatus::stopped()
                },
            },
            None => AgentStatus::stopped(),
        }
    }

    /// Spawn the worker in the given mode
    pub async fn start(&self, mode: &str) -> Result<AgentStatus, ServerError> {
        if !VALID_MODES.contains(&mode) {
            return Err(ServerError::BadRequest(
                "Invalid mode. Use 'console' or 'dev'".to_string(),
            ));
        }

        let mut worker = self.worker.lock().await;

        if let Some(running) = worker.as_mut() {
            if matches!(running.child.try_wait(), Ok(None)) {
                return Err(ServerError::BadRequest(
                    "Agent is already running".to_string(),
                ));
            }
            *worker = None;
        }

        tracing::info!(command = %self.command, mode = %mode, "Starting agent worker");

        let mut child = Command::new(&self.command)
            .arg(mode)
            .spawn()
            .map_err(|e| ServerError::Internal(format!("Failed to start agent: {}", e)))?;

        // Catch immediate crashes (bad credentials, missing binary args)
        tokio::time::sleep(Duration::from_secs(1)).await;
        if let Ok(Some(status)) = child.try_wait() {
            return Err(ServerError::Internal(format!(
                "Agent failed to start (exit: {})",
                status
            )));
        }

        let pid = child.id();
        *worker = Some(RunningWorker {
            child,
            mode: mode.to_string(),
        });

        tracing::info!(pid = ?pid, "Agent worker started");
        Ok(AgentStatus {
            running: true,
            pid,
            mode: Some(mode.to_string()),
        })
    }

    /// Stop the worker
    pub async fn stop(&self) -> Result<(), ServerError> {
        let mut worker = self.worker.lock().await;

        let Some(mut running) = worker.take() else {
            return Err(ServerError::BadRequest("Agent is not running".to_string()));
        };

        if matches!(running.child.try_wait(), Ok(Some(_))) {
            return Err(ServerError::BadRequest("Agent is not running".to_string()));
        }

        tracing::info!(pid = ?running.child.id(), "Stopping agent worker");

        running
            .child
            .kill()
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to stop agent: {}", e)))?;

        Ok(())
    }
}
