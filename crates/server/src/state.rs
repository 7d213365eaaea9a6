//! Application state
//!
//! Shared across all handlers. The engine is the process-wide retrieval
//! handle; the composition root owns its lifecycle.

use std::sync::Arc;

use aidy_config::Settings;
use aidy_rag::RagEngine;

use crate::agent_process::AgentProcess;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub engine: Arc<RagEngine>,
    pub agent: Arc<AgentProcess>,
}

impl AppState {
    pub fn new(config: Settings, engine: Arc<RagEngine>) -> Self {
        let agent = Arc::new(AgentProcess::new(config.server.agent_command.clone()));
        Self {
            config: Arc::new(config),
            engine,
            agent,
        }
    }
}
