//! Conversation transcript logging
//!
//! One text file and one JSON file per session, named by start timestamp.
//! The text file is the human-readable transcript; the JSON file is the
//! structured form written on finalize.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use parking_lot::Mutex;
use serde::Serialize;

use aidy_core::traits::TranscriptSink;

use crate::AgentError;

#[derive(Debug, Clone, Serialize)]
struct LogEntry {
    role: String,
    message: String,
    timestamp: String,
}

/// Append-only conversation transcript logger
pub struct ConversationLogger {
    log_file: PathBuf,
    json_file: PathBuf,
    messages: Mutex<Vec<LogEntry>>,
}

impl ConversationLogger {
    /// Create log files for a new session
    pub fn new(log_dir: impl AsRef<Path>) -> Result<Self, AgentError> {
        let log_dir = log_dir.as_ref();
        std::fs::create_dir_all(log_dir)
            .map_err(|e| AgentError::Logging(format!("Failed to create log dir: {}", e)))?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_file = log_dir.join(format!("conversation_{}.txt", stamp));
        let json_file = log_dir.join(format!("conversation_{}.json", stamp));

        let logger = Self {
            log_file,
            json_file,
            messages: Mutex::new(Vec::new()),
        };
        logger.write_header()?;

        tracing::info!(file = %logger.log_file.display(), "Conversation log initialized");
        Ok(logger)
    }

    fn write_header(&self) -> Result<(), AgentError> {
        let mut f = File::create(&self.log_file)
            .map_err(|e| AgentError::Logging(e.to_string()))?;
        let bar = "=".repeat(80);
        writeln!(f, "{}", bar).map_err(|e| AgentError::Logging(e.to_string()))?;
        writeln!(f, "           AIDY CONVERSATION TRANSCRIPT")
            .map_err(|e| AgentError::Logging(e.to_string()))?;
        writeln!(
            f,
            "           Session: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )
        .map_err(|e| AgentError::Logging(e.to_string()))?;
        writeln!(f, "{}\n", bar).map_err(|e| AgentError::Logging(e.to_string()))?;
        Ok(())
    }

    fn append_line(&self, line: &str) -> Result<(), AgentError> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.log_file)
            .map_err(|e| AgentError::Logging(e.to_string()))?;
        writeln!(f, "{}", line).map_err(|e| AgentError::Logging(e.to_string()))?;
        Ok(())
    }

    fn record(&self, role: &str, message: &str) {
        self.messages.lock().push(LogEntry {
            role: role.to_string(),
            message: message.to_string(),
            timestamp: Local::now().to_rfc3339(),
        });
    }

    /// Log a user utterance
    pub fn log_user_message(&self, message: &str) -> Result<(), AgentError> {
        self.record("user", message);
        self.append_line(&format!("USER: {}\n", message))
    }

    /// Log a spoken agent reply
    pub fn log_agent_message(&self, message: &str) -> Result<(), AgentError> {
        self.record("agent", message);
        self.append_line(&format!("AIDY: {}\n", message))
    }

    /// Log a system event (retrieval failure, session marker)
    pub fn log_system_event(&self, event: &str) -> Result<(), AgentError> {
        self.record("system", event);
        self.append_line(&format!(
            "[{}] SYSTEM: {}",
            Local::now().format("%H:%M:%S"),
            event
        ))
    }

    /// Write the structured JSON form of the conversation
    pub fn save_json(&self) -> Result<(), AgentError> {
        #[derive(Serialize)]
        struct JsonLog<'a> {
            session_start: String,
            messages: &'a [LogEntry],
        }

        let messages = self.messages.lock();
        let json = serde_json::to_string_pretty(&JsonLog {
            session_start: Local::now().to_rfc3339(),
            messages: &messages,
        })
        .map_err(|e| AgentError::Logging(e.to_string()))?;

        std::fs::write(&self.json_file, json).map_err(|e| AgentError::Logging(e.to_string()))
    }

    /// Write the footer and the JSON form
    pub fn finalize(&self) -> Result<(), AgentError> {
        let bar = "=".repeat(80);
        let count = self.messages.lock().len();
        self.append_line(&format!(
            "\n{}\nSession ended: {}\nTotal messages: {}\n{}",
            bar,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            count,
            bar
        ))?;
        self.save_json()?;

        tracing::info!(messages = count, "Conversation log finalized");
        Ok(())
    }

    /// The full text transcript written so far
    pub fn transcript(&self) -> Result<String, AgentError> {
        std::fs::read_to_string(&self.log_file).map_err(|e| AgentError::Logging(e.to_string()))
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

#[async_trait]
impl TranscriptSink for ConversationLogger {
    async fn log_user(&self, message: &str) -> aidy_core::Result<()> {
        Ok(self.log_user_message(message)?)
    }

    async fn log_agent(&self, message: &str) -> aidy_core::Result<()> {
        Ok(self.log_agent_message(message)?)
    }

    async fn log_system(&self, event: &str) -> aidy_core::Result<()> {
        Ok(self.log_system_event(event)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_format() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ConversationLogger::new(dir.path()).unwrap();

        logger.log_user_message("What is the refund window?").unwrap();
        logger.log_agent_message("Thirty days.").unwrap();
        logger.log_system_event("session started").unwrap();

        let transcript = logger.transcript().unwrap();
        assert!(transcript.contains("AIDY CONVERSATION TRANSCRIPT"));
        assert!(transcript.contains("USER: What is the refund window?"));
        assert!(transcript.contains("AIDY: Thirty days."));
        assert!(transcript.contains("SYSTEM: session started"));
    }

    #[test]
    fn test_finalize_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ConversationLogger::new(dir.path()).unwrap();

        logger.log_user_message("hello").unwrap();
        logger.finalize().unwrap();

        let json = std::fs::read_to_string(&logger.json_file).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["messages"][0]["role"], "user");
        assert_eq!(parsed["messages"][0]["message"], "hello");

        let transcript = logger.transcript().unwrap();
        assert!(transcript.contains("Session ended"));
        assert!(transcript.contains("Total messages: 1"));
    }

    #[test]
    fn test_order_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ConversationLogger::new(dir.path()).unwrap();

        logger.log_user_message("first").unwrap();
        logger.log_agent_message("second").unwrap();
        logger.log_user_message("third").unwrap();

        let transcript = logger.transcript().unwrap();
        let first = transcript.find("USER: first").unwrap();
        let second = transcript.find("AIDY: second").unwrap();
        let third = transcript.find("USER: third").unwrap();
        assert!(first < second && second < third);
    }
}
