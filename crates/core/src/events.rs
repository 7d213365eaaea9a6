//! Frontend notification events
//!
//! JSON-shaped events pushed to the frontend over a best-effort delivery
//! channel. Per-message failure is non-fatal by contract.

use serde::{Deserialize, Serialize};

use crate::retrieval::RetrievedSource;

/// Event emitted on the notification side-channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A finalized transcript line (user or agent)
    Transcript { role: String, text: String },
    /// Ranked sources backing the most recent knowledge base lookup
    RagSources {
        query: String,
        sources: Vec<RetrievedSource>,
    },
}

impl NotificationEvent {
    pub fn user_transcript(text: impl Into<String>) -> Self {
        NotificationEvent::Transcript {
            role: "user".to_string(),
            text: text.into(),
        }
    }

    pub fn agent_transcript(text: impl Into<String>) -> Self {
        NotificationEvent::Transcript {
            role: "agent".to_string(),
            text: text.into(),
        }
    }

    pub fn rag_sources(query: impl Into<String>, sources: Vec<RetrievedSource>) -> Self {
        NotificationEvent::RagSources {
            query: query.into(),
            sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_event_shape() {
        let event = NotificationEvent::user_transcript("hello there");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "transcript");
        assert_eq!(json["role"], "user");
        assert_eq!(json["text"], "hello there");
    }

    #[test]
    fn test_rag_sources_event_shape() {
        let sources = vec![RetrievedSource {
            text: "fragment text".to_string(),
            score: Some(0.812),
            filename: "a.txt".to_string(),
            doc_id: "ab12cd34".to_string(),
        }];
        let event = NotificationEvent::rag_sources("refund policy", sources);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "rag_sources");
        assert_eq!(json["query"], "refund policy");
        assert_eq!(json["sources"][0]["doc_id"], "ab12cd34");
    }
}
