//! Conversation state types
//!
//! The `ChatContext` is the mutable conversation-state handle shared between
//! the turn controller and the session composer. Retrieved knowledge is
//! injected as a synthetic assistant message carrying [`KNOWLEDGE_PREFIX`];
//! that prefix is the filter key that keeps the grounding signal out of
//! anything shown to the user or logged as an agent utterance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix tag for knowledge injected into the conversation for the LLM.
///
/// Messages starting with this tag are internal grounding signals and must
/// never be forwarded to the frontend or the transcript log.
pub const KNOWLEDGE_PREFIX: &str = "[Knowledge Base Information]: ";

/// Check whether an assistant message is an internal knowledge injection.
pub fn is_knowledge_injection(text: &str) -> bool {
    text.starts_with("[Knowledge Base Information]")
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Mutable conversation state for one session
///
/// Holds the system prompt plus the running message history handed to the
/// language model on every generation.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    messages: Vec<Message>,
}

impl ChatContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context seeded with a system prompt
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    /// Append a message to the conversation
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    /// All messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent message, if any
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knowledge_injection_filter() {
        assert!(is_knowledge_injection(
            "[Knowledge Base Information]: The refund window is 30 days."
        ));
        assert!(!is_knowledge_injection("The refund window is 30 days."));
        // Prefix match, not substring match
        assert!(!is_knowledge_injection(
            "See [Knowledge Base Information] above."
        ));
    }

    #[test]
    fn test_chat_context_append() {
        let mut ctx = ChatContext::with_system_prompt("You are a voice assistant.");
        ctx.add_message(Role::User, "hello");
        ctx.add_message(Role::Assistant, "hi there");

        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.messages()[0].role, Role::System);
        assert_eq!(ctx.last().unwrap().content, "hi there");
    }
}
