//! Per-utterance turn controller
//!
//! Runs once per finalized user utterance, between STT and LLM generation:
//! log the transcript, decide whether the knowledge base is worth consulting,
//! enrich the query with recent dialogue context, and merge the retrieved
//! answer into the conversation state as a tagged assistant message.
//!
//! Retrieval failures degrade the turn (the model answers from its own
//! knowledge); they never abort it. Notification failures are logged and
//! swallowed.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;

use aidy_core::conversation::{is_knowledge_injection, ChatContext, Role, KNOWLEDGE_PREFIX};
use aidy_core::events::NotificationEvent;
use aidy_core::traits::{KnowledgeBase, NotificationChannel, TranscriptSink};
use aidy_core::transcript::FinalizedUtterance;

use crate::history::RecentHistory;

/// Filler and closing phrases that never warrant a knowledge base lookup
static SKIP_PHRASES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "thanks", "thank you", "bye", "goodbye", "okay", "ok", "yes", "no", "sure", "alright",
        "got it", "cool", "nice", "great", "hello", "hi", "hey", "hmm", "hm", "uh", "um",
    ])
});

/// Normalize an utterance for the skip comparison
fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .trim_end_matches(['.', ',', '!', '?'])
        .to_string()
}

/// Whether an utterance warrants a knowledge base lookup
///
/// Exact match against the filler set after normalization; "thanks a lot"
/// still queries.
pub fn should_query_knowledge_base(text: &str) -> bool {
    !SKIP_PHRASES.contains(normalize(text).as_str())
}

/// Build a retrieval query enriched with recent dialogue context
///
/// Short follow-ups ("what about for international orders?") only make sense
/// with the preceding turns attached. With no context the query is the
/// utterance verbatim.
pub fn build_contextual_query(context: &[&str], current: &str) -> String {
    if context.is_empty() {
        return current.to_string();
    }
    format!(
        "Context: {} | Current question: {}",
        context.join(" | "),
        current
    )
}

/// How a turn concluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnDisposition {
    /// Filler utterance, no retrieval attempted
    Skipped,
    /// Retrieved answer merged into the conversation state
    Merged,
    /// Retrieval failed, turn proceeds without knowledge context
    Degraded,
}

/// Number of history entries attached to an enriched query
const CONTEXT_WINDOW: usize = 3;

/// Decision core for one voice session
pub struct TurnController {
    knowledge_base: Arc<dyn KnowledgeBase>,
    transcript: Arc<dyn TranscriptSink>,
    notifications: Arc<dyn NotificationChannel>,
    history: RecentHistory,
}

impl TurnController {
    pub fn new(
        knowledge_base: Arc<dyn KnowledgeBase>,
        transcript: Arc<dyn TranscriptSink>,
        notifications: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            knowledge_base,
            transcript,
            notifications,
            history: RecentHistory::default(),
        }
    }

    /// Process one finalized user utterance before LLM generation
    pub async fn on_user_turn_completed(
        &mut self,
        ctx: &mut ChatContext,
        utterance: &FinalizedUtterance,
    ) -> TurnDisposition {
        let user_text = utterance.text();
        tracing::info!(text = %user_text, "User turn completed");

        if let Err(e) = self.transcript.log_user(&user_text).await {
            tracing::warn!(error = %e, "Failed to log user message");
        }

        self.history.push(user_text.clone());

        self.notify(NotificationEvent::user_transcript(&user_text))
            .await;

        if !should_query_knowledge_base(&user_text) {
            tracing::info!("Skipping knowledge base (filler utterance)");
            return TurnDisposition::Skipped;
        }

        let window = self.history.window(CONTEXT_WINDOW);
        let enriched = build_contextual_query(&window, &user_text);
        tracing::info!(query = %enriched, "Knowledge base query");

        match self.knowledge_base.query_with_sources(&enriched).await {
            Ok(outcome) => {
                ctx.add_message(
                    Role::Assistant,
                    format!("{}{}", KNOWLEDGE_PREFIX, outcome.answer),
                );

                if !outcome.sources.is_empty() {
                    self.notify(NotificationEvent::rag_sources(&user_text, outcome.sources))
                        .await;
                }

                TurnDisposition::Merged
            },
            Err(e) => {
                tracing::error!(error = %e, "Knowledge base retrieval failed");
                if let Err(log_err) = self
                    .transcript
                    .log_system(&format!("Knowledge base retrieval failed: {}", e))
                    .await
                {
                    tracing::warn!(error = %log_err, "Failed to log retrieval failure");
                }
                TurnDisposition::Degraded
            },
        }
    }

    /// Handle a finalized assistant message from the LLM
    ///
    /// Knowledge injections are internal grounding signals; they are never
    /// logged as agent utterances or forwarded to the frontend. Returns
    /// whether the message was forwarded.
    pub async fn on_assistant_message(&self, text: &str) -> bool {
        if text.is_empty() || is_knowledge_injection(text) {
            return false;
        }

        if let Err(e) = self.transcript.log_agent(text).await {
            tracing::warn!(error = %e, "Failed to log agent message");
        }

        self.notify(NotificationEvent::agent_transcript(text)).await;
        true
    }

    /// Recent-history length, exposed for the session composer
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    async fn notify(&self, event: NotificationEvent) {
        if let Err(e) = self.notifications.send(&event).await {
            tracing::warn!(error = %e, "Failed to send notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filler_phrases_skip() {
        for phrase in ["thanks", "Thank you!", "  BYE.  ", "okay", "Hmm", "got it"] {
            assert!(
                !should_query_knowledge_base(phrase),
                "expected skip: {phrase}"
            );
        }
    }

    #[test]
    fn test_exact_match_not_substring() {
        assert!(should_query_knowledge_base("thanks a lot"));
        assert!(should_query_knowledge_base("hello, what is the refund policy?"));
    }

    #[test]
    fn test_questions_query() {
        assert!(should_query_knowledge_base("What is the refund window?"));
        assert!(should_query_knowledge_base("tell me about shipping"));
    }

    #[test]
    fn test_contextual_query_empty_history_verbatim() {
        assert_eq!(
            build_contextual_query(&[], "What is the refund window?"),
            "What is the refund window?"
        );
    }

    #[test]
    fn test_contextual_query_format() {
        let context = vec!["first question", "second question"];
        let enriched = build_contextual_query(&context, "what about orders?");
        assert_eq!(
            enriched,
            "Context: first question | second question | Current question: what about orders?"
        );
    }

    #[test]
    fn test_normalize_strips_trailing_punctuation_only() {
        assert_eq!(normalize("  Thanks!?  "), "thanks");
        assert_eq!(normalize("what, exactly"), "what, exactly");
    }
}
