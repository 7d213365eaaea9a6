//! Voice session composition
//!
//! Wires the injected providers (LLM backend, TTS seam, knowledge base,
//! transcript sink, notification channel) and the turn controller into one
//! running conversation. STT stays outside: the session consumes finalized
//! utterances, not audio.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use aidy_core::conversation::{ChatContext, Role};
use aidy_core::traits::{KnowledgeBase, NotificationChannel, TranscriptSink};
use aidy_core::transcript::FinalizedUtterance;
use aidy_llm::backend::LlmBackend;

use crate::prompt::build_system_prompt;
use crate::turn::TurnController;
use crate::AgentError;

/// Text-to-speech seam
///
/// The session speaks every forwarded agent reply through this; a failing
/// synthesizer downgrades the call to text-only rather than ending it.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn speak(&self, text: &str) -> aidy_core::Result<()>;
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Persona prompt file merged into the system prompt at session start
    pub prompt_file: PathBuf,
    /// Instruction used to produce the opening reply
    pub greeting_instructions: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt_file: PathBuf::from("prompt/prompt.md"),
            greeting_instructions: "Greet the user warmly, introduce yourself as a voice \
                                    assistant, and let them know they can ask questions about \
                                    any documents they've uploaded."
                .to_string(),
        }
    }
}

/// One live voice conversation
pub struct Session {
    controller: TurnController,
    chat: ChatContext,
    llm: Arc<dyn LlmBackend>,
    tts: Option<Arc<dyn TextToSpeech>>,
    transcript: Arc<dyn TranscriptSink>,
    greeting: String,
}

impl Session {
    /// Compose a session; the system prompt is fixed from here on
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &SessionConfig,
        knowledge_base: Arc<dyn KnowledgeBase>,
        transcript: Arc<dyn TranscriptSink>,
        notifications: Arc<dyn NotificationChannel>,
        llm: Arc<dyn LlmBackend>,
        tts: Option<Arc<dyn TextToSpeech>>,
    ) -> Self {
        let system_prompt = build_system_prompt(&config.prompt_file);
        let controller = TurnController::new(knowledge_base, transcript.clone(), notifications);

        Self {
            controller,
            chat: ChatContext::with_system_prompt(system_prompt),
            llm,
            tts,
            transcript,
            greeting: config.greeting_instructions.clone(),
        }
    }

    /// Produce and speak the opening reply
    pub async fn greet(&mut self, instructions: &str) -> Result<String, AgentError> {
        self.chat.add_message(Role::System, instructions);
        self.generate_and_speak().await
    }

    /// Process one finalized user utterance end to end
    ///
    /// Turn controller first (transcript, skip decision, retrieval, context
    /// injection), then LLM generation over the possibly-enriched state,
    /// then the spoken reply.
    pub async fn handle_utterance(
        &mut self,
        utterance: FinalizedUtterance,
    ) -> Result<String, AgentError> {
        self.chat.add_message(Role::User, utterance.text());

        self.controller
            .on_user_turn_completed(&mut self.chat, &utterance)
            .await;

        self.generate_and_speak().await
    }

    async fn generate_and_speak(&mut self) -> Result<String, AgentError> {
        let result = self.llm.generate(self.chat.messages()).await?;
        let reply = result.text;

        self.chat.add_message(Role::Assistant, reply.clone());
        self.controller.on_assistant_message(&reply).await;

        if let Some(tts) = &self.tts {
            if let Err(e) = tts.speak(&reply).await {
                tracing::warn!(error = %e, "TTS synthesis failed, continuing text-only");
            }
        }

        Ok(reply)
    }

    /// Drive the session from a channel of finalized utterances
    ///
    /// Greets first, then processes utterances until the channel closes or
    /// the shutdown signal fires. A turn in flight when shutdown arrives is
    /// dropped without merging partial state.
    pub async fn run(
        &mut self,
        mut utterances: mpsc::Receiver<FinalizedUtterance>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), AgentError> {
        let greeting = self.greeting.clone();
        if let Err(e) = self.greet(&greeting).await {
            tracing::warn!(error = %e, "Greeting generation failed");
        }

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("Session shutdown requested");
                        break;
                    }
                }
                utterance = utterances.recv() => {
                    let Some(utterance) = utterance else {
                        tracing::info!("Utterance channel closed, ending session");
                        break;
                    };
                    if let Err(e) = self.handle_utterance(utterance).await {
                        tracing::error!(error = %e, "Turn failed");
                    }
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Mark the session as ended in the transcript log
    pub async fn shutdown(&self) {
        if let Err(e) = self.transcript.log_system("session ended").await {
            tracing::warn!(error = %e, "Failed to log session end");
        }
    }

    /// Conversation state, for inspection by the composition root
    pub fn chat(&self) -> &ChatContext {
        &self.chat
    }
}
