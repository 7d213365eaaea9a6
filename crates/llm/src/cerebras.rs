//! Cerebras backend (OpenAI-compatible chat completions)
//!
//! Retries transient failures (network errors, 429, 5xx) with exponential
//! backoff; 4xx responses other than 429 fail immediately.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use aidy_core::Message;

use crate::backend::{BackendConfig, FinishReason, GenerationResult, LlmBackend};
use crate::LlmError;

/// Cerebras chat completions backend
pub struct CerebrasBackend {
    config: BackendConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: usize,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    completion_tokens: usize,
}

impl CerebrasBackend {
    /// Create a new backend
    ///
    /// Fails when the API key is empty; hosted synthesis cannot run without
    /// credentials and this must surface at startup, not at query time.
    pub fn new(config: BackendConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "Cerebras API key is empty. Set it via environment or config.".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    async fn send_once(&self, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))
    }

    fn is_retryable(err: &LlmError) -> bool {
        match err {
            LlmError::Request(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[async_trait]
impl LlmBackend for CerebrasBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();
        let mut backoff = self.config.initial_backoff;
        let mut attempt = 0;

        let response = loop {
            match self.send_once(messages).await {
                Ok(response) => break response,
                Err(err) if Self::is_retryable(&err) && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        error = %err,
                        "LLM request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                },
                Err(err) => return Err(err),
            }
        };

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("Response contained no choices".to_string()))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("stop") | None => FinishReason::Stop,
            Some(_) => FinishReason::Error,
        };

        Ok(GenerationResult {
            text: choice.message.content,
            tokens: response.usage.map(|u| u.completion_tokens).unwrap_or(0),
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason,
        })
    }

    async fn is_available(&self) -> bool {
        let probe = [Message::user("ping")];
        self.send_once(&probe).await.is_ok()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        let config = BackendConfig::default();
        assert!(CerebrasBackend::new(config).is_err());
    }

    #[test]
    fn test_completions_url_normalizes_slash() {
        let config = BackendConfig::new("test-key").with_endpoint("https://api.cerebras.ai/v1/");
        let backend = CerebrasBackend::new(config).unwrap();
        assert_eq!(
            backend.completions_url(),
            "https://api.cerebras.ai/v1/chat/completions"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(CerebrasBackend::is_retryable(&LlmError::Request(
            "connection refused".to_string()
        )));
        assert!(CerebrasBackend::is_retryable(&LlmError::Api {
            status: 503,
            message: String::new()
        }));
        assert!(!CerebrasBackend::is_retryable(&LlmError::Api {
            status: 401,
            message: String::new()
        }));
    }
}
