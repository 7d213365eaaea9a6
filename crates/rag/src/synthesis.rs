//! Grounded answer synthesis
//!
//! Retrieved fragments are handed to a hosted LLM under a strict prompt: the
//! model may only use the supplied context and must emit a fixed refusal
//! sentence when the context does not contain the answer.

use std::sync::Arc;

use aidy_core::conversation::Message;
use aidy_llm::backend::LlmBackend;

use crate::vector_store::FragmentHit;
use crate::RagError;

/// Synthesizes answers from retrieved fragments
pub struct AnswerSynthesizer {
    backend: Arc<dyn LlmBackend>,
}

impl AnswerSynthesizer {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Produce a grounded answer for the question from the given fragments
    pub async fn synthesize(
        &self,
        question: &str,
        hits: &[FragmentHit],
    ) -> Result<String, RagError> {
        let context: Vec<&str> = hits.iter().map(|h| h.content.as_str()).collect();
        let prompt = build_qa_prompt(question, &context);

        let result = self
            .backend
            .generate(&[Message::user(prompt)])
            .await
            .map_err(|e| RagError::Synthesis(e.to_string()))?;

        Ok(result.text.trim().to_string())
    }
}

/// Strict question-answering prompt
///
/// The refusal sentence is a stable contract; downstream callers compare
/// against it to decide between spoken refusal and a grounded answer.
pub fn build_qa_prompt(question: &str, context: &[&str]) -> String {
    format!(
        "You are answering questions using ONLY the context below.\n\
         Do NOT add any information that is not explicitly in the context.\n\
         If the context does not contain the answer, say: \
         'This information is not available in the provided documents.'\n\
         Be specific and quote details (names, numbers, titles) exactly as they appear.\n\
         \n\
         Context:\n\
         {}\n\
         \n\
         Question: {}\n\
         \n\
         Answer:",
        context.join("\n\n"),
        question
    )
}
