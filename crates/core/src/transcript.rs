//! Finalized-utterance transcript types
//!
//! STT providers deliver finalized utterances in more than one shape: some
//! hand over a single transcript string, others a list of scored segments.
//! The union is resolved into plain text by [`FinalizedUtterance::text`] at
//! the boundary, never inside the turn controller.

use serde::{Deserialize, Serialize};

/// One scored span of a transcribed utterance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    /// Provider confidence (0.0 - 1.0), if reported
    pub confidence: Option<f32>,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// A finalized user utterance as delivered by the STT provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FinalizedUtterance {
    /// Plain transcript string
    Text(String),
    /// Segmented transcript; segments are joined in order
    Segments(Vec<TranscriptSegment>),
}

impl FinalizedUtterance {
    /// Extract the transcript as plain text regardless of representation
    pub fn text(&self) -> String {
        match self {
            FinalizedUtterance::Text(s) => s.clone(),
            FinalizedUtterance::Segments(segments) => segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl From<String> for FinalizedUtterance {
    fn from(s: String) -> Self {
        FinalizedUtterance::Text(s)
    }
}

impl From<&str> for FinalizedUtterance {
    fn from(s: &str) -> Self {
        FinalizedUtterance::Text(s.to_string())
    }
}
