//! Transcript fragments delivered by the speech-to-text collaborator

use serde::{Deserialize, Serialize};

/// One streaming STT update. Streaming engines usually re-emit the whole
/// hypothesis, so `text` is typically a super-string of the previous update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub text: String,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub timestamp_ms: u64,
    /// Recognizer confidence (0.0-1.0), when the engine reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl TranscriptChunk {
    /// Partial (interim) hypothesis
    pub fn partial(text: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            timestamp_ms,
            confidence: None,
        }
    }

    /// Final hypothesis
    pub fn final_text(text: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            timestamp_ms,
            confidence: None,
        }
    }

    /// Attach recognizer confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
