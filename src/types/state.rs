//! State carrier for one live check-in

use serde::{Deserialize, Serialize};
use crate::types::{Emotion, Trigger};
use crate::SCORE_CENTER;

/// Cumulative smoothed estimate of one check-in session.
///
/// Owned by exactly one session and mutated only by the incremental
/// analyzer. Dropped on cancel, never carried into another session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeState {
    pub ema_mood: f64,
    pub ema_energy: f64,
    pub ema_anxiety: f64,
    /// Accumulated confidence, saturates toward 1.0
    pub confidence: f64,
    /// Accumulated signal strength, saturates toward 1.0
    pub signal_strength: f64,
    /// Last chunk handed to the analyzer
    pub last_seen_text: String,
    pub crisis_flagged: bool,
    /// Chunks analyzed, including zero-signal ones
    pub chunks_analyzed: u32,
    /// Chunks that carried at least one cue; drives the alpha schedule
    pub signal_chunks: u32,
    /// Ordered union of triggers seen in this session
    pub triggers: Vec<Trigger>,
    pub last_emotion: Emotion,
}

impl Default for RealtimeState {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeState {
    /// Neutral state at the scale center
    pub fn new() -> Self {
        Self::centered(SCORE_CENTER)
    }

    /// Neutral state around a custom center
    pub fn centered(center: f64) -> Self {
        Self {
            ema_mood: center,
            ema_energy: center,
            ema_anxiety: center,
            confidence: 0.0,
            signal_strength: 0.0,
            last_seen_text: String::new(),
            crisis_flagged: false,
            chunks_analyzed: 0,
            signal_chunks: 0,
            triggers: Vec::new(),
            last_emotion: Emotion::Neutral,
        }
    }

    /// Has any chunk contributed signal yet?
    pub fn has_evidence(&self) -> bool {
        self.signal_chunks > 0
    }

    /// Merge triggers keeping first-seen order
    pub fn absorb_triggers(&mut self, triggers: &[Trigger]) {
        for t in triggers {
            if !self.triggers.contains(t) {
                self.triggers.push(*t);
            }
        }
    }
}
