//! Per-chunk analyzer output

use serde::{Deserialize, Serialize};
use crate::types::{Emotion, Trigger};

/// Projection of the carried state plus the current chunk's signal.
/// Rendered live, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 1-10
    pub mood_score: u8,
    /// 1-10
    pub energy_level: u8,
    /// 1-10
    pub anxiety_level: u8,
    /// Session confidence (0.0-1.0)
    pub confidence: f64,
    /// This chunk's signal strength (0.0-1.0)
    pub signal_strength: f64,
    /// Valence (-1..1)
    pub coord_x: f64,
    /// Arousal (-1..1)
    pub coord_y: f64,
    /// Should the UI apply this update?
    pub gate_active: bool,
    pub dominant_emotion: Emotion,
    pub triggers: Vec<Trigger>,
}

impl AnalysisResult {
    /// One-line summary for terminal output
    pub fn summary(&self) -> String {
        format!(
            "mood={} energy={} anxiety={} | x={:+.2} y={:+.2} | conf={:.2} sig={:.2} | {}{}",
            self.mood_score,
            self.energy_level,
            self.anxiety_level,
            self.coord_x,
            self.coord_y,
            self.confidence,
            self.signal_strength,
            self.dominant_emotion,
            if self.gate_active { "" } else { " (gated)" },
        )
    }
}
