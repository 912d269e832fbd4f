//! Lexical signal structures

use serde::{Deserialize, Serialize};

/// Dominant emotion category of a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Happy,
    Sad,
    Anxious,
    Angry,
    Calm,
    Tired,
    Excited,
    Neutral,
}

impl Emotion {
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Anxious => "anxious",
            Emotion::Angry => "angry",
            Emotion::Calm => "calm",
            Emotion::Tired => "tired",
            Emotion::Excited => "excited",
            Emotion::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Named life-area triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Work,
    Relationship,
    Health,
    Financial,
    Sleep,
    Exercise,
    Social,
}

impl Trigger {
    pub const ALL: [Trigger; 7] = [
        Trigger::Work,
        Trigger::Relationship,
        Trigger::Health,
        Trigger::Financial,
        Trigger::Sleep,
        Trigger::Exercise,
        Trigger::Social,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Trigger::Work => "work",
            Trigger::Relationship => "relationship",
            Trigger::Health => "health",
            Trigger::Financial => "financial",
            Trigger::Sleep => "sleep",
            Trigger::Exercise => "exercise",
            Trigger::Social => "social",
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Signal extracted from one chunk of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSignal {
    /// Offset from the scale center (-4.5..4.5)
    pub mood_delta: f64,
    pub energy_delta: f64,
    pub anxiety_delta: f64,
    pub triggers: Vec<Trigger>,
    pub emotion: Emotion,
    /// 0.0-1.0, grows with the weight of matched cues
    pub signal_strength: f64,
    /// 0.0-1.0, grows with cue count and text length
    pub confidence: f64,
    /// Number of cue matches (mood + energy + anxiety)
    pub cue_hits: usize,
    /// Words inside the recency window
    pub word_count: usize,
}

impl ChunkSignal {
    /// Zero-signal result for empty or cue-free text
    pub fn zero(word_count: usize, confidence: f64) -> Self {
        Self {
            mood_delta: 0.0,
            energy_delta: 0.0,
            anxiety_delta: 0.0,
            triggers: Vec::new(),
            emotion: Emotion::Neutral,
            signal_strength: 0.0,
            confidence,
            cue_hits: 0,
            word_count,
        }
    }

    /// Did any mood/energy/anxiety cue match?
    pub fn has_signal(&self) -> bool {
        self.cue_hits > 0
    }
}
