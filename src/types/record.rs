//! Persisted mood record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::types::Trigger;

/// Where a record's numbers came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Voice,
    Manual,
    Derived,
}

/// Final artifact of a check-in, handed to the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodRecord {
    /// 0-100, derivable from the valence coordinate
    pub mood_score: u8,
    /// 1-10
    pub energy_level: u8,
    /// 1-10
    pub anxiety_level: u8,
    pub notes: String,
    pub triggers: Vec<Trigger>,
    pub source: RecordSource,
    pub created_at: DateTime<Utc>,
}

impl MoodRecord {
    /// Build a record, clamping every field into its range
    pub fn new(
        mood_score: u8,
        energy_level: u8,
        anxiety_level: u8,
        notes: impl Into<String>,
        triggers: Vec<Trigger>,
        source: RecordSource,
    ) -> Self {
        Self {
            mood_score: mood_score.min(100),
            energy_level: energy_level.clamp(1, 10),
            anxiety_level: anxiety_level.clamp(1, 10),
            notes: notes.into(),
            triggers,
            source,
            created_at: Utc::now(),
        }
    }

    /// User-entered record
    pub fn manual(mood_score: u8, energy_level: u8, anxiety_level: u8, notes: impl Into<String>) -> Self {
        Self::new(mood_score, energy_level, anxiety_level, notes, Vec::new(), RecordSource::Manual)
    }
}
