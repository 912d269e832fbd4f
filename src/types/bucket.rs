//! Chart aggregation types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::types::MoodRecord;

/// One raw entry feeding the charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSample {
    pub at: DateTime<Utc>,
    /// 0-100
    pub mood: f64,
    /// 1-10
    pub energy: f64,
    /// 1-10; the placeholder value means "never reported"
    pub anxiety: f64,
}

impl From<&MoodRecord> for MoodSample {
    fn from(record: &MoodRecord) -> Self {
        Self {
            at: record.created_at,
            mood: record.mood_score as f64,
            energy: record.energy_level as f64,
            anxiety: record.anxiety_level as f64,
        }
    }
}

/// Five-number summary of one metric in one bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub min: f64,
    pub max: f64,
}

/// Which row of the derivation table produced a derived anxiety value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationRule {
    LowMoodHighEnergy,
    LowMood,
    BelowAverageMood,
    HighMoodLowEnergy,
    HighMood,
    MidMoodHighEnergy,
    MidMood,
}

/// Inputs that a derived value was computed from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedBasis {
    pub mood_p50: f64,
    pub energy_p50: f64,
    pub rule: DerivationRule,
}

/// Anxiety with provenance: reported by the user, or back-filled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnxietyEstimate {
    Raw { value: MetricStats },
    Derived { value: f64, basis: DerivedBasis },
}

impl AnxietyEstimate {
    /// Central value regardless of provenance
    pub fn center(&self) -> f64 {
        match self {
            AnxietyEstimate::Raw { value } => value.p50,
            AnxietyEstimate::Derived { value, .. } => *value,
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, AnxietyEstimate::Derived { .. })
    }
}

/// Bucket width for chart aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
}

/// Aggregated samples of one time bucket.
///
/// Empty buckets carry `None` for every metric; render them as "no data".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    pub label: String,
    pub start: DateTime<Utc>,
    pub count: usize,
    pub mood: Option<MetricStats>,
    pub energy: Option<MetricStats>,
    pub anxiety: Option<AnxietyEstimate>,
}

impl AggregateBucket {
    pub fn empty(label: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            label: label.into(),
            start,
            count: 0,
            mood: None,
            energy: None,
            anxiety: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
