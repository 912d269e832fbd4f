//! Crisis detector types

use serde::{Deserialize, Serialize};

/// Risk-language families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisCategory {
    SelfHarm,
    Hopelessness,
    Plan,
    Violence,
}

/// One entry of the risk-language list (regex over lowercased text)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisPattern {
    pub category: CrisisCategory,
    pub pattern: String,
}

impl CrisisPattern {
    pub fn new(category: CrisisCategory, pattern: impl Into<String>) -> Self {
        Self {
            category,
            pattern: pattern.into(),
        }
    }
}

/// Result of a crisis scan. Pure function of the scanned text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisResult {
    pub flagged: bool,
    /// Matched phrases, de-duplicated, in order of appearance
    pub hits: Vec<String>,
    pub categories: Vec<CrisisCategory>,
}

impl CrisisResult {
    pub fn clear() -> Self {
        Self {
            flagged: false,
            hits: Vec::new(),
            categories: Vec::new(),
        }
    }
}
