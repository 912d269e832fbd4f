//! Reason codes for gate decisions

use serde::{Deserialize, Serialize};

/// Why a chunk was or was not forwarded, and why a result was or was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum GateReason {
    // =========================================================================
    // C00x: Chunk gate (before analysis)
    // =========================================================================
    /// New suffix has fewer characters than the minimum
    C001_CHUNK_TOO_SHORT,
    /// New suffix has fewer words than the minimum
    C002_TOO_FEW_WORDS,
    /// Nothing new since the last processed text
    C003_NO_NEW_TEXT,
    /// An analysis is already running, this one is skipped
    C004_ANALYSIS_IN_FLIGHT,
    /// STT confidence too low for a partial
    C005_LOW_STT_CONFIDENCE,

    // =========================================================================
    // G00x: Acceptance gate (after analysis)
    // =========================================================================
    /// Result applied to the UI
    G001_ACCEPTED,
    /// Neither confidence nor signal strength reached its threshold
    G002_LOW_SIGNAL,
    /// Near-neutral result too soon after the last accepted update
    G003_NEUTRAL_FLICKER,
    /// Result belongs to a cancelled or replaced session
    G004_STALE,
}

impl GateReason {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::C001_CHUNK_TOO_SHORT => "C001_CHUNK_TOO_SHORT",
            Self::C002_TOO_FEW_WORDS => "C002_TOO_FEW_WORDS",
            Self::C003_NO_NEW_TEXT => "C003_NO_NEW_TEXT",
            Self::C004_ANALYSIS_IN_FLIGHT => "C004_ANALYSIS_IN_FLIGHT",
            Self::C005_LOW_STT_CONFIDENCE => "C005_LOW_STT_CONFIDENCE",
            Self::G001_ACCEPTED => "G001_ACCEPTED",
            Self::G002_LOW_SIGNAL => "G002_LOW_SIGNAL",
            Self::G003_NEUTRAL_FLICKER => "G003_NEUTRAL_FLICKER",
            Self::G004_STALE => "G004_STALE",
        }
    }

    /// Get human description
    pub fn description(&self) -> &'static str {
        match self {
            Self::C001_CHUNK_TOO_SHORT => "Chunk too short",
            Self::C002_TOO_FEW_WORDS => "Too few words",
            Self::C003_NO_NEW_TEXT => "No new text",
            Self::C004_ANALYSIS_IN_FLIGHT => "Analysis in flight",
            Self::C005_LOW_STT_CONFIDENCE => "Low recognizer confidence",
            Self::G001_ACCEPTED => "Accepted",
            Self::G002_LOW_SIGNAL => "Signal too weak",
            Self::G003_NEUTRAL_FLICKER => "Neutral flicker suppressed",
            Self::G004_STALE => "Stale session",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::G001_ACCEPTED)
    }
}

impl std::fmt::Display for GateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
