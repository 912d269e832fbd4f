//! Moodvoice: real-time voice check-in mood estimator
//!
//! Pipeline: partial transcript → debounce gate → lexical signals →
//! EMA state carrier → acceptance gate → valence/arousal coordinates.
//! The crisis detector runs alongside on every accepted chunk.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

// =============================================================================
// SCALE
// =============================================================================

/// Lowest score on the 1-10 scales
pub const SCORE_MIN: f64 = 1.0;

/// Highest score on the 1-10 scales
pub const SCORE_MAX: f64 = 10.0;

/// Canonical center of the 1-10 scale. Used by live preview, final save and
/// the statistics layer alike.
pub const SCORE_CENTER: f64 = 5.5;

/// Half-width of the 1-10 scale around the center
pub const SCORE_HALF_RANGE: f64 = 4.5;

/// Anxiety value the app writes when the user never reported anxiety
pub const ANXIETY_PLACEHOLDER: f64 = 5.0;

// =============================================================================
// COORDINATE CURVE
// =============================================================================

/// Gamma applied to |n| before gain (< 1 lifts small movements)
pub const COORD_GAMMA: f64 = 0.85;

/// Gain applied after gamma, clamped to the unit plane
pub const COORD_GAIN: f64 = 1.1;

// =============================================================================
// SMOOTHING
// =============================================================================

/// Alpha for the first signal-bearing chunk
pub const ALPHA_BOOTSTRAP: f64 = 0.85;

/// Alpha multiplier per absorbed signal chunk
pub const ALPHA_DECAY: f64 = 0.7;

/// Alpha never drops below this
pub const ALPHA_FLOOR: f64 = 0.3;

/// Share of a chunk's confidence that accumulates into session confidence
pub const CONFIDENCE_GAIN: f64 = 0.8;

/// Share of a chunk's signal strength that accumulates into session signal
pub const SIGNAL_GAIN: f64 = 0.6;

// =============================================================================
// GATES
// =============================================================================

/// Minimum characters in a new-suffix chunk
pub const MIN_CHUNK_CHARS: usize = 8;

/// Minimum words in a new-suffix chunk
pub const MIN_CHUNK_WORDS: usize = 2;

/// Debounce window for partial transcripts (milliseconds)
pub const DEBOUNCE_MS: u64 = 350;

/// Session confidence that opens the acceptance gate
pub const GATE_CONFIDENCE: f64 = 0.35;

/// Chunk signal strength that opens the acceptance gate
pub const GATE_SIGNAL: f64 = 0.3;

/// Scores within this distance of the center count as neutral
pub const NEUTRAL_BAND: f64 = 0.75;

/// Neutral-looking updates this soon after an accepted one are suppressed
pub const NEUTRAL_HOLD_MS: u64 = 1500;

/// Non-final partials below this STT confidence are ignored
pub const MIN_STT_CONFIDENCE: f64 = 0.2;

// =============================================================================
// LEXICON
// =============================================================================

/// Words kept at the tail of the recency window
pub const RECENCY_WINDOW_WORDS: usize = 12;

// =============================================================================
// STATISTICS
// =============================================================================

/// Opacity of the oldest sample in a visible window
pub const RECENCY_ALPHA_MIN: f64 = 0.25;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "0.4.0";
