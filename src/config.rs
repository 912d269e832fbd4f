//! Estimator configuration
//!
//! Every field has a default, so a config file only needs the values it
//! overrides. Files are JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::crisis::default_patterns;
use crate::error::ConfigError;
use crate::types::CrisisPattern;
use crate::{
    ALPHA_BOOTSTRAP, ALPHA_DECAY, ALPHA_FLOOR, CONFIDENCE_GAIN, COORD_GAIN, COORD_GAMMA,
    DEBOUNCE_MS, GATE_CONFIDENCE, GATE_SIGNAL, MIN_CHUNK_CHARS, MIN_CHUNK_WORDS,
    MIN_STT_CONFIDENCE, NEUTRAL_BAND, NEUTRAL_HOLD_MS, RECENCY_WINDOW_WORDS, SCORE_CENTER,
    SCORE_MAX, SCORE_MIN, SIGNAL_GAIN,
};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub gate: GateConfig,
    pub smoothing: SmoothingConfig,
    pub mapping: MappingConfig,
    pub lexicon: LexiconConfig,
    pub crisis: CrisisConfig,
}

/// Debounce and acceptance gate policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub min_chunk_chars: usize,
    pub min_chunk_words: usize,
    pub debounce_ms: u64,
    pub confidence_threshold: f64,
    pub signal_threshold: f64,
    pub neutral_band: f64,
    pub neutral_hold_ms: u64,
    pub min_stt_confidence: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_chunk_chars: MIN_CHUNK_CHARS,
            min_chunk_words: MIN_CHUNK_WORDS,
            debounce_ms: DEBOUNCE_MS,
            confidence_threshold: GATE_CONFIDENCE,
            signal_threshold: GATE_SIGNAL,
            neutral_band: NEUTRAL_BAND,
            neutral_hold_ms: NEUTRAL_HOLD_MS,
            min_stt_confidence: MIN_STT_CONFIDENCE,
        }
    }
}

/// EMA schedule and evidence accumulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub alpha_bootstrap: f64,
    pub alpha_decay: f64,
    pub alpha_floor: f64,
    pub confidence_gain: f64,
    pub signal_gain: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha_bootstrap: ALPHA_BOOTSTRAP,
            alpha_decay: ALPHA_DECAY,
            alpha_floor: ALPHA_FLOOR,
            confidence_gain: CONFIDENCE_GAIN,
            signal_gain: SIGNAL_GAIN,
        }
    }
}

impl SmoothingConfig {
    /// Alpha for the next chunk after `absorbed` signal-bearing chunks
    pub fn alpha(&self, absorbed: u32) -> f64 {
        let decayed = self.alpha_bootstrap * self.alpha_decay.powi(absorbed.min(64) as i32);
        decayed.max(self.alpha_floor)
    }
}

/// Score ↔ plane mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub center: f64,
    pub gamma: f64,
    pub gain: f64,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            center: SCORE_CENTER,
            gamma: COORD_GAMMA,
            gain: COORD_GAIN,
        }
    }
}

/// Lexical extractor knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    pub recency_window_words: usize,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            recency_window_words: RECENCY_WINDOW_WORDS,
        }
    }
}

/// Risk-language list, kept as data so it can be audited and extended
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrisisConfig {
    pub patterns: Vec<CrisisPattern>,
}

impl Default for CrisisConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }
}

impl EstimatorConfig {
    /// Load from a JSON file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse from a JSON string and validate
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.mapping;
        if !(SCORE_MIN..=SCORE_MAX).contains(&m.center) {
            return Err(ConfigError::OutOfRange { field: "mapping.center", value: m.center });
        }
        if !(m.gamma > 0.0 && m.gamma.is_finite()) {
            return Err(ConfigError::OutOfRange { field: "mapping.gamma", value: m.gamma });
        }
        if !(m.gain > 0.0 && m.gain.is_finite()) {
            return Err(ConfigError::OutOfRange { field: "mapping.gain", value: m.gain });
        }

        let unit_fields = [
            ("gate.confidence_threshold", self.gate.confidence_threshold),
            ("gate.signal_threshold", self.gate.signal_threshold),
            ("gate.min_stt_confidence", self.gate.min_stt_confidence),
            ("smoothing.alpha_bootstrap", self.smoothing.alpha_bootstrap),
            ("smoothing.alpha_decay", self.smoothing.alpha_decay),
            ("smoothing.alpha_floor", self.smoothing.alpha_floor),
            ("smoothing.confidence_gain", self.smoothing.confidence_gain),
            ("smoothing.signal_gain", self.smoothing.signal_gain),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }

        if self.lexicon.recency_window_words == 0 {
            return Err(ConfigError::OutOfRange { field: "lexicon.recency_window_words", value: 0.0 });
        }
        Ok(())
    }
}
