//! Coordinate mapper: 1-10 scores ↔ valence/arousal plane
//!
//! forward: n = (score - center) / half_range, curved = sign(n)·|n|^γ·gain,
//! clamped to [-1, 1]. The inverse undoes the curve; scores that saturate
//! the plane edge come back within one unit.

use crate::config::MappingConfig;
use crate::{SCORE_MAX, SCORE_MIN};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordMapper {
    center: f64,
    gamma: f64,
    gain: f64,
}

impl Default for CoordMapper {
    fn default() -> Self {
        Self::new(&MappingConfig::default())
    }
}

impl CoordMapper {
    pub fn new(config: &MappingConfig) -> Self {
        Self {
            center: config.center.clamp(SCORE_MIN, SCORE_MAX),
            gamma: config.gamma,
            gain: config.gain,
        }
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    /// Distance from the center to the scale end on the side of `n`
    fn half_range(&self, positive: bool) -> f64 {
        let span = if positive { SCORE_MAX - self.center } else { self.center - SCORE_MIN };
        span.max(f64::EPSILON)
    }

    /// 1-10 score → [-1, 1]. Non-finite input lands on the center.
    pub fn score_to_coord(&self, score: f64) -> f64 {
        if !score.is_finite() {
            return 0.0;
        }
        let offset = score.clamp(SCORE_MIN, SCORE_MAX) - self.center;
        let n = (offset / self.half_range(offset >= 0.0)).clamp(-1.0, 1.0);
        let curved = n.signum() * n.abs().powf(self.gamma) * self.gain;
        if curved.is_finite() {
            curved.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// [-1, 1] → 1-10 score
    pub fn coord_to_score(&self, coord: f64) -> f64 {
        if !coord.is_finite() {
            return self.center;
        }
        let c = coord.clamp(-1.0, 1.0);
        let n = (c.signum() * (c.abs() / self.gain).powf(1.0 / self.gamma)).clamp(-1.0, 1.0);
        let score = self.center + n * self.half_range(n >= 0.0);
        if score.is_finite() {
            score.clamp(SCORE_MIN, SCORE_MAX)
        } else {
            self.center
        }
    }

    /// Valence coordinate → persisted 0-100 mood score
    pub fn coord_to_mood_percent(&self, coord: f64) -> u8 {
        score_to_percent(self.coord_to_score(coord)).round() as u8
    }

    /// Persisted 0-100 mood score → valence coordinate
    pub fn mood_percent_to_coord(&self, percent: f64) -> f64 {
        self.score_to_coord(percent_to_score(percent))
    }

    /// Arousal coordinate → persisted 1-10 energy level
    pub fn coord_to_energy_level(&self, coord: f64) -> u8 {
        to_level(self.coord_to_score(coord))
    }
}

/// 1-10 score → 0-100
pub fn score_to_percent(score: f64) -> f64 {
    if !score.is_finite() {
        return 50.0;
    }
    ((score.clamp(SCORE_MIN, SCORE_MAX) - SCORE_MIN) / (SCORE_MAX - SCORE_MIN) * 100.0).clamp(0.0, 100.0)
}

/// 0-100 → 1-10 score
pub fn percent_to_score(percent: f64) -> f64 {
    if !percent.is_finite() {
        return (SCORE_MIN + SCORE_MAX) / 2.0;
    }
    SCORE_MIN + percent.clamp(0.0, 100.0) / 100.0 * (SCORE_MAX - SCORE_MIN)
}

/// Round a 1-10 score to an integer level
pub fn to_level(score: f64) -> u8 {
    if !score.is_finite() {
        return ((SCORE_MIN + SCORE_MAX) / 2.0).round() as u8;
    }
    score.round().clamp(SCORE_MIN, SCORE_MAX) as u8
}

/// Forward mapping with the default curve
pub fn score_to_coord(score: f64) -> f64 {
    CoordMapper::default().score_to_coord(score)
}

/// Inverse mapping with the default curve
pub fn coord_to_score(coord: f64) -> f64 {
    CoordMapper::default().coord_to_score(coord)
}

// =============================================================================
// TESTS
// =============================================================================
