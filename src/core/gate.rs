//! Debounce / gate controller
//!
//! Sits between the streaming recognizer and the analyzer:
//! - diffs each full hypothesis against the last processed text
//! - coalesces partials inside the debounce window (latest text wins)
//! - drops chunks below the minimum size without consuming them
//! - skips, never queues, while an analysis is in flight
//! - applies the acceptance gate to finished results
//!
//! Time is passed in as milliseconds so the policy is deterministic.

use log::debug;

use crate::config::GateConfig;
use crate::types::{AnalysisResult, GateReason, TranscriptChunk};
use crate::SCORE_CENTER;

/// A chunk cleared for analysis
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRequest {
    /// Session generation at the time the chunk was cut
    pub generation: u64,
    /// New suffix to analyze
    pub chunk: String,
    /// Full hypothesis the suffix was cut from
    pub full_text: String,
}

/// Outcome of a poll
#[derive(Debug, Clone, PartialEq)]
pub enum GatePoll {
    /// Nothing pending
    Idle,
    /// Pending text, debounce window still open
    Waiting { due_at_ms: u64 },
    /// Pending text was dropped
    Skipped(GateReason),
    /// Run the analyzer on this
    Ready(ChunkRequest),
}

#[derive(Debug, Clone)]
struct Pending {
    text: String,
    due_at_ms: u64,
}

#[derive(Debug)]
pub struct DebounceController {
    config: GateConfig,
    /// Score the neutral band is measured from; follows the mapper's center
    center: f64,
    generation: u64,
    processed_text: String,
    pending: Option<Pending>,
    in_flight: bool,
    last_accepted_ms: Option<u64>,
    analyses_started: u64,
}

impl DebounceController {
    pub fn new(config: GateConfig, generation: u64) -> Self {
        Self {
            config,
            center: SCORE_CENTER,
            generation,
            processed_text: String::new(),
            pending: None,
            in_flight: false,
            last_accepted_ms: None,
            analyses_started: 0,
        }
    }

    /// Measure the neutral band from `center` instead of the default
    pub fn with_center(mut self, center: f64) -> Self {
        self.center = center;
        self
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Chunks handed to the analyzer so far
    pub fn analyses_started(&self) -> u64 {
        self.analyses_started
    }

    pub fn processed_text(&self) -> &str {
        &self.processed_text
    }

    /// Record a recognizer update. Restarts the debounce window; final
    /// hypotheses are due immediately.
    pub fn on_transcript(&mut self, chunk: &TranscriptChunk) -> Option<GateReason> {
        if !chunk.is_final {
            if let Some(confidence) = chunk.confidence {
                if confidence < self.config.min_stt_confidence {
                    return Some(GateReason::C005_LOW_STT_CONFIDENCE);
                }
            }
        }
        let due_at_ms = if chunk.is_final {
            chunk.timestamp_ms
        } else {
            chunk.timestamp_ms + self.config.debounce_ms
        };
        self.pending = Some(Pending {
            text: chunk.text.clone(),
            due_at_ms,
        });
        None
    }

    /// Fire the debounced analysis if its window has closed
    pub fn poll(&mut self, now_ms: u64) -> GatePoll {
        let due_at_ms = match &self.pending {
            None => return GatePoll::Idle,
            Some(p) => p.due_at_ms,
        };
        if now_ms < due_at_ms {
            return GatePoll::Waiting { due_at_ms };
        }
        let pending = match self.pending.take() {
            Some(p) => p,
            None => return GatePoll::Idle,
        };

        if self.in_flight {
            debug!("analysis in flight, skipping pending chunk");
            return GatePoll::Skipped(GateReason::C004_ANALYSIS_IN_FLIGHT);
        }

        let suffix = new_suffix(&self.processed_text, &pending.text);
        if let Some(reason) = self.chunk_gate(suffix) {
            debug!("chunk {:?} held back: {}", suffix, reason.code());
            return GatePoll::Skipped(reason);
        }

        self.in_flight = true;
        self.analyses_started += 1;
        GatePoll::Ready(ChunkRequest {
            generation: self.generation,
            chunk: suffix.to_string(),
            full_text: pending.text,
        })
    }

    /// Minimum-size gate for a new suffix
    pub fn chunk_gate(&self, suffix: &str) -> Option<GateReason> {
        if suffix.is_empty() {
            Some(GateReason::C003_NO_NEW_TEXT)
        } else if suffix.chars().count() < self.config.min_chunk_chars {
            Some(GateReason::C001_CHUNK_TOO_SHORT)
        } else if suffix.split_whitespace().count() < self.config.min_chunk_words {
            Some(GateReason::C002_TOO_FEW_WORDS)
        } else {
            None
        }
    }

    /// Finish an analysis and decide whether the UI applies it
    pub fn complete(&mut self, request: &ChunkRequest, result: &AnalysisResult, now_ms: u64) -> GateReason {
        if request.generation != self.generation {
            return GateReason::G004_STALE;
        }
        self.in_flight = false;
        self.processed_text = request.full_text.clone();

        let strong_enough = result.signal_strength > 0.0
            && (result.confidence >= self.config.confidence_threshold
                || result.signal_strength >= self.config.signal_threshold);
        if !strong_enough {
            return GateReason::G002_LOW_SIGNAL;
        }

        let near_neutral = (result.mood_score as f64 - self.center).abs() <= self.config.neutral_band
            && (result.energy_level as f64 - self.center).abs() <= self.config.neutral_band;
        let too_soon = self
            .last_accepted_ms
            .map(|last| now_ms.saturating_sub(last) < self.config.neutral_hold_ms)
            .unwrap_or(false);
        if near_neutral && too_soon {
            return GateReason::G003_NEUTRAL_FLICKER;
        }

        self.last_accepted_ms = Some(now_ms);
        GateReason::G001_ACCEPTED
    }

    /// Text of `full_text` not yet processed (used when flushing on finalize)
    pub fn unprocessed<'a>(&self, full_text: &'a str) -> &'a str {
        new_suffix(&self.processed_text, full_text)
    }

    /// Mark text as processed without a live analysis
    pub fn mark_processed(&mut self, full_text: &str) {
        self.processed_text = full_text.to_string();
        self.pending = None;
    }

    /// Drop pending work and invalidate in-flight results
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.in_flight = false;
        self.processed_text.clear();
        self.last_accepted_ms = None;
    }
}

/// Portion of `full` that is new relative to `processed`.
///
/// Streaming recognizers re-emit the whole hypothesis and sometimes revise
/// its tail, so the cut backs up to a word start when it lands mid-word.
pub fn new_suffix<'a>(processed: &str, full: &'a str) -> &'a str {
    let common: usize = full
        .chars()
        .zip(processed.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf8())
        .sum();

    let mut cut = common;
    if cut > 0 && cut < full.len() {
        let before = full[..cut].chars().next_back();
        let at = full[cut..].chars().next();
        let mid_word = matches!((before, at), (Some(b), Some(a)) if !b.is_whitespace() && !a.is_whitespace());
        if mid_word {
            cut = full[..cut]
                .char_indices()
                .rev()
                .find(|(_, c)| c.is_whitespace())
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
        }
    }
    full[cut..].trim()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Emotion;
    use crate::DEBOUNCE_MS;

    fn controller() -> DebounceController {
        DebounceController::new(GateConfig::default(), 1)
    }

    fn result(mood: u8, energy: u8, confidence: f64, signal: f64) -> AnalysisResult {
        AnalysisResult {
            mood_score: mood,
            energy_level: energy,
            anxiety_level: 5,
            confidence,
            signal_strength: signal,
            coord_x: 0.0,
            coord_y: 0.0,
            gate_active: true,
            dominant_emotion: Emotion::Neutral,
            triggers: Vec::new(),
        }
    }

    fn ready(poll: GatePoll) -> ChunkRequest {
        match poll {
            GatePoll::Ready(req) => req,
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[test]
    fn test_new_suffix_plain_extension() {
        assert_eq!(new_suffix("bugün çok", "bugün çok kötüyüm ama"), "kötüyüm ama");
        assert_eq!(new_suffix("", "merhaba dünya"), "merhaba dünya");
        assert_eq!(new_suffix("aynı metin", "aynı metin"), "");
    }

    #[test]
    fn test_new_suffix_word_extended_mid_word() {
        assert_eq!(new_suffix("şimdi rahat", "şimdi rahatladım"), "rahatladım");
    }

    #[test]
    fn test_new_suffix_revised_tail() {
        assert_eq!(new_suffix("bugün çok kötü", "bugün çok güzel geçti"), "güzel geçti");
    }

    #[test]
    fn test_debounce_coalesces_to_latest() {
        let mut c = controller();
        c.on_transcript(&TranscriptChunk::partial("bugün çok", 0));
        c.on_transcript(&TranscriptChunk::partial("bugün çok kötü hissediyorum", 100));

        assert!(matches!(c.poll(200), GatePoll::Waiting { .. }));
        let req = ready(c.poll(100 + DEBOUNCE_MS));
        assert_eq!(req.chunk, "bugün çok kötü hissediyorum");
        assert_eq!(c.analyses_started(), 1);
        assert_eq!(c.poll(10_000), GatePoll::Idle);
    }

    #[test]
    fn test_final_hypothesis_is_due_immediately() {
        let mut c = controller();
        c.on_transcript(&TranscriptChunk::final_text("bugün çok yorgunum", 50));
        assert!(matches!(c.poll(50), GatePoll::Ready(_)));
    }

    #[test]
    fn test_short_chunk_not_consumed() {
        let mut c = controller();
        c.on_transcript(&TranscriptChunk::final_text("iyi", 0));
        assert_eq!(c.poll(0), GatePoll::Skipped(GateReason::C001_CHUNK_TOO_SHORT));
        assert_eq!(c.processed_text(), "");

        c.on_transcript(&TranscriptChunk::final_text("kesinlikle", 10));
        assert_eq!(c.poll(10), GatePoll::Skipped(GateReason::C002_TOO_FEW_WORDS));

        c.on_transcript(&TranscriptChunk::final_text("iyi hissediyorum", 20));
        let req = ready(c.poll(20));
        assert_eq!(req.chunk, "iyi hissediyorum");
    }

    #[test]
    fn test_in_flight_skips_instead_of_queueing() {
        let mut c = controller();
        c.on_transcript(&TranscriptChunk::final_text("bugün çok yorgunum", 0));
        let req = ready(c.poll(0));
        assert!(c.is_in_flight());

        c.on_transcript(&TranscriptChunk::final_text("bugün çok yorgunum ve gerginim", 10));
        assert_eq!(c.poll(10), GatePoll::Skipped(GateReason::C004_ANALYSIS_IN_FLIGHT));
        assert_eq!(c.poll(20), GatePoll::Idle);

        c.complete(&req, &result(3, 3, 0.5, 0.6), 30);
        assert!(!c.is_in_flight());
        assert_eq!(c.unprocessed("bugün çok yorgunum ve gerginim"), "ve gerginim");
    }

    #[test]
    fn test_low_stt_confidence_partial_ignored() {
        let mut c = controller();
        let chunk = TranscriptChunk::partial("belki iyiyim galiba", 0).with_confidence(0.05);
        assert_eq!(c.on_transcript(&chunk), Some(GateReason::C005_LOW_STT_CONFIDENCE));
        assert_eq!(c.poll(10_000), GatePoll::Idle);
    }

    #[test]
    fn test_acceptance_gate() {
        let mut c = controller();
        let req = ChunkRequest { generation: 1, chunk: "x".into(), full_text: "x".into() };

        assert_eq!(c.complete(&req, &result(3, 5, 0.1, 0.1), 0), GateReason::G002_LOW_SIGNAL);
        assert_eq!(c.complete(&req, &result(3, 5, 0.1, 0.0), 0), GateReason::G002_LOW_SIGNAL);
        assert_eq!(c.complete(&req, &result(3, 5, 0.5, 0.1), 0), GateReason::G001_ACCEPTED);
        assert_eq!(c.complete(&req, &result(8, 5, 0.1, 0.5), 100), GateReason::G001_ACCEPTED);
    }

    #[test]
    fn test_neutral_flicker_suppressed_only_when_recent() {
        let mut c = controller();
        let req = ChunkRequest { generation: 1, chunk: "x".into(), full_text: "x".into() };
        assert_eq!(c.complete(&req, &result(3, 4, 0.5, 0.5), 0), GateReason::G001_ACCEPTED);
        assert_eq!(c.complete(&req, &result(6, 5, 0.5, 0.5), 500), GateReason::G003_NEUTRAL_FLICKER);
        assert_eq!(c.complete(&req, &result(6, 5, 0.5, 0.5), 5_000), GateReason::G001_ACCEPTED);
    }

    #[test]
    fn test_neutral_band_follows_configured_center() {
        let req = ChunkRequest { generation: 1, chunk: "x".into(), full_text: "x".into() };

        let mut default_center = controller();
        default_center.complete(&req, &result(2, 2, 0.5, 0.5), 0);
        assert_eq!(default_center.complete(&req, &result(6, 6, 0.5, 0.5), 500), GateReason::G003_NEUTRAL_FLICKER);

        let mut low_center = controller().with_center(5.0);
        low_center.complete(&req, &result(2, 2, 0.5, 0.5), 0);
        assert_eq!(low_center.complete(&req, &result(6, 6, 0.5, 0.5), 500), GateReason::G001_ACCEPTED);
        assert_eq!(low_center.complete(&req, &result(5, 5, 0.5, 0.5), 600), GateReason::G003_NEUTRAL_FLICKER);

        let mut high_center = controller().with_center(7.0);
        high_center.complete(&req, &result(2, 2, 0.5, 0.5), 0);
        assert_eq!(high_center.complete(&req, &result(7, 7, 0.5, 0.5), 500), GateReason::G003_NEUTRAL_FLICKER);
    }

    #[test]
    fn test_cancel_makes_results_stale() {
        let mut c = controller();
        c.on_transcript(&TranscriptChunk::final_text("bugün çok yorgunum", 0));
        let req = ready(c.poll(0));
        c.cancel();
        assert_eq!(c.complete(&req, &result(3, 3, 0.9, 0.9), 10), GateReason::G004_STALE);
        assert_eq!(c.processed_text(), "");
        assert!(!c.is_in_flight());
    }
}
