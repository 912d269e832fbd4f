//! Incremental analyzer: merges each chunk's signal into the carried state
//!
//! ema = α·chunk + (1-α)·ema_prev, with α large for the first signal-bearing
//! chunks and decaying to a floor. Zero-signal chunks leave scores untouched.
//! Confidence and signal strength accumulate as 1-(1-acc)(1-gain·chunk).

use log::debug;

use crate::config::{EstimatorConfig, SmoothingConfig};
use crate::core::coords::{to_level, CoordMapper};
use crate::core::crisis::CrisisDetector;
use crate::core::lexicon::LexicalExtractor;
use crate::types::{AnalysisResult, CrisisResult, Emotion, RealtimeState};
use crate::{GATE_CONFIDENCE, GATE_SIGNAL, SCORE_MAX, SCORE_MIN};

#[derive(Debug, Clone)]
pub struct IncrementalAnalyzer {
    extractor: LexicalExtractor,
    crisis: CrisisDetector,
    smoothing: SmoothingConfig,
    mapper: CoordMapper,
    confidence_threshold: f64,
    signal_threshold: f64,
}

impl Default for IncrementalAnalyzer {
    fn default() -> Self {
        Self {
            extractor: LexicalExtractor::new(),
            crisis: CrisisDetector::default(),
            smoothing: SmoothingConfig::default(),
            mapper: CoordMapper::default(),
            confidence_threshold: GATE_CONFIDENCE,
            signal_threshold: GATE_SIGNAL,
        }
    }
}

impl IncrementalAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from config with an already compiled crisis list
    pub fn with_config(config: &EstimatorConfig, crisis: CrisisDetector) -> Self {
        Self {
            extractor: LexicalExtractor::with_config(&config.lexicon),
            crisis,
            smoothing: config.smoothing.clone(),
            mapper: CoordMapper::new(&config.mapping),
            confidence_threshold: config.gate.confidence_threshold,
            signal_threshold: config.gate.signal_threshold,
        }
    }

    pub fn mapper(&self) -> &CoordMapper {
        &self.mapper
    }

    /// Fresh state carrier for a new check-in
    pub fn begin_realtime(&self) -> RealtimeState {
        RealtimeState::centered(self.mapper.center())
    }

    /// Merge one chunk (the new suffix only) into `state`
    pub fn incremental_analyze(&self, state: &mut RealtimeState, chunk_text: &str) -> AnalysisResult {
        state.chunks_analyzed += 1;
        state.last_seen_text = chunk_text.to_string();

        let signal = self.extractor.analyze_chunk(chunk_text);
        state.absorb_triggers(&signal.triggers);

        if !signal.has_signal() {
            debug!("chunk #{} carried no cues, state unchanged", state.chunks_analyzed);
            return self.project(state, 0.0, false);
        }

        let alpha = self.smoothing.alpha(state.signal_chunks);
        let center = self.mapper.center();
        state.ema_mood = directed_ema(alpha, center, signal.mood_delta, state.ema_mood);
        state.ema_energy = directed_ema(alpha, center, signal.energy_delta, state.ema_energy);
        state.ema_anxiety = directed_ema(alpha, center, signal.anxiety_delta, state.ema_anxiety);

        state.confidence = accumulate(state.confidence, self.smoothing.confidence_gain * signal.confidence);
        state.signal_strength =
            accumulate(state.signal_strength, self.smoothing.signal_gain * signal.signal_strength);
        state.signal_chunks += 1;
        state.last_emotion = signal.emotion;

        let gate_active = state.confidence >= self.confidence_threshold
            || signal.signal_strength >= self.signal_threshold;

        debug!(
            "chunk #{} α={:.2} mood={:.2} energy={:.2} anxiety={:.2} conf={:.2} sig={:.2} gate={}",
            state.chunks_analyzed,
            alpha,
            state.ema_mood,
            state.ema_energy,
            state.ema_anxiety,
            state.confidence,
            signal.signal_strength,
            gate_active
        );

        self.project(state, signal.signal_strength, gate_active)
    }

    /// Crisis scan of the raw chunk. Returns a result only the first time the
    /// session gets flagged; later hits are left to the caller's UI.
    pub fn screen(&self, state: &mut RealtimeState, chunk_text: &str) -> Option<CrisisResult> {
        let result = self.crisis.detect(chunk_text);
        if result.flagged && !state.crisis_flagged {
            state.crisis_flagged = true;
            Some(result)
        } else {
            None
        }
    }

    /// Stateless crisis scan
    pub fn detect_crisis(&self, text: &str) -> CrisisResult {
        self.crisis.detect(text)
    }

    /// One-shot analysis of a whole transcript, sentence by sentence
    pub fn analyze_transcript(&self, transcript: &str) -> (RealtimeState, AnalysisResult) {
        let mut state = self.begin_realtime();
        for sentence in transcript
            .split(|c: char| matches!(c, '.' | '!' | '?' | ';' | '\n'))
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            self.incremental_analyze(&mut state, sentence);
        }
        let result = self.project(&state, state.signal_strength, state.has_evidence());
        (state, result)
    }

    /// Current estimate as a UI-facing result
    pub fn project(&self, state: &RealtimeState, signal_strength: f64, gate_active: bool) -> AnalysisResult {
        AnalysisResult {
            mood_score: to_level(state.ema_mood),
            energy_level: to_level(state.ema_energy),
            anxiety_level: to_level(state.ema_anxiety),
            confidence: state.confidence,
            signal_strength,
            coord_x: self.mapper.score_to_coord(state.ema_mood),
            coord_y: self.mapper.score_to_coord(state.ema_energy),
            gate_active,
            dominant_emotion: if state.has_evidence() { state.last_emotion } else { Emotion::Neutral },
            triggers: state.triggers.clone(),
        }
    }
}

fn ema(alpha: f64, sample: f64, previous: f64) -> f64 {
    let next = alpha * sample + (1.0 - alpha) * previous;
    if next.is_finite() {
        next.clamp(SCORE_MIN, SCORE_MAX)
    } else {
        previous
    }
}

/// EMA toward `center + delta` that never moves against the delta's sign:
/// a positive chunk cannot lower the prior, a negative one cannot raise it.
fn directed_ema(alpha: f64, center: f64, delta: f64, previous: f64) -> f64 {
    let next = ema(alpha, center + delta, previous);
    if delta > 0.0 {
        next.max(previous)
    } else if delta < 0.0 {
        next.min(previous)
    } else {
        next
    }
}

fn accumulate(acc: f64, evidence: f64) -> f64 {
    (1.0 - (1.0 - acc) * (1.0 - evidence.clamp(0.0, 1.0))).clamp(0.0, 1.0)
}

/// Fresh state with the default configuration
pub fn begin_realtime() -> RealtimeState {
    RealtimeState::new()
}

/// Incremental analysis with the default configuration
pub fn incremental_analyze(state: &mut RealtimeState, chunk_text: &str) -> AnalysisResult {
    IncrementalAnalyzer::default().incremental_analyze(state, chunk_text)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trigger;
    use crate::SCORE_CENTER;

    #[test]
    fn test_begin_is_neutral() {
        let state = begin_realtime();
        assert_eq!(state.ema_mood, SCORE_CENTER);
        assert_eq!(state.confidence, 0.0);
        assert!(!state.has_evidence());
    }

    #[test]
    fn test_empty_chunk_leaves_scores() {
        let mut state = begin_realtime();
        incremental_analyze(&mut state, "bugün çok kötü hissediyorum");
        let before = (state.ema_mood, state.ema_energy, state.ema_anxiety);

        let result = incremental_analyze(&mut state, "   ");
        assert_eq!(result.signal_strength, 0.0);
        assert!(!result.gate_active);
        assert_eq!((state.ema_mood, state.ema_energy, state.ema_anxiety), before);
    }

    #[test]
    fn test_negative_then_contrast_recovers() {
        let mut state = begin_realtime();
        let first = incremental_analyze(&mut state, "bugün çok kötü hissediyorum");
        assert!(first.mood_score <= 3, "got {}", first.mood_score);
        assert!(first.coord_x < 0.0);
        assert!(first.gate_active);

        let second = incremental_analyze(&mut state, "ama şimdi rahatladım");
        assert!(second.mood_score > first.mood_score);
        assert!(second.coord_x > first.coord_x);
    }

    #[test]
    fn test_bootstrap_moves_faster_than_later_chunks() {
        let analyzer = IncrementalAnalyzer::new();
        let mut state = analyzer.begin_realtime();
        analyzer.incremental_analyze(&mut state, "bugün mutluyum");
        let first_jump = state.ema_mood - SCORE_CENTER;

        let mut late = analyzer.begin_realtime();
        for _ in 0..6 {
            analyzer.incremental_analyze(&mut late, "hiçbir şey yapmadım ama iyiyim");
        }
        let settled = late.ema_mood;
        analyzer.incremental_analyze(&mut late, "bugün çok kötüyüm");
        let late_jump = (settled - late.ema_mood).abs();

        assert!(first_jump > 0.0);
        let first_alpha = SmoothingConfig::default().alpha(0);
        let late_alpha = SmoothingConfig::default().alpha(6);
        assert!(late_alpha < first_alpha);
        assert!(late_jump < (settled - 1.0) * first_alpha);
    }

    #[test]
    fn test_more_positive_cues_never_lower_ema() {
        let analyzer = IncrementalAnalyzer::new();
        let mut prior = analyzer.begin_realtime();
        analyzer.incremental_analyze(&mut prior, "biraz yorgunum ve üzgünüm");

        let mut sparse = prior.clone();
        let mut dense = prior.clone();
        analyzer.incremental_analyze(&mut sparse, "şu an iyiyim");
        analyzer.incremental_analyze(&mut dense, "şu an iyiyim mutluyum ve huzurluyum");
        assert!(dense.ema_mood >= sparse.ema_mood);
    }

    #[test]
    fn test_positive_cues_never_lower_a_high_prior() {
        let analyzer = IncrementalAnalyzer::new();
        let mut prior = analyzer.begin_realtime();
        for _ in 0..4 {
            analyzer.incremental_analyze(&mut prior, "bugün gerçekten çok mutluyum ve harikayım");
        }
        assert!(prior.ema_mood > 9.0, "got {}", prior.ema_mood);

        let densities = ["bugün markete gittim", "bugün markete gittim iyiyim", "bugün markete gittim iyiyim mutluyum"];
        let moods: Vec<f64> = densities
            .iter()
            .map(|text| {
                let mut state = prior.clone();
                analyzer.incremental_analyze(&mut state, text);
                state.ema_mood
            })
            .collect();
        assert_eq!(moods[0], prior.ema_mood);
        assert!(moods[1] >= moods[0], "{:?}", moods);
        assert!(moods[2] >= moods[1], "{:?}", moods);
    }

    #[test]
    fn test_negative_cues_never_raise_a_low_prior() {
        let analyzer = IncrementalAnalyzer::new();
        let mut prior = analyzer.begin_realtime();
        for _ in 0..4 {
            analyzer.incremental_analyze(&mut prior, "bugün çok kötüyüm ve berbatım");
        }
        let mut state = prior.clone();
        analyzer.incremental_analyze(&mut state, "biraz üzgünüm");
        assert!(state.ema_mood <= prior.ema_mood);
    }

    #[test]
    fn test_confidence_saturates() {
        let mut state = begin_realtime();
        let mut last = 0.0;
        for _ in 0..30 {
            incremental_analyze(&mut state, "bugün gerçekten mutluyum ve enerjik hissediyorum");
            assert!(state.confidence >= last);
            assert!(state.confidence <= 1.0);
            last = state.confidence;
        }
        assert!(state.confidence > 0.95);
    }

    #[test]
    fn test_triggers_accumulate_in_order() {
        let mut state = begin_realtime();
        incremental_analyze(&mut state, "patronumla toplantı çok stresliydi");
        incremental_analyze(&mut state, "akşam arkadaşlarla buluştum");
        let result = incremental_analyze(&mut state, "toplantı yine aklımda");
        assert_eq!(result.triggers, vec![Trigger::Work, Trigger::Social]);
    }

    #[test]
    fn test_screen_flags_once() {
        let analyzer = IncrementalAnalyzer::new();
        let mut state = analyzer.begin_realtime();
        assert!(analyzer.screen(&mut state, "bugün iyiyim").is_none());
        assert!(analyzer.screen(&mut state, "artık yaşamak istemiyorum").is_some());
        assert!(state.crisis_flagged);
        assert!(analyzer.screen(&mut state, "yaşamak istemiyorum").is_none());
        // The detector itself still flags
        assert!(analyzer.detect_crisis("yaşamak istemiyorum").flagged);
    }

    #[test]
    fn test_analyze_transcript_one_shot() {
        let analyzer = IncrementalAnalyzer::new();
        let (state, result) = analyzer.analyze_transcript("Sabah çok yorgundum. Öğleden sonra spor yaptım ve enerjik hissettim!");
        assert_eq!(state.chunks_analyzed, 2);
        assert!(result.gate_active);
        assert!(result.triggers.contains(&Trigger::Exercise));
    }

    #[test]
    fn test_analyze_transcript_empty() {
        let (state, result) = IncrementalAnalyzer::new().analyze_transcript("");
        assert_eq!(state.chunks_analyzed, 0);
        assert!(!result.gate_active);
        assert_eq!(result.dominant_emotion, Emotion::Neutral);
    }
}
