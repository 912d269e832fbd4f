//! Check-in session lifecycle
//!
//! A `CheckinSession` owns the state carrier and the gate controller of one
//! live recording. `CheckinSlot` enforces that at most one exists at a time
//! and hands each session a fresh generation token, so results cut by a
//! cancelled session can never land in the next one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::GateConfig;
use crate::core::analyzer::IncrementalAnalyzer;
use crate::core::coords::{to_level, CoordMapper};
use crate::core::gate::{ChunkRequest, DebounceController, GatePoll};
use crate::error::CheckinError;
use crate::types::{
    AnalysisResult, CrisisResult, MoodRecord, RealtimeState, RecordSource, SessionEvent,
    TranscriptChunk,
};

/// What a finished check-in hands to persistence and the UI
#[derive(Debug, Clone, Serialize)]
pub struct FinalizedCheckin {
    pub record: MoodRecord,
    pub result: AnalysisResult,
    /// Crisis language found only in the unanalyzed tail at save time
    pub late_crisis: Option<CrisisResult>,
    pub crisis_flagged: bool,
}

#[derive(Debug)]
pub struct CheckinSession {
    id: String,
    analyzer: Arc<IncrementalAnalyzer>,
    state: RealtimeState,
    controller: DebounceController,
    transcript: String,
    started_at: DateTime<Utc>,
    speech_error: Option<String>,
    last_accepted: Option<AnalysisResult>,
}

impl CheckinSession {
    pub fn begin(id: impl Into<String>, analyzer: Arc<IncrementalAnalyzer>, gate: GateConfig, generation: u64) -> Self {
        let id = id.into();
        info!("check-in {} started (generation {})", id, generation);
        let controller = DebounceController::new(gate, generation).with_center(analyzer.mapper().center());
        Self {
            state: analyzer.begin_realtime(),
            analyzer,
            controller,
            transcript: String::new(),
            started_at: Utc::now(),
            speech_error: None,
            last_accepted: None,
            id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn generation(&self) -> u64 {
        self.controller.generation()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> &RealtimeState {
        &self.state
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn controller(&self) -> &DebounceController {
        &self.controller
    }

    /// Last result the acceptance gate let through
    pub fn last_accepted(&self) -> Option<&AnalysisResult> {
        self.last_accepted.as_ref()
    }

    /// Current estimate, whether or not it was ever accepted
    pub fn current(&self) -> AnalysisResult {
        self.analyzer.project(&self.state, 0.0, self.state.has_evidence())
    }

    /// Feed a recognizer update
    pub fn on_transcript(&mut self, chunk: &TranscriptChunk) -> Vec<SessionEvent> {
        match self.controller.on_transcript(chunk) {
            Some(reason) => vec![SessionEvent::Skipped { reason }],
            None => {
                self.transcript = chunk.text.clone();
                Vec::new()
            }
        }
    }

    /// Recognizer failure. Surfaced as-is; no transcript is substituted.
    pub fn speech_failed(&mut self, message: impl Into<String>) -> SessionEvent {
        let message = message.into();
        warn!("check-in {}: speech recognition failed: {}", self.id, message);
        self.speech_error = Some(message.clone());
        SessionEvent::SpeechFailed { message }
    }

    pub fn poll(&mut self, now_ms: u64) -> GatePoll {
        self.controller.poll(now_ms)
    }

    /// Run the analyzer on a cleared chunk and apply the acceptance gate
    pub fn complete(&mut self, request: &ChunkRequest, now_ms: u64) -> Vec<SessionEvent> {
        if request.generation != self.controller.generation() {
            debug!("check-in {}: dropping stale chunk (generation {})", self.id, request.generation);
            return Vec::new();
        }

        let mut events = Vec::new();
        if let Some(crisis) = self.analyzer.screen(&mut self.state, &request.chunk) {
            events.push(SessionEvent::Crisis { result: crisis });
        }

        let result = self.analyzer.incremental_analyze(&mut self.state, &request.chunk);
        let reason = self.controller.complete(request, &result, now_ms);
        debug!("check-in {}: {} → {}", self.id, result.summary(), reason.code());

        if reason.is_accepted() {
            self.last_accepted = Some(result.clone());
            events.push(SessionEvent::Update { result });
        } else {
            events.push(SessionEvent::Held { result, reason });
        }
        events
    }

    /// Timer callback: poll and, when due, analyze
    pub fn tick(&mut self, now_ms: u64) -> Vec<SessionEvent> {
        match self.poll(now_ms) {
            GatePoll::Ready(request) => self.complete(&request, now_ms),
            GatePoll::Skipped(reason) => vec![SessionEvent::Skipped { reason }],
            GatePoll::Idle | GatePoll::Waiting { .. } => Vec::new(),
        }
    }

    /// Stop recording and build the persisted record
    pub fn finalize(mut self) -> Result<FinalizedCheckin, CheckinError> {
        let transcript = self.transcript.trim().to_string();
        if transcript.is_empty() {
            return Err(match self.speech_error.take() {
                Some(message) => CheckinError::SpeechUnavailable(message),
                None => CheckinError::EmptyTranscript,
            });
        }

        // Flush whatever the debounce window still held. A tail below the
        // minimum chunk size is screened for crisis but never scored.
        let tail = self.controller.unprocessed(&transcript).to_string();
        let mut late_crisis = None;
        if !tail.is_empty() {
            late_crisis = self.analyzer.screen(&mut self.state, &tail);
            match self.controller.chunk_gate(&tail) {
                None => {
                    self.analyzer.incremental_analyze(&mut self.state, &tail);
                }
                Some(reason) => debug!("check-in {}: tail held back at save: {}", self.id, reason.code()),
            }
            self.controller.mark_processed(&transcript);
        }

        // No live evidence: rebuild the estimate from the whole transcript
        let (state, source) = if self.state.has_evidence() {
            (self.state, RecordSource::Voice)
        } else {
            let (mut one_shot, _) = self.analyzer.analyze_transcript(&transcript);
            one_shot.crisis_flagged = self.state.crisis_flagged;
            (one_shot, RecordSource::Derived)
        };

        let result = self.analyzer.project(&state, state.signal_strength, state.has_evidence());
        let record = mood_record_from_state(&state, &transcript, self.analyzer.mapper(), source);
        info!(
            "check-in {} finalized: mood={} energy={} anxiety={} triggers={}",
            self.id,
            record.mood_score,
            record.energy_level,
            record.anxiety_level,
            record.triggers.len()
        );

        Ok(FinalizedCheckin {
            record,
            result,
            late_crisis,
            crisis_flagged: state.crisis_flagged,
        })
    }

    /// Discard the session; in-flight results become stale
    pub fn cancel(mut self) {
        self.controller.cancel();
        info!("check-in {} cancelled", self.id);
    }
}

/// Persisted fields from a carried state. Mood goes through the valence
/// coordinate so `mood_score` and `coord_x` stay mutually derivable.
pub fn mood_record_from_state(
    state: &RealtimeState,
    notes: &str,
    mapper: &CoordMapper,
    source: RecordSource,
) -> MoodRecord {
    let coord_x = mapper.score_to_coord(state.ema_mood);
    let coord_y = mapper.score_to_coord(state.ema_energy);
    MoodRecord::new(
        mapper.coord_to_mood_percent(coord_x),
        mapper.coord_to_energy_level(coord_y),
        to_level(state.ema_anxiety),
        notes,
        state.triggers.clone(),
        source,
    )
}

/// Holder of the single active check-in
#[derive(Debug)]
pub struct CheckinSlot {
    analyzer: Arc<IncrementalAnalyzer>,
    gate: GateConfig,
    active: Option<CheckinSession>,
    next_generation: u64,
}

impl Default for CheckinSlot {
    fn default() -> Self {
        Self::new(Arc::new(IncrementalAnalyzer::default()), GateConfig::default())
    }
}

impl CheckinSlot {
    pub fn new(analyzer: Arc<IncrementalAnalyzer>, gate: GateConfig) -> Self {
        Self {
            analyzer,
            gate,
            active: None,
            next_generation: 1,
        }
    }

    pub fn analyzer(&self) -> &IncrementalAnalyzer {
        &self.analyzer
    }

    pub fn gate(&self) -> &GateConfig {
        &self.gate
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&CheckinSession> {
        self.active.as_ref()
    }

    /// Start a check-in. Stop-before-start: fails while one is running.
    pub fn begin(&mut self) -> Result<&mut CheckinSession, CheckinError> {
        if let Some(current) = &self.active {
            return Err(CheckinError::AlreadyActive(current.id().to_string()));
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        let id = format!("checkin_{}_{}", Utc::now().format("%Y%m%d%H%M%S"), generation);
        let session = CheckinSession::begin(id, Arc::clone(&self.analyzer), self.gate.clone(), generation);
        Ok(self.active.insert(session))
    }

    /// Active session, checked against the caller's id
    pub fn session_mut(&mut self, id: &str) -> Result<&mut CheckinSession, CheckinError> {
        match self.active.as_mut() {
            None => Err(CheckinError::NoActiveSession),
            Some(s) if s.id() != id => Err(CheckinError::SessionMismatch {
                expected: s.id().to_string(),
                got: id.to_string(),
            }),
            Some(s) => Ok(s),
        }
    }

    /// Apply a result that may have outlived its session
    pub fn complete(&mut self, request: &ChunkRequest, now_ms: u64) -> Vec<SessionEvent> {
        match self.active.as_mut() {
            Some(session) if session.generation() == request.generation => session.complete(request, now_ms),
            _ => {
                debug!("dropping chunk from generation {}, no matching session", request.generation);
                Vec::new()
            }
        }
    }

    pub fn cancel(&mut self, id: &str) -> Result<(), CheckinError> {
        self.session_mut(id)?;
        if let Some(session) = self.active.take() {
            session.cancel();
        }
        Ok(())
    }

    pub fn finalize(&mut self, id: &str) -> Result<FinalizedCheckin, CheckinError> {
        self.session_mut(id)?;
        let session = self.active.take().ok_or(CheckinError::NoActiveSession)?;
        session.finalize()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GateReason;
    use crate::DEBOUNCE_MS;

    #[test]
    fn test_single_active_session() {
        let mut slot = CheckinSlot::default();
        let id = slot.begin().unwrap().id().to_string();
        assert!(matches!(slot.begin(), Err(CheckinError::AlreadyActive(_))));
        slot.cancel(&id).unwrap();
        assert!(!slot.is_active());
        assert!(slot.begin().is_ok());
    }

    #[test]
    fn test_wrong_id_rejected() {
        let mut slot = CheckinSlot::default();
        slot.begin().unwrap();
        assert!(matches!(slot.session_mut("nope"), Err(CheckinError::SessionMismatch { .. })));
        assert!(matches!(CheckinSlot::default().finalize("x"), Err(CheckinError::NoActiveSession)));
    }

    #[test]
    fn test_short_chunk_never_changes_state() {
        let mut slot = CheckinSlot::default();
        let session = slot.begin().unwrap();
        let before = session.state().clone();

        session.on_transcript(&TranscriptChunk::final_text("kötü", 0));
        let events = session.tick(0);
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::Skipped { reason: GateReason::C001_CHUNK_TOO_SHORT }]
        ));
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_crisis_event_emitted_once() {
        let mut slot = CheckinSlot::default();
        let session = slot.begin().unwrap();

        session.on_transcript(&TranscriptChunk::final_text("bazen ölmek istiyorum", 0));
        let first = session.tick(0);
        assert!(matches!(first.first(), Some(SessionEvent::Crisis { .. })));

        session.on_transcript(&TranscriptChunk::final_text("bazen ölmek istiyorum gerçekten ölmek istiyorum", 10));
        let second = session.tick(10);
        assert!(!second.iter().any(|e| matches!(e, SessionEvent::Crisis { .. })));
        assert!(session.state().crisis_flagged);
    }

    #[test]
    fn test_stale_result_after_cancel_is_noop() {
        let mut slot = CheckinSlot::default();
        let session = slot.begin().unwrap();
        let old_id = session.id().to_string();
        session.on_transcript(&TranscriptChunk::final_text("bugün çok kötü hissediyorum", 0));
        let request = match session.poll(0) {
            GatePoll::Ready(r) => r,
            other => panic!("expected Ready, got {:?}", other),
        };

        slot.cancel(&old_id).unwrap();
        let fresh = slot.begin().unwrap();
        let fresh_state = fresh.state().clone();

        assert!(slot.complete(&request, 10).is_empty());
        assert_eq!(slot.active().unwrap().state(), &fresh_state);
    }

    #[test]
    fn test_finalize_flushes_pending_tail() {
        let mut slot = CheckinSlot::default();
        let session = slot.begin().unwrap();
        let id = session.id().to_string();
        session.on_transcript(&TranscriptChunk::partial("bugün çok yorgunum ve üzgünüm", 0));
        // Debounce window never closes before the user taps save
        assert!(session.tick(DEBOUNCE_MS / 2).is_empty());

        let done = slot.finalize(&id).unwrap();
        assert_eq!(done.record.source, RecordSource::Voice);
        assert!(done.record.mood_score < 50);
        assert!(done.record.energy_level < 5);
        assert_eq!(done.record.notes, "bugün çok yorgunum ve üzgünüm");
    }

    #[test]
    fn test_finalize_short_tail_does_not_move_record() {
        let saved = |transcript_at_save: &str| {
            let mut slot = CheckinSlot::default();
            let session = slot.begin().unwrap();
            let id = session.id().to_string();
            session.on_transcript(&TranscriptChunk::final_text("bugün çok yorgunum", 0));
            assert!(matches!(session.tick(0).last(), Some(SessionEvent::Update { .. })));
            session.on_transcript(&TranscriptChunk::partial(transcript_at_save, 10));
            slot.finalize(&id).unwrap()
        };

        let without_tail = saved("bugün çok yorgunum");
        let with_tail = saved("bugün çok yorgunum kötü");
        assert_eq!(with_tail.record.mood_score, without_tail.record.mood_score);
        assert_eq!(with_tail.record.energy_level, without_tail.record.energy_level);
        assert_eq!(with_tail.record.anxiety_level, without_tail.record.anxiety_level);
        assert_eq!(with_tail.record.notes, "bugün çok yorgunum kötü");
        assert_eq!(with_tail.record.source, RecordSource::Voice);
    }

    #[test]
    fn test_finalize_without_live_evidence_is_derived() {
        let mut slot = CheckinSlot::default();
        let session = slot.begin().unwrap();
        let id = session.id().to_string();
        session.on_transcript(&TranscriptChunk::final_text("mutluyum", 0));
        assert!(matches!(
            session.tick(0).as_slice(),
            [SessionEvent::Skipped { reason: GateReason::C002_TOO_FEW_WORDS }]
        ));

        let done = slot.finalize(&id).unwrap();
        assert_eq!(done.record.source, RecordSource::Derived);
        assert!(done.record.mood_score > 50, "got {}", done.record.mood_score);
    }

    #[test]
    fn test_finalize_empty_transcript() {
        let mut slot = CheckinSlot::default();
        let id = slot.begin().unwrap().id().to_string();
        assert!(matches!(slot.finalize(&id), Err(CheckinError::EmptyTranscript)));
    }

    #[test]
    fn test_speech_failure_surfaces() {
        let mut slot = CheckinSlot::default();
        let session = slot.begin().unwrap();
        let id = session.id().to_string();
        let event = session.speech_failed("microphone permission denied");
        assert!(matches!(event, SessionEvent::SpeechFailed { .. }));
        assert!(matches!(slot.finalize(&id), Err(CheckinError::SpeechUnavailable(_))));
    }

    #[test]
    fn test_record_mood_matches_coordinate() {
        let analyzer = IncrementalAnalyzer::default();
        let mut state = analyzer.begin_realtime();
        analyzer.incremental_analyze(&mut state, "bugün gerçekten mutluyum");
        let record = mood_record_from_state(&state, "", analyzer.mapper(), RecordSource::Voice);

        let coord_x = analyzer.mapper().score_to_coord(state.ema_mood);
        let back = analyzer.mapper().mood_percent_to_coord(record.mood_score as f64);
        assert!((coord_x - back).abs() < 0.02, "{} vs {}", coord_x, back);
    }
}
