//! Integration tests for the debounce / gate controller

use moodvoice::config::GateConfig;
use moodvoice::core::{CheckinSlot, DebounceController, GatePoll};
use moodvoice::types::{GateReason, SessionEvent, TranscriptChunk};
use moodvoice::DEBOUNCE_MS;

#[test]
fn test_rapid_partials_analyzed_once() {
    let mut slot = CheckinSlot::default();
    let id = slot.begin().unwrap().id().to_string();
    let session = slot.session_mut(&id).unwrap();

    session.on_transcript(&TranscriptChunk::partial("bugün çok", 0));
    session.on_transcript(&TranscriptChunk::partial("bugün çok yorgunum", 120));
    session.on_transcript(&TranscriptChunk::partial("bugün çok yorgunum ve üzgünüm", 240));

    // Window restarted by every update
    assert!(session.tick(DEBOUNCE_MS).is_empty());
    let events = session.tick(240 + DEBOUNCE_MS);
    assert!(!events.is_empty());
    assert_eq!(session.controller().analyses_started(), 1);
    assert_eq!(session.state().chunks_analyzed, 1);

    // Nothing pending any more
    assert!(session.tick(10_000).is_empty());
    assert_eq!(session.controller().analyses_started(), 1);
}

#[test]
fn test_short_tail_never_reaches_analyzer() {
    let mut slot = CheckinSlot::default();
    let id = slot.begin().unwrap().id().to_string();
    let session = slot.session_mut(&id).unwrap();

    session.on_transcript(&TranscriptChunk::partial("bugün çok yorgunum", 0));
    session.tick(DEBOUNCE_MS);
    let before = session.state().clone();

    session.on_transcript(&TranscriptChunk::partial("bugün çok yorgunum evet", 1000));
    let events = session.tick(1000 + DEBOUNCE_MS);
    assert!(matches!(
        events.as_slice(),
        [SessionEvent::Skipped { reason: GateReason::C001_CHUNK_TOO_SHORT }]
    ));
    assert_eq!(session.state(), &before);
}

#[test]
fn test_low_confidence_partial_ignored() {
    let mut slot = CheckinSlot::default();
    let id = slot.begin().unwrap().id().to_string();
    let session = slot.session_mut(&id).unwrap();

    let chunk = TranscriptChunk::partial("bugün çok yorgunum", 0).with_confidence(0.05);
    let events = session.on_transcript(&chunk);
    assert!(matches!(
        events.as_slice(),
        [SessionEvent::Skipped { reason: GateReason::C005_LOW_STT_CONFIDENCE }]
    ));
    assert!(session.tick(10_000).is_empty());
    assert_eq!(session.transcript(), "");
}

#[test]
fn test_final_skips_debounce_wait() {
    let mut controller = DebounceController::new(GateConfig::default(), 1);
    controller.on_transcript(&TranscriptChunk::final_text("bugün çok yorgunum", 500));
    assert!(matches!(controller.poll(500), GatePoll::Ready(_)));
}

#[test]
fn test_cancelled_result_is_dropped() {
    let mut slot = CheckinSlot::default();
    let id = slot.begin().unwrap().id().to_string();

    let session = slot.session_mut(&id).unwrap();
    session.on_transcript(&TranscriptChunk::final_text("bugün çok kötü hissediyorum", 0));
    let request = match session.poll(0) {
        GatePoll::Ready(request) => request,
        other => panic!("expected ready, got {:?}", other),
    };

    slot.cancel(&id).unwrap();
    let next = slot.begin().unwrap().id().to_string();
    assert_ne!(next, id);

    let before = slot.active().unwrap().state().clone();
    assert!(slot.complete(&request, 100).is_empty());
    assert_eq!(slot.active().unwrap().state(), &before);
}

#[test]
fn test_neutral_flicker_held_then_released() {
    let mut slot = CheckinSlot::default();
    let id = slot.begin().unwrap().id().to_string();
    let session = slot.session_mut(&id).unwrap();

    // Mild positive after a mild negative lands back near the center
    session.on_transcript(&TranscriptChunk::partial("biraz yorgunum bugün", 0));
    let first = session.tick(DEBOUNCE_MS);
    assert!(first.iter().any(|e| matches!(e, SessionEvent::Update { .. })));

    session.on_transcript(&TranscriptChunk::partial("biraz yorgunum bugün ama enerjik hissediyorum", 400));
    let events = session.tick(400 + DEBOUNCE_MS);
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::Held { reason: GateReason::G003_NEUTRAL_FLICKER, .. }
    )));
}
