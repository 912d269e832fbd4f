//! HTTP + WebSocket API for moodvoice
//!
//! Endpoints:
//! - POST /checkin/new - Start the check-in (409 while one is active)
//! - POST /checkin/{id}/transcript - Feed a recognizer update
//! - POST /checkin/{id}/stt-error - Report a recognizer failure
//! - GET /checkin/{id} - Current estimate
//! - POST /checkin/{id}/finalize - Stop and build the record
//! - DELETE /checkin/{id} - Cancel
//! - WS /ws/{id} - Live session events
//! - POST /analyze - One-shot transcript analysis
//! - POST /stats/buckets - Chart aggregation
//! - GET /health - Health check

use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};

use crate::config::EstimatorConfig;
use crate::core::{bucketize, CheckinSlot, CrisisDetector, FinalizedCheckin, IncrementalAnalyzer};
use crate::error::{CheckinError, ConfigError};
use crate::types::{
    AggregateBucket, AnalysisResult, CrisisResult, Granularity, MoodSample, SessionEvent,
    TranscriptChunk,
};

/// App state
pub struct AppState {
    pub slot: RwLock<CheckinSlot>,
    /// Events tagged with the session they belong to
    pub events: broadcast::Sender<(String, SessionEvent)>,
    pub clock: Instant,
}

impl AppState {
    /// Milliseconds on the server's monotonic clock
    fn now_ms(&self) -> u64 {
        self.clock.elapsed().as_millis() as u64
    }

    fn publish(&self, session_id: &str, events: Vec<SessionEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.events.send((session_id.to_string(), event));
        }
    }
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug)]
pub struct ApiError(StatusCode, ErrorResponse);

impl From<CheckinError> for ApiError {
    fn from(err: CheckinError) -> Self {
        let (status, code) = match &err {
            CheckinError::AlreadyActive(_) => (StatusCode::CONFLICT, "already_active"),
            CheckinError::NoActiveSession => (StatusCode::NOT_FOUND, "no_active_session"),
            CheckinError::SessionMismatch { .. } => (StatusCode::NOT_FOUND, "session_mismatch"),
            CheckinError::SpeechUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "speech_unavailable"),
            CheckinError::EmptyTranscript => (StatusCode::UNPROCESSABLE_ENTITY, "empty_transcript"),
        };
        ApiError(status, ErrorResponse { error: err.to_string(), code })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub session_active: bool,
}

/// Start check-in response
#[derive(Debug, Serialize)]
pub struct NewCheckinResponse {
    pub session_id: String,
    pub websocket_url: String,
}

/// Recognizer update
#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub text: String,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub is_final: bool,
}

/// Transcript accepted for (debounced) analysis, or skipped outright
#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub scheduled: bool,
    pub skipped: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpeechErrorRequest {
    pub message: String,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct CheckinStatusResponse {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub transcript: String,
    pub chunks_analyzed: u32,
    pub crisis_flagged: bool,
    pub current: AnalysisResult,
    pub last_accepted: Option<AnalysisResult>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub result: AnalysisResult,
    pub crisis: CrisisResult,
}

#[derive(Debug, Deserialize)]
pub struct BucketsRequest {
    pub samples: Vec<MoodSample>,
    pub granularity: Granularity,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Create the API router
pub fn create_router(config: &EstimatorConfig) -> Result<Router, ConfigError> {
    let crisis = CrisisDetector::from_patterns(&config.crisis.patterns)?;
    let analyzer = IncrementalAnalyzer::with_config(config, crisis);
    let (events, _) = broadcast::channel(100);
    let state = Arc::new(AppState {
        slot: RwLock::new(CheckinSlot::new(Arc::new(analyzer), config.gate.clone())),
        events,
        clock: Instant::now(),
    });

    Ok(Router::new()
        .route("/health", get(health))
        .route("/checkin/new", post(create_checkin))
        .route("/checkin/:id", get(get_checkin).delete(cancel_checkin))
        .route("/checkin/:id/transcript", post(post_transcript))
        .route("/checkin/:id/stt-error", post(post_speech_error))
        .route("/checkin/:id/finalize", post(finalize_checkin))
        .route("/ws/:id", get(websocket_handler))
        .route("/analyze", post(analyze))
        .route("/stats/buckets", post(stats_buckets))
        .with_state(state))
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let slot = state.slot.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        session_active: slot.is_active(),
    })
}

/// Start the check-in
async fn create_checkin(State(state): State<Arc<AppState>>) -> Result<Json<NewCheckinResponse>, ApiError> {
    let mut slot = state.slot.write().await;
    let session_id = slot.begin()?.id().to_string();

    Ok(Json(NewCheckinResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
    }))
}

/// Current estimate
async fn get_checkin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CheckinStatusResponse>, ApiError> {
    let slot = state.slot.read().await;
    let session = slot
        .active()
        .filter(|s| s.id() == id)
        .ok_or(CheckinError::NoActiveSession)?;

    Ok(Json(CheckinStatusResponse {
        session_id: id,
        started_at: session.started_at(),
        transcript: session.transcript().to_string(),
        chunks_analyzed: session.state().chunks_analyzed,
        crisis_flagged: session.state().crisis_flagged,
        current: session.current(),
        last_accepted: session.last_accepted().cloned(),
    }))
}

/// Feed a recognizer update; analysis runs after the debounce window
async fn post_transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TranscriptRequest>,
) -> Result<(StatusCode, Json<TranscriptResponse>), ApiError> {
    let now = state.now_ms();
    let mut chunk = if req.is_final {
        TranscriptChunk::final_text(req.text, now)
    } else {
        TranscriptChunk::partial(req.text, now)
    };
    if let Some(confidence) = req.confidence {
        chunk = chunk.with_confidence(confidence);
    }

    let (delay_ms, events) = {
        let mut slot = state.slot.write().await;
        let debounce_ms = slot.gate().debounce_ms;
        let events = slot.session_mut(&id)?.on_transcript(&chunk);
        (if chunk.is_final { 0 } else { debounce_ms }, events)
    };

    let skipped = events.iter().find_map(|event| match event {
        SessionEvent::Skipped { reason } => Some(reason.code().to_string()),
        _ => None,
    });
    state.publish(&id, events);

    if skipped.is_none() {
        let state = Arc::clone(&state);
        let id = id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let events = {
                let mut slot = state.slot.write().await;
                match slot.session_mut(&id) {
                    Ok(session) => session.tick(state.now_ms()),
                    Err(err) => {
                        debug!("debounced tick for {} dropped: {}", id, err);
                        Vec::new()
                    }
                }
            };
            state.publish(&id, events);
        });
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(TranscriptResponse {
            scheduled: skipped.is_none(),
            skipped,
        }),
    ))
}

/// Recognizer failure: surfaced to the caller and the live channel
async fn post_speech_error(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SpeechErrorRequest>,
) -> Result<Response, ApiError> {
    let event = {
        let mut slot = state.slot.write().await;
        slot.session_mut(&id)?.speech_failed(req.message.clone())
    };
    state.publish(&id, vec![event]);
    Ok(ApiError::from(CheckinError::SpeechUnavailable(req.message)).into_response())
}

/// Stop recording and build the record
async fn finalize_checkin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FinalizedCheckin>, ApiError> {
    let finalized = state.slot.write().await.finalize(&id)?;
    if let Some(crisis) = &finalized.late_crisis {
        state.publish(&id, vec![SessionEvent::Crisis { result: crisis.clone() }]);
    }
    Ok(Json(finalized))
}

async fn cancel_checkin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.slot.write().await.cancel(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// One-shot analysis of a whole transcript
async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Json<AnalyzeResponse> {
    let slot = state.slot.read().await;
    let analyzer = slot.analyzer();
    let (_, result) = analyzer.analyze_transcript(&req.text);
    let crisis = analyzer.detect_crisis(&req.text);
    Json(AnalyzeResponse { result, crisis })
}

/// Chart buckets for a time range
async fn stats_buckets(Json(req): Json<BucketsRequest>) -> Json<Vec<AggregateBucket>> {
    Json(bucketize(&req.samples, req.granularity, req.start, req.end))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let slot = state.slot.read().await;
    slot.active()
        .filter(|s| s.id() == id)
        .ok_or(CheckinError::NoActiveSession)?;
    let rx = state.events.subscribe();
    drop(slot);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx, id).await;
    }))
}

/// Forward this session's events until either side goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<(String, SessionEvent)>, id: String) {
    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Ok((session_id, event)) => {
                    if session_id != id {
                        continue;
                    }
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(err) => {
                            warn!("cannot encode event for {}: {}", id, err);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("websocket for {} lagged, {} events dropped", id, missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("websocket for {} closed", id);
}

/// Run the API server
pub async fn run_server(addr: &str, config: &EstimatorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("moodvoice API listening on {}", addr);
    println!("moodvoice API running on {}", addr);
    println!("  POST   /checkin/new            - Start check-in");
    println!("  POST   /checkin/:id/transcript - Feed transcript");
    println!("  POST   /checkin/:id/stt-error  - Report STT failure");
    println!("  GET    /checkin/:id            - Current estimate");
    println!("  POST   /checkin/:id/finalize   - Save record");
    println!("  DELETE /checkin/:id            - Cancel");
    println!("  WS     /ws/:id                 - Live events");
    println!("  POST   /analyze                - One-shot analysis");
    println!("  POST   /stats/buckets          - Chart buckets");
    println!("  GET    /health                 - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
