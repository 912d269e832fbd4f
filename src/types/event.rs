//! Events a live session emits toward the UI

use serde::Serialize;
use crate::types::{AnalysisResult, CrisisResult, GateReason};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Accepted estimate, render it
    Update { result: AnalysisResult },
    /// Analysis ran but the acceptance gate held it back
    Held { result: AnalysisResult, reason: GateReason },
    /// Chunk never reached the analyzer
    Skipped { reason: GateReason },
    /// First crisis flag of the session; emitted once
    Crisis { result: CrisisResult },
    /// Recognizer reported a failure
    SpeechFailed { message: String },
}
