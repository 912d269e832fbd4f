//! Core types for Moodvoice

mod analysis;
mod bucket;
mod chunk;
mod crisis;
mod event;
mod reason;
mod record;
mod signals;
mod state;

pub use analysis::AnalysisResult;
pub use bucket::{
    AggregateBucket, AnxietyEstimate, DerivationRule, DerivedBasis, Granularity, MetricStats,
    MoodSample,
};
pub use chunk::TranscriptChunk;
pub use crisis::{CrisisCategory, CrisisPattern, CrisisResult};
pub use event::SessionEvent;
pub use reason::GateReason;
pub use record::{MoodRecord, RecordSource};
pub use signals::{ChunkSignal, Emotion, Trigger};
pub use state::RealtimeState;
