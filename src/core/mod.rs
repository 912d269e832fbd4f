//! Core modules for moodvoice

pub mod lexicon;
pub mod crisis;
pub mod coords;
pub mod analyzer;
pub mod gate;
pub mod session;
pub mod stats;
pub mod api;

pub use lexicon::{analyze_chunk, LexicalExtractor};
pub use crisis::{default_patterns, detect_crisis, CrisisDetector};
pub use coords::{coord_to_score, percent_to_score, score_to_coord, score_to_percent, to_level, CoordMapper};
pub use analyzer::{begin_realtime, incremental_analyze, IncrementalAnalyzer};
pub use gate::{new_suffix, ChunkRequest, DebounceController, GatePoll};
pub use session::{mood_record_from_state, CheckinSession, CheckinSlot, FinalizedCheckin};
pub use stats::{bucketize, build_bucket, derive_anxiety, metric_stats, quantile, recency_alpha};
pub use api::{create_router, run_server};
