//! Shared data models for the clipsift pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Timestamped transcript segments
//! - Selection candidates and their normalization
//! - Assembly plans and encoding configuration
//! - Whisper model size tiers

pub mod candidate;
pub mod plan;
pub mod segment;
pub mod timestamp;

// Re-export common types
pub use candidate::{normalize_candidates, SelectionCandidate};
pub use plan::{
    AssemblyPlan, EncodingConfig, ModelSize, ModelSizeError, DEFAULT_FADE_DURATION,
    DEFAULT_MAX_PARALLEL,
};
pub use segment::{render_transcript, segments_are_ordered, transcript_end, TranscriptSegment};
pub use timestamp::{format_seconds, parse_timestamp, TimestampError};
