//! Pipeline-level errors and process exit codes.

use clipsift_media::MediaError;
use thiserror::Error;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_RESOURCE: i32 = 3;
pub const EXIT_NO_CONTENT: i32 = 4;
pub const EXIT_TRANSCRIPTION: i32 = 5;
pub const EXIT_ASSEMBLY: i32 = 6;

/// Terminal outcomes of a pipeline run, each with its own exit code so
/// callers can tell a resource abort from a content miss from a media
/// failure without parsing logs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("memory ceiling exceeded: {rss_mb} MB resident, limit {ceiling_mb} MB")]
    ResourceLimited { rss_mb: u64, ceiling_mb: u64 },

    #[error("no segments matched the query")]
    NoRelevantContent,

    #[error("transcription failed: {0}")]
    Transcription(#[source] MediaError),

    #[error("assembly failed: {0}")]
    Assembly(#[source] MediaError),
}

impl PipelineError {
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) => EXIT_CONFIG,
            PipelineError::ResourceLimited { .. } => EXIT_RESOURCE,
            PipelineError::NoRelevantContent => EXIT_NO_CONTENT,
            PipelineError::Transcription(_) => EXIT_TRANSCRIPTION,
            PipelineError::Assembly(_) => EXIT_ASSEMBLY,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            PipelineError::Config("x".into()).exit_code(),
            PipelineError::ResourceLimited {
                rss_mb: 600,
                ceiling_mb: 512,
            }
            .exit_code(),
            PipelineError::NoRelevantContent.exit_code(),
            PipelineError::Transcription(MediaError::TranscriptionTimeout(600)).exit_code(),
            PipelineError::Assembly(MediaError::NoRelevantContent).exit_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, EXIT_SUCCESS);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
