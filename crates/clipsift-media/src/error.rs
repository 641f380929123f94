//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("whisper binary '{0}' not found in PATH")]
    WhisperNotFound(String),

    #[error("whisper model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("media unreadable: {path}: {reason}")]
    MediaUnreadable { path: PathBuf, reason: String },

    #[error("transcription exceeded wall-clock budget of {0} seconds")]
    TranscriptionTimeout(u64),

    #[error("candidate range ends at {end:.2}s but source is only {duration:.2}s")]
    RangeOutOfBounds { end: f64, duration: f64 },

    #[error("encoding failed: {message}")]
    Encode {
        message: String,
        stderr: Option<String>,
    },

    #[error("no relevant content selected, refusing to emit an empty output")]
    NoRelevantContent,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("operation cancelled at checkpoint")]
    Cancelled,

    #[error("operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a media-unreadable error.
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MediaUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an encode failure error.
    pub fn encode(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Encode {
            message: message.into(),
            stderr,
        }
    }
}
