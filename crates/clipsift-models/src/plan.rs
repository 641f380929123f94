//! Assembly plan and encoding configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::candidate::SelectionCandidate;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 20;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";
/// Default boundary fade duration in seconds
pub const DEFAULT_FADE_DURATION: f64 = 0.5;
/// Default number of concurrent clip extractions
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Video encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "veryfast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

impl EncodingConfig {
    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }
}

/// Everything the Clip Assembler needs for one run.
///
/// Built once from the normalized selection, consumed exactly once.
#[derive(Debug, Clone)]
pub struct AssemblyPlan {
    /// Normalized (sorted, disjoint) candidates in chronological order.
    pub candidates: Vec<SelectionCandidate>,
    /// Boundary fade duration in seconds; clamped per clip at apply time.
    pub fade_duration: f64,
    /// Output encoding settings.
    pub encoding: EncodingConfig,
    /// How many candidate extractions may run concurrently.
    pub max_parallel: usize,
}

impl AssemblyPlan {
    pub fn new(candidates: Vec<SelectionCandidate>) -> Self {
        Self {
            candidates,
            fade_duration: DEFAULT_FADE_DURATION,
            encoding: EncodingConfig::default(),
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }

    pub fn with_fade_duration(mut self, fade_duration: f64) -> Self {
        self.fade_duration = fade_duration.max(0.0);
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Whisper model size tiers, smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    /// Model name as used in whisper model filenames (e.g. `ggml-base.bin`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }
}

impl Default for ModelSize {
    fn default() -> Self {
        ModelSize::Base
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized model size names.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unknown model size '{0}'; expected tiny, base, small, medium, or large")]
pub struct ModelSizeError(pub String);

impl FromStr for ModelSize {
    type Err = ModelSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            "large" => Ok(ModelSize::Large),
            other => Err(ModelSizeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_encoding_args() {
        let args = EncodingConfig::default().to_ffmpeg_args();
        assert!(args.contains(&"-c:v".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"-crf".to_string()));
        assert!(args.contains(&"20".to_string()));
    }

    #[test]
    fn model_size_round_trip() {
        for size in [
            ModelSize::Tiny,
            ModelSize::Base,
            ModelSize::Small,
            ModelSize::Medium,
            ModelSize::Large,
        ] {
            assert_eq!(size.to_string().parse::<ModelSize>().unwrap(), size);
        }
        assert!("huge".parse::<ModelSize>().is_err());
    }

    #[test]
    fn plan_builder() {
        let plan = AssemblyPlan::new(vec![SelectionCandidate::new(0.0, 10.0, "")])
            .with_fade_duration(1.0);
        assert!(!plan.is_empty());
        assert_eq!(plan.fade_duration, 1.0);
    }

    #[test]
    fn negative_fade_clamped_to_zero() {
        let plan = AssemblyPlan::new(vec![]).with_fade_duration(-2.0);
        assert_eq!(plan.fade_duration, 0.0);
    }
}
