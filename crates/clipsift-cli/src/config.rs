//! Run configuration.
//!
//! Resolved once at process start from environment defaults overridden
//! by command-line flags, then read-only for the rest of the run.

use std::path::PathBuf;

use clap::Parser;

use clipsift_models::{ModelSize, DEFAULT_FADE_DURATION, DEFAULT_MAX_PARALLEL};
use clipsift_select::{DEFAULT_API_URL, DEFAULT_MODEL};

/// Default wall-clock budget for transcription, in seconds.
const DEFAULT_TRANSCRIBE_TIMEOUT_SECS: u64 = 600;

/// Extract query-relevant clips from a video into one highlight reel.
#[derive(Debug, Parser)]
#[command(name = "clipsift", version, about)]
pub struct Cli {
    /// Input video path (env: VIDEO_INPUT_PATH)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output video path (env: VIDEO_OUTPUT_PATH)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// What to look for, in plain language (env: USER_QUERY)
    #[arg(short, long)]
    pub query: Option<String>,

    /// Whisper model size: tiny, base, small, medium, large (env: WHISPER_MODEL)
    #[arg(long)]
    pub model: Option<ModelSize>,

    /// Boundary fade duration in seconds (env: FADE_DURATION_SECS)
    #[arg(long, allow_negative_numbers = true)]
    pub fade: Option<f64>,

    /// Memory ceiling in MB; exceeding it aborts the run (env: FREE_TIER_LIMIT_MB)
    #[arg(long)]
    pub memory_limit_mb: Option<u64>,

    /// Wall-clock budget for transcription in seconds (env: TRANSCRIBE_TIMEOUT_SECS)
    #[arg(long)]
    pub transcribe_timeout: Option<u64>,
}

/// The full resolved settings for one invocation. Immutable after
/// construction; no component mutates it.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub query: String,
    pub model_size: ModelSize,
    pub model_dir: PathBuf,
    pub whisper_binary: String,
    pub api_key: Option<String>,
    pub api_url: String,
    pub inference_model: String,
    pub fade_duration: f64,
    pub memory_limit_mb: Option<u64>,
    pub transcribe_timeout_secs: u64,
    pub max_parallel: usize,
    pub maintenance_mode: bool,
}

impl RunConfig {
    /// Resolve the run configuration: environment defaults, CLI overrides.
    pub fn resolve(cli: Cli) -> Result<Self, String> {
        let query = cli
            .query
            .or_else(|| env_string("USER_QUERY"))
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| "no query given; pass --query or set USER_QUERY".to_string())?;

        let fade = cli
            .fade
            .or_else(|| env_parse("FADE_DURATION_SECS"))
            .unwrap_or(DEFAULT_FADE_DURATION);
        if fade < 0.0 {
            return Err(format!("fade duration must be non-negative, got {}", fade));
        }

        let model_size = match cli.model {
            Some(size) => size,
            None => match env_string("WHISPER_MODEL") {
                Some(raw) => raw.parse().map_err(|e| format!("WHISPER_MODEL: {}", e))?,
                None => ModelSize::default(),
            },
        };

        Ok(Self {
            input_path: cli
                .input
                .or_else(|| env_string("VIDEO_INPUT_PATH").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("input_video.mp4")),
            output_path: cli
                .output
                .or_else(|| env_string("VIDEO_OUTPUT_PATH").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("edited_output.mp4")),
            query,
            model_size,
            model_dir: env_string("WHISPER_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("models")),
            whisper_binary: env_string("WHISPER_BINARY")
                .unwrap_or_else(|| clipsift_media::transcribe::DEFAULT_WHISPER_BINARY.to_string()),
            api_key: env_string("GROQ_API_KEY"),
            api_url: env_string("GROQ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            inference_model: env_string("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            fade_duration: fade,
            memory_limit_mb: cli.memory_limit_mb.or_else(|| env_parse("FREE_TIER_LIMIT_MB")),
            transcribe_timeout_secs: cli
                .transcribe_timeout
                .or_else(|| env_parse("TRANSCRIBE_TIMEOUT_SECS"))
                .unwrap_or(DEFAULT_TRANSCRIBE_TIMEOUT_SECS),
            max_parallel: env_parse("MAX_PARALLEL_EXTRACTIONS").unwrap_or(DEFAULT_MAX_PARALLEL),
            maintenance_mode: env_string("MAINTENANCE_MODE_ENABLED")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
        })
    }

    /// Whether a real (non-placeholder) inference credential is present.
    pub fn inference_enabled(&self) -> bool {
        clipsift_select::credential_is_usable(self.api_key.as_deref())
    }

    /// Selection mode name for the startup banner.
    pub fn selection_mode(&self) -> &'static str {
        if self.inference_enabled() {
            "inference"
        } else {
            "stub"
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
