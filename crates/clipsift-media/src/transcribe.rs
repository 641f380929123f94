//! Audio extraction and whisper.cpp transcription.
//!
//! The Transcriber extracts a 16 kHz mono WAV from the source into a
//! scoped temp directory, runs the whisper.cpp CLI against it with JSON
//! output, and parses the result into ordered [`TranscriptSegment`]s.
//! The temp audio lives inside a [`tempfile::TempDir`], so it is removed
//! on every exit path. Transcription failures are fatal to the run; this
//! layer never retries.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use clipsift_models::{ModelSize, TranscriptSegment};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_media;

/// Default whisper.cpp CLI binary name.
pub const DEFAULT_WHISPER_BINARY: &str = "whisper-cli";

/// Options for a transcription run.
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// Model size tier.
    pub model_size: ModelSize,
    /// Directory holding ggml model files (`ggml-<size>.bin`).
    pub model_dir: PathBuf,
    /// Whisper CLI binary name or path.
    pub binary: String,
    /// Wall-clock budget for the whisper process, in seconds.
    pub timeout_secs: u64,
    /// Spoken language hint, or None for auto-detect.
    pub language: Option<String>,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            model_size: ModelSize::default(),
            model_dir: PathBuf::from("models"),
            binary: DEFAULT_WHISPER_BINARY.to_string(),
            timeout_secs: 600,
            language: None,
        }
    }
}

impl TranscribeOptions {
    /// Resolved path to the model file for the configured size.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir
            .join(format!("ggml-{}.bin", self.model_size))
    }
}

/// Transcribe the audio track of a media file.
///
/// Fails with [`MediaError::MediaUnreadable`] when the file cannot be
/// probed or has no audio stream, and [`MediaError::TranscriptionTimeout`]
/// when the whisper process outlives its budget.
pub async fn transcribe(
    video_path: impl AsRef<Path>,
    options: &TranscribeOptions,
) -> MediaResult<Vec<TranscriptSegment>> {
    let video_path = video_path.as_ref();

    let info = probe_media(video_path).await?;
    if !info.has_audio {
        return Err(MediaError::unreadable(video_path, "no audio stream"));
    }

    let model_path = options.model_path();
    if !model_path.exists() {
        return Err(MediaError::ModelNotFound(model_path));
    }

    // Scoped temp dir: extracted audio and whisper output are removed
    // when this drops, on success and on every error path.
    let temp_dir = tempfile::tempdir()?;
    let audio_path = temp_dir.path().join("audio.wav");

    info!(
        input = %video_path.display(),
        model = %options.model_size,
        "Extracting audio for transcription"
    );
    extract_audio(video_path, &audio_path).await?;

    let segments = run_whisper(&audio_path, &model_path, options).await?;

    info!(segments = segments.len(), "Transcription complete");
    Ok(segments)
}

/// Extract a 16 kHz mono WAV suitable for whisper.
async fn extract_audio(input: &Path, output: &Path) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(input, output)
        .no_video()
        .output_arg("-ac")
        .output_arg("1")
        .output_arg("-ar")
        .output_arg("16000")
        .output_arg("-c:a")
        .output_arg("pcm_s16le");

    crate::command::FfmpegRunner::new()
        .run(&cmd)
        .await
        .map_err(|e| match e {
            // A file ffprobe accepted but ffmpeg cannot decode is still unreadable input.
            MediaError::FfmpegFailed { stderr, .. } => MediaError::unreadable(
                input,
                stderr.unwrap_or_else(|| "audio extraction failed".to_string()),
            ),
            other => other,
        })
}

/// Run the whisper.cpp CLI and parse its JSON output.
async fn run_whisper(
    audio_path: &Path,
    model_path: &Path,
    options: &TranscribeOptions,
) -> MediaResult<Vec<TranscriptSegment>> {
    crate::command::check_whisper(&options.binary)?;

    // whisper.cpp writes `<output_prefix>.json` when given -oj
    let output_prefix = audio_path.with_extension("");

    let mut cmd = Command::new(&options.binary);
    cmd.arg("-m")
        .arg(model_path)
        .arg("-f")
        .arg(audio_path)
        .arg("-oj")
        .arg("-of")
        .arg(&output_prefix);
    if let Some(lang) = &options.language {
        cmd.arg("-l").arg(lang);
    }

    debug!(binary = %options.binary, model = %model_path.display(), "Running whisper");

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    // Drain stderr while waiting: a chatty whisper build can fill the
    // pipe buffer and stall its own exit if nobody reads it.
    let output_future = async {
        let mut stderr = Vec::new();
        if let Some(mut pipe) = child.stderr.take() {
            use tokio::io::AsyncReadExt;
            pipe.read_to_end(&mut stderr).await?;
        }
        let status = child.wait().await?;
        Ok::<_, std::io::Error>((status, stderr))
    };

    let waited =
        tokio::time::timeout(Duration::from_secs(options.timeout_secs), output_future).await;
    let (status, stderr) = match waited {
        Ok(result) => result?,
        Err(_) => {
            warn!(
                timeout_secs = options.timeout_secs,
                "Whisper exceeded wall-clock budget, killing process"
            );
            let _ = child.kill().await;
            return Err(MediaError::TranscriptionTimeout(options.timeout_secs));
        }
    };

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr);
        return Err(MediaError::unreadable(
            audio_path,
            format!("whisper failed: {}", stderr.trim()),
        ));
    }

    let json_path = output_prefix.with_extension("json");
    let raw = tokio::fs::read_to_string(&json_path).await?;
    let output: WhisperOutput = serde_json::from_str(&raw)?;

    Ok(sanitize_segments(
        output
            .transcription
            .into_iter()
            .map(|s| TranscriptSegment::new(
                s.offsets.from as f64 / 1000.0,
                s.offsets.to as f64 / 1000.0,
                s.text.trim(),
            ))
            .collect(),
    ))
}

/// whisper.cpp JSON output (`-oj`).
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    transcription: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    offsets: WhisperOffsets,
    text: String,
}

#[derive(Debug, Deserialize)]
struct WhisperOffsets {
    from: u64,
    to: u64,
}

/// Enforce the transcript invariants: sorted by start, no overlap, no
/// empty or inverted segments.
fn sanitize_segments(mut segments: Vec<TranscriptSegment>) -> Vec<TranscriptSegment> {
    segments.retain(|s| !s.text.is_empty());
    segments.sort_by(|a, b| {
        a.start
            .partial_cmp(&b.start)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out: Vec<TranscriptSegment> = Vec::with_capacity(segments.len());
    for mut seg in segments {
        if let Some(prev) = out.last() {
            if seg.start < prev.end {
                seg.start = prev.end;
            }
        }
        if seg.end > seg.start {
            out.push(seg);
        }
    }
    out
}
