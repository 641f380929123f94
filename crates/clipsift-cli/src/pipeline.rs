//! Single-shot pipeline: transcribe, select, assemble.

use std::sync::Mutex;

use tracing::info;

use clipsift_media::{transcribe, MediaError, TranscribeOptions};
use clipsift_models::AssemblyPlan;
use clipsift_select::{configure_selector, select_segments};

use crate::config::RunConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::guard::{GuardStatus, ResourceGuard};

/// Run the full pipeline for one (video, query) pair.
///
/// Stage order is fixed: transcription, selection, assembly. The guard
/// is polled before each stage and inside assembly; whichever poll
/// trips first ends the run with the resource-limited outcome.
pub async fn run_pipeline(config: &RunConfig, guard: &ResourceGuard) -> PipelineResult<()> {
    info!(
        input = %config.input_path.display(),
        output = %config.output_path.display(),
        query = %config.query,
        model = %config.model_size,
        selection = config.selection_mode(),
        "Starting clipsift run"
    );

    check_guard(guard)?;

    let options = TranscribeOptions {
        model_size: config.model_size,
        model_dir: config.model_dir.clone(),
        binary: config.whisper_binary.clone(),
        timeout_secs: config.transcribe_timeout_secs,
        ..TranscribeOptions::default()
    };
    let transcript = transcribe(&config.input_path, &options)
        .await
        .map_err(PipelineError::Transcription)?;
    info!(segments = transcript.len(), "Transcription complete");

    check_guard(guard)?;

    let selector = configure_selector(
        config.api_key.as_deref(),
        &config.api_url,
        &config.inference_model,
    );
    let candidates = select_segments(selector.as_ref(), &transcript, &config.query).await;
    if candidates.is_empty() {
        return Err(PipelineError::NoRelevantContent);
    }
    info!(clips = candidates.len(), "Selection complete");

    check_guard(guard)?;

    let plan = AssemblyPlan::new(candidates)
        .with_fade_duration(config.fade_duration)
        .with_max_parallel(config.max_parallel);

    // The assembly checkpoint records the reading that tripped it, so
    // the resource-limited outcome reports real numbers even when a
    // re-poll after the abort would pass again.
    let tripped: Mutex<Option<(u64, u64)>> = Mutex::new(None);
    let result = clipsift_media::assemble(&config.input_path, &plan, &config.output_path, || {
        match guard.check() {
            GuardStatus::Exceeded { rss_mb, ceiling_mb } => {
                if let Ok(mut last) = tripped.lock() {
                    *last = Some((rss_mb, ceiling_mb));
                }
                false
            }
            GuardStatus::Ok { .. } | GuardStatus::Unavailable => true,
        }
    })
    .await;
    let tripped = tripped.into_inner().unwrap_or_default();
    result.map_err(|e| map_assembly_error(e, tripped, guard))?;

    info!(output = %config.output_path.display(), "Run complete");
    Ok(())
}

fn check_guard(guard: &ResourceGuard) -> PipelineResult<()> {
    match guard.check() {
        GuardStatus::Exceeded { rss_mb, ceiling_mb } => {
            Err(PipelineError::ResourceLimited { rss_mb, ceiling_mb })
        }
        GuardStatus::Ok { .. } | GuardStatus::Unavailable => Ok(()),
    }
}

fn map_assembly_error(
    error: MediaError,
    tripped: Option<(u64, u64)>,
    guard: &ResourceGuard,
) -> PipelineError {
    match error {
        MediaError::NoRelevantContent => PipelineError::NoRelevantContent,
        MediaError::Cancelled => {
            let (rss_mb, ceiling_mb) =
                tripped.unwrap_or((0, guard.ceiling_mb().unwrap_or(0)));
            PipelineError::ResourceLimited { rss_mb, ceiling_mb }
        }
        other => PipelineError::Assembly(other),
    }
}
