//! Clip assembly: extract selected ranges, fade boundaries, concatenate.
//!
//! # Strategy
//!
//! Each candidate range is extracted to its own file with a two-pass seek
//! (fast input seek to get near the range, accurate output seek for a
//! frame-exact cut) and re-encoded with the plan's encoding settings plus
//! fade in/out filters. Extractions run concurrently under a semaphore;
//! the concat demuxer then joins them in chronological order with stream
//! copy, so completion order never affects output order.
//!
//! Boundary rule: every internal clip boundary gets a symmetric fade of
//! the plan's fade duration, but the first clip opens and the last clip
//! closes on a hard cut. A fade never exceeds half its clip's duration.
//!
//! Only the final render writes to the output path; a failed render
//! removes whatever partial container it left, and failures before that
//! step never touch the output path at all.

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use clipsift_models::{AssemblyPlan, SelectionCandidate};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_media;

/// Slack allowed between a candidate's end and the container duration,
/// absorbing transcript/container disagreement about the final frame.
const DURATION_TOLERANCE_SECS: f64 = 1.0;

/// Assemble the selected ranges into one output file.
///
/// `checkpoint` is polled before each extraction and before the final
/// concat; returning `false` aborts the assembly with
/// [`MediaError::Cancelled`] (used by the pipeline's resource guard).
pub async fn assemble(
    video_path: impl AsRef<Path>,
    plan: &AssemblyPlan,
    output_path: impl AsRef<Path>,
    checkpoint: impl Fn() -> bool + Sync,
) -> MediaResult<()> {
    let video_path = video_path.as_ref();
    let output_path = output_path.as_ref();
    let checkpoint = &checkpoint;

    if plan.is_empty() {
        return Err(MediaError::NoRelevantContent);
    }

    let info = probe_media(video_path).await?;
    let clips = plan_clips(&plan.candidates, plan.fade_duration, info.duration)?;

    info!(
        input = %video_path.display(),
        output = %output_path.display(),
        clips = clips.len(),
        total_secs = format!("{:.1}", clips.iter().map(|c| c.duration).sum::<f64>()),
        "Assembling output"
    );

    let temp_dir = tempfile::tempdir()?;

    // Extract all clips concurrently, bounded by the semaphore. Results
    // carry their index so chronological order survives completion order.
    let semaphore = Arc::new(Semaphore::new(plan.max_parallel.max(1)));
    let extract_futures = clips.iter().enumerate().map(|(i, clip)| {
        let semaphore = semaphore.clone();
        let seg_path = temp_dir.path().join(format!("seg_{:04}.mp4", i));
        async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| MediaError::Cancelled)?;
            if !checkpoint() {
                return Err(MediaError::Cancelled);
            }
            extract_clip(video_path, &seg_path, clip, plan).await?;
            Ok::<_, MediaError>((i, seg_path))
        }
    });

    let mut segment_paths = vec![None; clips.len()];
    // All-or-nothing: the first failure aborts the whole assembly.
    for result in join_all(extract_futures).await {
        let (i, path) = result?;
        segment_paths[i] = Some(path);
    }

    if !checkpoint() {
        return Err(MediaError::Cancelled);
    }

    // Concat list in chronological order
    let concat_list = temp_dir.path().join("concat.txt");
    let list_content: String = segment_paths
        .iter()
        .flatten()
        .map(|p| format!("file '{}'\n", p.display()))
        .collect();
    tokio::fs::write(&concat_list, &list_content).await?;

    concat_segments(&concat_list, output_path).await
}

/// One extraction job: absolute source range plus resolved fades.
#[derive(Debug, Clone, PartialEq)]
struct ClipJob {
    start: f64,
    duration: f64,
    fade_in: f64,
    fade_out: f64,
}

/// Validate candidates against the source duration and resolve per-clip
/// fade lengths.
fn plan_clips(
    candidates: &[SelectionCandidate],
    fade_duration: f64,
    source_duration: f64,
) -> MediaResult<Vec<ClipJob>> {
    let last = candidates.len().saturating_sub(1);
    let mut clips = Vec::with_capacity(candidates.len());

    for (i, cand) in candidates.iter().enumerate() {
        if cand.start >= source_duration || cand.end > source_duration + DURATION_TOLERANCE_SECS {
            return Err(MediaError::RangeOutOfBounds {
                end: cand.end,
                duration: source_duration,
            });
        }

        // Within tolerance, trim to the actual container end
        let end = cand.end.min(source_duration);
        let duration = end - cand.start;

        // A fade longer than half the clip would overlap its own mirror;
        // clamp rather than corrupt the clip.
        let max_fade = duration / 2.0;
        let fade = fade_duration.min(max_fade).max(0.0);

        clips.push(ClipJob {
            start: cand.start,
            duration,
            fade_in: if i == 0 { 0.0 } else { fade },
            fade_out: if i == last { 0.0 } else { fade },
        });
    }

    Ok(clips)
}

/// Extract one clip with accurate seeking, encoding, and fades.
async fn extract_clip(
    input: &Path,
    output: &Path,
    clip: &ClipJob,
    plan: &AssemblyPlan,
) -> MediaResult<()> {
    debug!(
        start = format!("{:.3}", clip.start),
        duration = format!("{:.3}", clip.duration),
        fade_in = clip.fade_in,
        fade_out = clip.fade_out,
        "Extracting clip"
    );

    // Two-pass seeking: fast input seek to a nearby keyframe, then an
    // accurate output seek for a frame-exact cut.
    let fast_seek = (clip.start - 5.0).max(0.0);
    let accurate_seek = clip.start - fast_seek;

    let mut cmd = FfmpegCommand::new(input, output)
        .seek(fast_seek)
        .output_seek(accurate_seek)
        .duration(clip.duration)
        .encoding(&plan.encoding)
        .output_arg("-avoid_negative_ts")
        .output_arg("make_zero");

    if let Some((vf, af)) = fade_filters(clip) {
        cmd = cmd.video_filter(vf).audio_filter(af);
    }

    FfmpegRunner::new().run(&cmd).await
}

/// Build fade/afade filter chains for a clip, or None for hard cuts on
/// both ends.
fn fade_filters(clip: &ClipJob) -> Option<(String, String)> {
    let mut video = Vec::new();
    let mut audio = Vec::new();

    if clip.fade_in > 0.0 {
        video.push(format!("fade=t=in:st=0:d={:.3}", clip.fade_in));
        audio.push(format!("afade=t=in:st=0:d={:.3}", clip.fade_in));
    }
    if clip.fade_out > 0.0 {
        let st = (clip.duration - clip.fade_out).max(0.0);
        video.push(format!("fade=t=out:st={:.3}:d={:.3}", st, clip.fade_out));
        audio.push(format!("afade=t=out:st={:.3}:d={:.3}", st, clip.fade_out));
    }

    if video.is_empty() {
        None
    } else {
        Some((video.join(","), audio.join(",")))
    }
}

/// Join extracted clips with the concat demuxer (stream copy).
///
/// This is the only step that writes to the output path; on failure it
/// removes whatever partial container it left behind.
async fn concat_segments(concat_list: &Path, output_path: &Path) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(concat_list, output_path)
        .input_arg("-f")
        .input_arg("concat")
        .input_arg("-safe")
        .input_arg("0")
        .output_arg("-c")
        .output_arg("copy")
        .output_arg("-movflags")
        .output_arg("+faststart");

    if let Err(e) = FfmpegRunner::new().run(&cmd).await {
        if tokio::fs::remove_file(output_path).await.is_ok() {
            warn!(output = %output_path.display(), "Removed partial output after failed render");
        }
        return Err(match e {
            MediaError::FfmpegFailed { stderr, .. } => {
                MediaError::encode("concat failed to produce a valid container", stderr)
            }
            other => other,
        });
    }

    info!(output = %output_path.display(), "Assembly complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipsift_models::AssemblyPlan;

    fn cand(start: f64, end: f64) -> SelectionCandidate {
        SelectionCandidate::new(start, end, "")
    }

    #[test]
    fn internal_boundaries_fade_outer_edges_hard_cut() {
        let clips = plan_clips(&[cand(0.0, 10.0), cand(20.0, 30.0), cand(40.0, 50.0)], 0.5, 60.0)
            .unwrap();
        assert_eq!(clips[0].fade_in, 0.0);
        assert_eq!(clips[0].fade_out, 0.5);
        assert_eq!(clips[1].fade_in, 0.5);
        assert_eq!(clips[1].fade_out, 0.5);
        assert_eq!(clips[2].fade_in, 0.5);
        assert_eq!(clips[2].fade_out, 0.0);
    }

    #[test]
    fn single_clip_has_no_fades() {
        let clips = plan_clips(&[cand(10.0, 60.0)], 0.5, 60.0).unwrap();
        assert_eq!(clips[0].fade_in, 0.0);
        assert_eq!(clips[0].fade_out, 0.0);
        assert!((clips[0].duration - 50.0).abs() < 1e-9);
    }

    #[test]
    fn short_clip_fade_clamped_to_half_duration() {
        // 0.6s clip with a 0.5s configured fade: effective fade is 0.3s
        let clips = plan_clips(&[cand(0.0, 5.0), cand(10.0, 10.6), cand(20.0, 25.0)], 0.5, 30.0)
            .unwrap();
        assert!((clips[1].fade_in - 0.3).abs() < 1e-9);
        assert!((clips[1].fade_out - 0.3).abs() < 1e-9);
    }

    #[test]
    fn range_past_duration_is_rejected() {
        let err = plan_clips(&[cand(55.0, 65.0)], 0.5, 60.0).unwrap_err();
        assert!(matches!(err, MediaError::RangeOutOfBounds { .. }));
    }

    #[test]
    fn end_within_tolerance_is_trimmed() {
        let clips = plan_clips(&[cand(10.0, 60.5)], 0.5, 60.0).unwrap();
        assert!((clips[0].duration - 50.0).abs() < 1e-9);
    }

    #[test]
    fn fade_filter_strings() {
        let clip = ClipJob {
            start: 0.0,
            duration: 10.0,
            fade_in: 0.5,
            fade_out: 0.5,
        };
        let (vf, af) = fade_filters(&clip).unwrap();
        assert_eq!(vf, "fade=t=in:st=0:d=0.500,fade=t=out:st=9.500:d=0.500");
        assert_eq!(af, "afade=t=in:st=0:d=0.500,afade=t=out:st=9.500:d=0.500");

        let hard = ClipJob {
            start: 0.0,
            duration: 10.0,
            fade_in: 0.0,
            fade_out: 0.0,
        };
        assert!(fade_filters(&hard).is_none());
    }

    #[tokio::test]
    async fn empty_plan_is_no_relevant_content() {
        let plan = AssemblyPlan::new(vec![]);
        let err = assemble("in.mp4", &plan, "out.mp4", || true)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NoRelevantContent));
    }

    #[tokio::test]
    async fn failure_before_render_leaves_existing_output_alone() {
        // A file at the output path from an earlier successful run must
        // survive a later run that fails before anything is rendered.
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("reel.mp4");
        tokio::fs::write(&output, b"previous run").await.unwrap();

        let err = assemble("in.mp4", &AssemblyPlan::new(vec![]), &output, || true)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NoRelevantContent));
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"previous run");

        let plan = AssemblyPlan::new(vec![cand(0.0, 10.0)]);
        let err = assemble("/nonexistent.mp4", &plan, &output, || true)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::MediaUnreadable { .. }));
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"previous run");
    }

    #[tokio::test]
    async fn tripped_checkpoint_cancels_before_probe_work() {
        // Plan is non-empty but the input doesn't exist; the unreadable
        // probe error fires first, proving no output is written either way.
        let plan = AssemblyPlan::new(vec![cand(0.0, 10.0)]);
        let err = assemble("/nonexistent.mp4", &plan, "/tmp/clipsift-test-out.mp4", || false)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::MediaUnreadable { .. }));
    }
}
