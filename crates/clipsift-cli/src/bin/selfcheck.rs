//! Environment self-check: verifies the external tools a run needs
//! before any video is touched.

use std::path::Path;
use std::process::Command;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let model_dir = std::env::var("WHISPER_MODEL_DIR").unwrap_or_else(|_| "models".to_string());
    let whisper = std::env::var("WHISPER_BINARY")
        .unwrap_or_else(|_| clipsift_media::transcribe::DEFAULT_WHISPER_BINARY.to_string());

    println!("clipsift-selfcheck: starting with model_dir={}", model_dir);

    ensure_ffmpeg()?;
    ensure_binary("ffprobe")?;
    ensure_binary(&whisper)?;
    check_models(&model_dir);

    println!("clipsift-selfcheck: ok");
    Ok(())
}

fn ensure_ffmpeg() -> anyhow::Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "ffmpeg -version failed: {:?}",
            output.status
        ));
    }
    Ok(())
}

fn ensure_binary(name: &str) -> anyhow::Result<()> {
    which::which(name).map_err(|_| anyhow::anyhow!("{} not found on PATH", name))?;
    Ok(())
}

// Missing model files are a warning, not a failure; the pipeline
// reports them precisely when a run actually needs one.
fn check_models(model_dir: &str) {
    let dir = Path::new(model_dir);
    if !dir.is_dir() {
        println!(
            "clipsift-selfcheck: warning: model dir {} does not exist",
            model_dir
        );
        return;
    }
    let has_model = std::fs::read_dir(dir)
        .ok()
        .map(|entries| {
            entries.flatten().any(|e| {
                e.file_name()
                    .to_string_lossy()
                    .strip_prefix("ggml-")
                    .is_some_and(|rest| rest.ends_with(".bin"))
            })
        })
        .unwrap_or(false);
    if !has_model {
        println!(
            "clipsift-selfcheck: warning: no ggml-*.bin models under {}",
            model_dir
        );
    }
}
