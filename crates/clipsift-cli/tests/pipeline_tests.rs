//! Pipeline driver integration tests.
//!
//! These exercise the public driver surface without external tools:
//! configuration resolution, guard-triggered aborts, and the error
//! classes a run reports before any media binary is needed.

use clap::Parser;

use clipsift_cli::config::Cli;
use clipsift_cli::{
    run_pipeline, PipelineError, ResourceGuard, RunConfig, EXIT_RESOURCE, EXIT_TRANSCRIPTION,
};

fn resolve(args: &[&str]) -> RunConfig {
    let cli = Cli::parse_from(std::iter::once("clipsift").chain(args.iter().copied()));
    RunConfig::resolve(cli).expect("config should resolve")
}

#[test]
fn flags_fully_describe_a_run() {
    let config = resolve(&[
        "--query",
        "dogs",
        "--input",
        "talk.mp4",
        "--output",
        "reel.mp4",
        "--model",
        "tiny",
        "--transcribe-timeout",
        "120",
    ]);

    assert_eq!(config.query, "dogs");
    assert_eq!(config.transcribe_timeout_secs, 120);
    // No credential in flags: selection resolves to the offline stub
    if std::env::var("GROQ_API_KEY").is_err() {
        assert_eq!(config.selection_mode(), "stub");
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn exceeded_ceiling_ends_run_before_any_output() {
    let config = resolve(&[
        "--query",
        "dogs",
        "--input",
        "missing.mp4",
        "--output",
        "/tmp/clipsift-guard-test.mp4",
        "--memory-limit-mb",
        "0",
    ]);
    let guard = ResourceGuard::new(config.memory_limit_mb);

    let err = run_pipeline(&config, &guard).await.unwrap_err();
    assert!(matches!(err, PipelineError::ResourceLimited { .. }));
    assert_eq!(err.exit_code(), EXIT_RESOURCE);
    assert!(!std::path::Path::new("/tmp/clipsift-guard-test.mp4").exists());
}

#[tokio::test]
async fn unreadable_input_reports_transcription_failure() {
    let config = resolve(&["--query", "dogs", "--input", "/nonexistent/talk.mp4"]);
    let guard = ResourceGuard::new(None);

    let err = run_pipeline(&config, &guard).await.unwrap_err();
    assert!(matches!(err, PipelineError::Transcription(_)));
    assert_eq!(err.exit_code(), EXIT_TRANSCRIPTION);
}
