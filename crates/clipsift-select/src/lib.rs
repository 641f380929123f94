//! Query-relevant segment selection.
//!
//! Two selector implementations sit behind one trait: an
//! inference-backed selector that delegates to an external
//! language-understanding service, and a deterministic lexical stub for
//! offline use. The mode is chosen once at configuration time; any
//! inference failure at run time falls back to the stub, so selection is
//! never a fatal stage.

pub mod error;
pub mod inference;
pub mod stub;

pub use error::{SelectError, SelectResult};
pub use inference::{InferenceSelector, DEFAULT_API_URL, DEFAULT_MODEL};
pub use stub::StubSelector;

use tracing::{info, warn};

use clipsift_models::{normalize_candidates, transcript_end, SelectionCandidate, TranscriptSegment};

/// The documented placeholder credential that means "not configured".
pub const PLACEHOLDER_API_KEY: &str = "groq-key";

/// A segment selector: transcript + query in, candidate ranges out.
#[async_trait::async_trait]
pub trait Selector: Send + Sync {
    /// Short mode name for logs ("inference" or "stub").
    fn name(&self) -> &'static str;

    async fn select(
        &self,
        transcript: &[TranscriptSegment],
        query: &str,
    ) -> SelectResult<Vec<SelectionCandidate>>;
}

/// Whether a credential is real (present and not a placeholder).
pub fn credential_is_usable(key: Option<&str>) -> bool {
    match key {
        Some(key) => {
            !key.trim().is_empty() && key != PLACEHOLDER_API_KEY && !key.starts_with("placeholder")
        }
        None => false,
    }
}

/// Pick the selector for this run, resolved once at configuration time.
pub fn configure_selector(
    api_key: Option<&str>,
    api_url: &str,
    model: &str,
) -> Box<dyn Selector> {
    if credential_is_usable(api_key) {
        info!("Inference credential configured, using inference-backed selection");
        Box::new(InferenceSelector::new(
            api_key.unwrap_or_default(),
            api_url,
            model,
        ))
    } else {
        info!("No usable inference credential, using deterministic stub selection");
        Box::new(StubSelector::default())
    }
}

/// Run selection with stub fallback, bounds filtering, and normalization.
///
/// This is the only place the pipeline calls; whatever the selector
/// proposes, the result is sorted, non-overlapping, and confined to the
/// transcript's time range. Never fails: inference errors degrade to the
/// stub, and an empty result is a legitimate outcome the caller maps to
/// its no-relevant-content error.
pub async fn select_segments(
    selector: &dyn Selector,
    transcript: &[TranscriptSegment],
    query: &str,
) -> Vec<SelectionCandidate> {
    let raw = match selector.select(transcript, query).await {
        Ok(candidates) => candidates,
        Err(e) if selector.name() != "stub" => {
            warn!(error = %e, "Inference selection failed, falling back to stub");
            StubSelector::default()
                .select(transcript, query)
                .await
                .unwrap_or_default()
        }
        Err(e) => {
            warn!(error = %e, "Stub selection failed");
            Vec::new()
        }
    };

    let bounded = drop_out_of_bounds(raw, transcript_end(transcript));
    normalize_candidates(bounded)
}

/// Drop candidates outside the transcript's time range. Partial validity
/// is expected from the inference service; drops are logged, not fatal.
fn drop_out_of_bounds(
    candidates: Vec<SelectionCandidate>,
    end_bound: f64,
) -> Vec<SelectionCandidate> {
    candidates
        .into_iter()
        .filter(|c| {
            let ok = c.start >= 0.0 && c.end > c.start && c.end <= end_bound + 1e-3;
            if !ok {
                warn!(
                    start = c.start,
                    end = c.end,
                    bound = end_bound,
                    "Dropping out-of-bounds candidate"
                );
            }
            ok
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text)
    }

    #[test]
    fn placeholder_credentials_are_unusable() {
        assert!(!credential_is_usable(None));
        assert!(!credential_is_usable(Some("")));
        assert!(!credential_is_usable(Some("   ")));
        assert!(!credential_is_usable(Some("groq-key")));
        assert!(!credential_is_usable(Some("placeholder-123")));
        assert!(credential_is_usable(Some("gsk_real_key")));
    }

    #[test]
    fn configure_picks_stub_without_credential() {
        let selector = configure_selector(None, DEFAULT_API_URL, DEFAULT_MODEL);
        assert_eq!(selector.name(), "stub");
        let selector = configure_selector(Some("placeholder"), DEFAULT_API_URL, DEFAULT_MODEL);
        assert_eq!(selector.name(), "stub");
    }

    #[test]
    fn configure_picks_inference_with_credential() {
        let selector = configure_selector(Some("gsk_abc"), DEFAULT_API_URL, DEFAULT_MODEL);
        assert_eq!(selector.name(), "inference");
    }

    #[test]
    fn bounds_filter_drops_overhanging_range() {
        // Service proposes [55, 65) against a 60s transcript
        let out = drop_out_of_bounds(
            vec![
                SelectionCandidate::new(55.0, 65.0, "late"),
                SelectionCandidate::new(10.0, 60.0, "fine"),
            ],
            60.0,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].reason, "fine");
    }

    #[test]
    fn bounds_filter_drops_negative_and_inverted() {
        let out = drop_out_of_bounds(
            vec![
                SelectionCandidate::new(-1.0, 5.0, ""),
                SelectionCandidate::new(8.0, 8.0, ""),
                SelectionCandidate::new(9.0, 7.0, ""),
            ],
            60.0,
        );
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn select_segments_normalizes_stub_output() {
        let transcript = vec![
            seg(0.0, 10.0, "intro"),
            seg(10.0, 60.0, "all about dogs and more dogs"),
        ];
        let selector = StubSelector::default();
        let out = select_segments(&selector, &transcript, "dogs").await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start, 10.0);
        assert_eq!(out[0].end, 60.0);
    }

    #[tokio::test]
    async fn inference_failure_falls_back_to_stub() {
        // Unroutable endpoint forces a request error
        let selector = InferenceSelector::new("gsk_x", "http://127.0.0.1:1/v1/chat", DEFAULT_MODEL);
        let transcript = vec![seg(0.0, 10.0, "intro"), seg(10.0, 60.0, "about dogs")];
        let out = select_segments(&selector, &transcript, "dogs").await;
        // Stub fallback still finds the dog segment
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start, 10.0);
    }

    #[tokio::test]
    async fn out_of_bounds_service_range_is_dropped() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        // Service proposes [55, 65) and [10, 30) against a 60s transcript;
        // only the in-bounds range survives.
        let server = MockServer::start().await;
        let reply = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content":
                r#"{"conversations": [
                    {"start": 55, "end": 65, "reason": "overhangs"},
                    {"start": 10, "end": 30, "reason": "fits"}
                ]}"#
            }}]
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .mount(&server)
            .await;

        let selector = InferenceSelector::new("gsk_x", server.uri(), DEFAULT_MODEL);
        let transcript = vec![seg(0.0, 10.0, "intro"), seg(10.0, 60.0, "about dogs")];
        let out = select_segments(&selector, &transcript, "dogs").await;
        assert_eq!(out, vec![SelectionCandidate::new(10.0, 30.0, "fits")]);
    }

    #[tokio::test]
    async fn no_matches_is_empty_not_error() {
        let selector = StubSelector::default();
        let transcript = vec![seg(0.0, 10.0, "cooking")];
        let out = select_segments(&selector, &transcript, "astrophysics").await;
        assert!(out.is_empty());
    }
}
