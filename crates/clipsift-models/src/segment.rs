//! Timestamped transcript segments.

use serde::{Deserialize, Serialize};

use crate::timestamp::format_seconds;

/// One timestamped piece of transcribed speech.
///
/// Invariants (upheld by the Transcriber): `start < end`, segments are
/// produced in non-decreasing `start` order and do not overlap. Gaps
/// between segments are allowed (silence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds from the beginning of the source.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Transcribed text, whitespace-trimmed.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Segment duration in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Check that segments are sorted by start and pairwise non-overlapping.
pub fn segments_are_ordered(segments: &[TranscriptSegment]) -> bool {
    segments
        .windows(2)
        .all(|w| w[0].start <= w[1].start && w[0].end <= w[1].start + 1e-6)
}

/// End of the last segment, or 0.0 for an empty transcript.
pub fn transcript_end(segments: &[TranscriptSegment]) -> f64 {
    segments.iter().fold(0.0, |acc, s| acc.max(s.end))
}

/// Render a transcript as `[HH:MM:SS] text` lines for the inference prompt.
pub fn render_transcript(segments: &[TranscriptSegment]) -> String {
    let mut out = String::new();
    for seg in segments {
        let text = seg.text.trim();
        if text.is_empty() {
            continue;
        }
        out.push_str(&format!("[{}] {}\n", format_seconds(seg.start), text));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text)
    }

    #[test]
    fn ordering_check() {
        let ordered = vec![seg(0.0, 10.0, "intro"), seg(10.0, 60.0, "about dogs")];
        assert!(segments_are_ordered(&ordered));

        let overlapping = vec![seg(0.0, 20.0, "a"), seg(10.0, 30.0, "b")];
        assert!(!segments_are_ordered(&overlapping));

        let out_of_order = vec![seg(10.0, 20.0, "a"), seg(0.0, 5.0, "b")];
        assert!(!segments_are_ordered(&out_of_order));
    }

    #[test]
    fn transcript_end_of_empty_is_zero() {
        assert_eq!(transcript_end(&[]), 0.0);
        assert_eq!(transcript_end(&[seg(0.0, 12.5, "x")]), 12.5);
    }

    #[test]
    fn renders_timestamped_lines() {
        let segments = vec![seg(0.0, 10.0, " intro "), seg(90.0, 95.0, "outro")];
        let rendered = render_transcript(&segments);
        assert_eq!(rendered, "[00:00:00] intro\n[00:01:30] outro\n");
    }

    #[test]
    fn render_skips_empty_text() {
        let segments = vec![seg(0.0, 1.0, "  "), seg(1.0, 2.0, "hello")];
        assert_eq!(render_transcript(&segments), "[00:00:01] hello\n");
    }
}
