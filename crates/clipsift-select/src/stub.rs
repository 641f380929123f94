//! Deterministic offline selector.
//!
//! Scores each transcript segment by lexical overlap with the query,
//! keeps the top scorers, and merges kept segments that sit close
//! together so the output reads as conversations rather than jump cuts.
//! No randomness anywhere: identical inputs always produce identical
//! selections.

use std::collections::BTreeSet;

use tracing::debug;

use clipsift_models::{SelectionCandidate, TranscriptSegment};

use crate::error::SelectResult;
use crate::Selector;

/// How many top-scoring segments to keep.
const DEFAULT_TOP_K: usize = 5;

/// Kept segments closer than this (seconds) are merged into one candidate.
const DEFAULT_MERGE_GAP_SECS: f64 = 2.0;

/// Lexical-overlap stub selector.
#[derive(Debug, Clone)]
pub struct StubSelector {
    pub top_k: usize,
    pub merge_gap_secs: f64,
}

impl Default for StubSelector {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            merge_gap_secs: DEFAULT_MERGE_GAP_SECS,
        }
    }
}

#[async_trait::async_trait]
impl Selector for StubSelector {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn select(
        &self,
        transcript: &[TranscriptSegment],
        query: &str,
    ) -> SelectResult<Vec<SelectionCandidate>> {
        Ok(self.select_sync(transcript, query))
    }
}

impl StubSelector {
    /// The actual selection; synchronous because nothing here blocks.
    pub fn select_sync(
        &self,
        transcript: &[TranscriptSegment],
        query: &str,
    ) -> Vec<SelectionCandidate> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || transcript.is_empty() {
            return Vec::new();
        }

        // Score = shared distinct tokens / query tokens. Any monotonic
        // deterministic function would do; this one is the simplest.
        let mut scored: Vec<(usize, f64)> = transcript
            .iter()
            .enumerate()
            .filter_map(|(i, seg)| {
                let tokens = tokenize(&seg.text);
                let shared = tokens.intersection(&query_tokens).count();
                if shared == 0 {
                    None
                } else {
                    Some((i, shared as f64 / query_tokens.len() as f64))
                }
            })
            .collect();

        // Highest score first; ties broken by earlier transcript position
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(self.top_k);

        let mut kept: Vec<usize> = scored.iter().map(|(i, _)| *i).collect();
        kept.sort_unstable();

        debug!(
            kept = kept.len(),
            scored = scored.len(),
            "Stub selection scored transcript"
        );

        self.merge_kept(transcript, &kept, query)
    }

    /// Merge kept segments separated by at most `merge_gap_secs`.
    fn merge_kept(
        &self,
        transcript: &[TranscriptSegment],
        kept: &[usize],
        query: &str,
    ) -> Vec<SelectionCandidate> {
        let mut candidates: Vec<SelectionCandidate> = Vec::new();

        for &i in kept {
            let seg = &transcript[i];
            match candidates.last_mut() {
                Some(prev) if seg.start - prev.end <= self.merge_gap_secs => {
                    prev.end = prev.end.max(seg.end);
                }
                _ => candidates.push(SelectionCandidate::new(
                    seg.start,
                    seg.end,
                    format!("lexical match for query: {}", query.trim()),
                )),
            }
        }

        candidates
    }
}

/// Lower-cased alphanumeric tokens, deduplicated.
fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
