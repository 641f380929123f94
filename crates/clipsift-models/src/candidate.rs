//! Selection candidates and their normalization.
//!
//! Candidates come either from the inference service (untrusted) or the
//! lexical stub. Before assembly the pipeline always runs
//! [`normalize_candidates`]: sort by start, drop degenerate ranges, and
//! merge anything that overlaps or touches. Assembly only ever sees a
//! sorted, pairwise-disjoint plan.

use serde::{Deserialize, Serialize};

/// A proposed relevant time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionCandidate {
    /// Start time in seconds, >= 0.
    pub start: f64,
    /// End time in seconds, > start.
    pub end: f64,
    /// Why this range was selected (free text, may be empty).
    #[serde(default)]
    pub reason: String,
}

impl SelectionCandidate {
    pub fn new(start: f64, end: f64, reason: impl Into<String>) -> Self {
        Self {
            start,
            end,
            reason: reason.into(),
        }
    }

    /// Candidate duration in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Sort candidates by start, drop empty/inverted ranges, merge overlaps.
///
/// Merging keeps the earlier candidate's reason and joins a later one
/// only when it adds information. Idempotent: normalizing an already
/// normalized set returns it unchanged.
pub fn normalize_candidates(mut candidates: Vec<SelectionCandidate>) -> Vec<SelectionCandidate> {
    candidates.retain(|c| c.start >= 0.0 && c.end > c.start);
    candidates.sort_by(|a, b| {
        a.start
            .partial_cmp(&b.start)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut merged: Vec<SelectionCandidate> = Vec::with_capacity(candidates.len());
    for cand in candidates {
        match merged.last_mut() {
            Some(prev) if cand.start <= prev.end => {
                if cand.end > prev.end {
                    prev.end = cand.end;
                }
                if prev.reason.is_empty() {
                    prev.reason = cand.reason;
                } else if !cand.reason.is_empty() && cand.reason != prev.reason {
                    prev.reason.push_str("; ");
                    prev.reason.push_str(&cand.reason);
                }
            }
            _ => merged.push(cand),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(start: f64, end: f64) -> SelectionCandidate {
        SelectionCandidate::new(start, end, "")
    }

    #[test]
    fn sorts_and_merges_overlaps() {
        let out = normalize_candidates(vec![cand(20.0, 30.0), cand(0.0, 10.0), cand(8.0, 15.0)]);
        assert_eq!(out, vec![cand(0.0, 15.0), cand(20.0, 30.0)]);
    }

    #[test]
    fn merges_touching_ranges() {
        let out = normalize_candidates(vec![cand(0.0, 10.0), cand(10.0, 20.0)]);
        assert_eq!(out, vec![cand(0.0, 20.0)]);
    }

    #[test]
    fn drops_degenerate_ranges() {
        let out = normalize_candidates(vec![cand(5.0, 5.0), cand(10.0, 8.0), cand(-1.0, 4.0)]);
        assert!(out.is_empty());
    }

    #[test]
    fn contained_range_is_absorbed() {
        let out = normalize_candidates(vec![cand(0.0, 30.0), cand(5.0, 10.0)]);
        assert_eq!(out, vec![cand(0.0, 30.0)]);
    }

    #[test]
    fn idempotent() {
        let once = normalize_candidates(vec![cand(12.0, 18.0), cand(0.0, 10.0), cand(9.0, 11.0)]);
        let twice = normalize_candidates(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn keeps_earlier_reason_and_appends_new() {
        let out = normalize_candidates(vec![
            SelectionCandidate::new(0.0, 10.0, "mentions dogs"),
            SelectionCandidate::new(5.0, 12.0, "dog training"),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].reason, "mentions dogs; dog training");
    }
}
