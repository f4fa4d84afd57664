//! Distance-to-similarity conversion and the threshold/fallback policy.
//!
//! `similarity = 1.0 - min(distance, 1.0)` is a linear heuristic, not a
//! calibrated probability. It assumes the store's distance is bounded near
//! [0, 1] (unit-normalized embeddings). With an unbounded metric every
//! distance above 1.0 collapses to similarity 0.0, and the threshold needs
//! recalibrating against that store's real distance range.

use crate::store::Candidate;

/// Converts a store distance into a similarity in [0, 1].
///
/// Negative distances clamp to 1.0, distances above 1.0 clamp to 0.0, and a
/// NaN distance scores 0.0.
pub fn distance_to_similarity(distance: f64) -> f64 {
    if distance.is_nan() {
        return 0.0;
    }
    1.0 - distance.clamp(0.0, 1.0)
}

/// A candidate paired with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub candidate: Candidate,
    pub similarity: f64,
}

/// Outcome of applying the threshold policy to a candidate list.
#[derive(Debug, PartialEq)]
pub enum Selection {
    /// Candidates at or above the threshold, nearest first.
    Passed(Vec<Scored>),
    /// Nothing cleared the threshold; the single closest candidate.
    Fallback(Scored),
    /// The store returned no candidates.
    Empty,
}

/// Scores `candidates` and applies the threshold policy.
///
/// At most `top_k` candidates are considered. The boundary is inclusive:
/// `similarity == threshold` passes.
///
/// Passing candidates come back with non-increasing similarity. For a store
/// that honours the nearest-first contract this is exactly store order. A
/// store that returns candidates out of order gets re-sorted by score rather
/// than passed through; equal scores keep their store order.
pub fn select(candidates: Vec<Candidate>, top_k: usize, threshold: f64) -> Selection {
    let mut scored: Vec<Scored> = candidates
        .into_iter()
        .take(top_k)
        .map(|candidate| Scored {
            similarity: distance_to_similarity(candidate.distance),
            candidate,
        })
        .collect();

    if scored.is_empty() {
        return Selection::Empty;
    }

    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    if scored.iter().any(|s| s.similarity >= threshold) {
        scored.retain(|s| s.similarity >= threshold);
        return Selection::Passed(scored);
    }

    // first minimum wins on ties
    let closest = scored
        .into_iter()
        .reduce(|best, next| {
            if next.candidate.distance.total_cmp(&best.candidate.distance).is_lt() {
                next
            } else {
                best
            }
        });
    match closest {
        Some(best) => Selection::Fallback(best),
        None => Selection::Empty,
    }
}
