//! Retrieval Ranker: the single entry point for template search.
//!
//! `search` never fails. Whatever happens downstream, the caller gets a
//! non-empty match list (unless it asked for `top_k = 0`):
//! 1. candidates at or above the threshold, nearest first, ranked 1..n
//! 2. else the single closest candidate, regardless of threshold
//! 3. else one placeholder with score 0.0 and no download reference
//!
//! Provider/store failures (including timeouts) land in case 3 with an
//! `error` category. They are logged here and not retried.

use tracing::{info, warn};

use crate::models::template::Template;
use crate::retrieval::models::{Match, PlaceholderReason};
use crate::retrieval::scoring::{select, Scored, Selection};
use crate::store::TemplateIndex;

/// Per-call search knobs. Defaults come from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub top_k: usize,
    pub score_threshold: f64,
}

impl SearchParams {
    /// Builds params from loosely-typed caller input: negative `top_k`
    /// clamps to 0, the threshold clamps to [0, 1].
    pub fn clamped(top_k: i64, score_threshold: f64) -> Self {
        Self {
            top_k: usize::try_from(top_k.max(0)).unwrap_or(usize::MAX),
            score_threshold: if score_threshold.is_nan() {
                1.0
            } else {
                score_threshold.clamp(0.0, 1.0)
            },
        }
    }
}

#[derive(Clone)]
pub struct TemplateRanker {
    index: TemplateIndex,
    defaults: SearchParams,
}

impl TemplateRanker {
    pub fn new(index: TemplateIndex, defaults: SearchParams) -> Self {
        Self { index, defaults }
    }

    pub fn defaults(&self) -> SearchParams {
        self.defaults
    }

    /// Searches with the configured defaults.
    pub async fn search_default(&self, query: &str) -> Vec<Match> {
        self.search(query, self.defaults).await
    }

    pub async fn search(&self, query: &str, params: SearchParams) -> Vec<Match> {
        if params.top_k == 0 {
            return Vec::new();
        }
        if query.trim().is_empty() {
            warn!("Template search called with a blank query");
            return vec![Match::placeholder(&PlaceholderReason::InvalidInput)];
        }

        let candidates = match self.index.query_text(query, params.top_k).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Template search degraded to placeholder: {e}");
                return vec![Match::placeholder(&PlaceholderReason::Error(e.to_string()))];
            }
        };

        let matches = rank(select(candidates, params.top_k, params.score_threshold));
        info!(
            "Template search returned {} match(es), top score {:.3}",
            matches.len(),
            matches.first().map(|m| m.similarity_score).unwrap_or(0.0)
        );
        matches
    }
}

/// Turns a policy outcome into ranked, presentation-ready matches.
fn rank(selection: Selection) -> Vec<Match> {
    match selection {
        Selection::Passed(passed) => passed
            .into_iter()
            .enumerate()
            .map(|(i, scored)| to_match(i + 1, scored))
            .collect(),
        Selection::Fallback(best) => {
            info!(
                "No template cleared the threshold; falling back to closest ({:.3})",
                best.similarity
            );
            vec![to_match(1, best)]
        }
        Selection::Empty => vec![Match::placeholder(&PlaceholderReason::NoCandidates)],
    }
}

fn to_match(rank: usize, scored: Scored) -> Match {
    let Scored {
        candidate,
        similarity,
    } = scored;
    let template = Template::from_stored(&candidate.id, candidate.content, candidate.metadata);
    Match::from_template(rank, similarity, template)
}
