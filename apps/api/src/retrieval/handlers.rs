//! Axum route handlers for template search and collection inspection.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::retrieval::inspect::{inspect_collection, CollectionListing, DEFAULT_SAMPLE_SIZE};
use crate::retrieval::models::Match;
use crate::retrieval::ranker::SearchParams;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<i64>,
    pub score_threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub matches: Vec<Match>,
}

/// POST /api/v1/templates/search
///
/// Omitted knobs fall back to the configured defaults. A negative `top_k`
/// clamps to 0 and yields an empty list.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    if request.query.trim().is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }

    let defaults = state.ranker.defaults();
    let params = SearchParams::clamped(
        request
            .top_k
            .unwrap_or_else(|| i64::try_from(defaults.top_k).unwrap_or(i64::MAX)),
        request.score_threshold.unwrap_or(defaults.score_threshold),
    );

    let matches = state.ranker.search(&request.query, params).await;
    Ok(Json(SearchResponse { matches }))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

/// GET /api/v1/templates
///
/// Collection size plus a sample of indexed templates (`?limit=`, default 5,
/// capped at 50).
pub async fn handle_list_templates(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<CollectionListing>, AppError> {
    let listing = inspect_collection(
        &state.index,
        &state.config.collection,
        params.limit.unwrap_or(DEFAULT_SAMPLE_SIZE),
    )
    .await?;
    Ok(Json(listing))
}
