pub mod health;
pub mod multipart;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ingestion::handlers as ingestion;
use crate::matching::handlers as matching;
use crate::retrieval::handlers as retrieval;
use crate::state::AppState;

/// Uploads carry two PDFs; the axum default of 2 MB is too tight.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Upload flow
        .route("/upload", post(matching::handle_upload))
        .route("/upload/", post(matching::handle_upload))
        .route("/download_resume/:id", get(matching::handle_download_resume))
        .route(
            "/download_template_by_id/:id",
            get(matching::handle_download_template),
        )
        // Template API
        .route(
            "/api/v1/templates",
            get(retrieval::handle_list_templates).post(ingestion::handle_upload_template),
        )
        .route(
            "/api/v1/templates/reindex",
            post(ingestion::handle_reindex),
        )
        .route("/api/v1/templates/search", post(retrieval::handle_search))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
