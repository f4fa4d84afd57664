use std::sync::Arc;

use crate::blob::BlobStore;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::retrieval::ranker::TemplateRanker;
use crate::store::TemplateIndex;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: LlmClient,
    /// Collection handle used by ingestion.
    pub index: TemplateIndex,
    /// Search entry point; wraps the same index.
    pub ranker: TemplateRanker,
    /// Template library (ingestion source, template downloads).
    pub template_blobs: Arc<dyn BlobStore>,
    /// Uploaded resumes.
    pub resume_blobs: Arc<dyn BlobStore>,
}
