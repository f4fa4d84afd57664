mod blob;
mod config;
mod embedding;
mod errors;
mod ingestion;
mod llm_client;
mod matching;
mod models;
mod retrieval;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::blob::{BlobStore, S3BlobStore};
use crate::config::Config;
use crate::embedding::OpenAiEmbedder;
use crate::ingestion::pipeline::ingest_all;
use crate::llm_client::LlmClient;
use crate::retrieval::inspect::{inspect_collection, DEFAULT_SAMPLE_SIZE};
use crate::retrieval::ranker::{SearchParams, TemplateRanker};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{InMemoryStore, PgVectorStore, StoreBackend, TemplateIndex, TemplateStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Template Match API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let template_blobs: Arc<dyn BlobStore> = Arc::new(S3BlobStore::new(
        s3.clone(),
        &config.s3_bucket,
        &config.template_prefix,
    ));
    let resume_blobs: Arc<dyn BlobStore> = Arc::new(S3BlobStore::new(
        s3,
        &config.s3_bucket,
        &config.resume_prefix,
    ));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize template collection
    let index = build_template_index(&config).await?;
    info!(
        "Template collection '{}' initialized (embedding model: {})",
        config.collection,
        index.embedding_model()
    );

    // One-shot commands: `template-match-api index` / `template-match-api inspect`
    match std::env::args().nth(1).as_deref() {
        Some("index") => {
            let report = ingest_all(template_blobs.as_ref(), &index).await?;
            info!(
                "Indexed {}/{} template(s); {} failure(s)",
                report.indexed.len(),
                report.total,
                report.failures.len()
            );
            return Ok(());
        }
        Some("inspect") => {
            let listing =
                inspect_collection(&index, &config.collection, DEFAULT_SAMPLE_SIZE).await?;
            info!(
                "Collection '{}' holds {} template(s)",
                listing.collection, listing.count
            );
            for template in &listing.sample {
                info!(
                    "{} | {} | {} | {:?}",
                    template.id, template.title, template.filename, template.preview
                );
            }
            return Ok(());
        }
        _ => {}
    }

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());

    let ranker = TemplateRanker::new(
        index.clone(),
        SearchParams {
            top_k: config.top_k,
            score_threshold: config.score_threshold,
        },
    );
    info!(
        "Template search defaults: top_k={} score_threshold={:.2}",
        config.top_k, config.score_threshold
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        llm,
        index,
        ranker,
        template_blobs,
        resume_blobs,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the collection handle: embedding provider plus the configured
/// vector-store backend.
async fn build_template_index(config: &Config) -> Result<TemplateIndex> {
    let embedder = OpenAiEmbedder::new(
        &config.embedding_base_url,
        config.openai_api_key.clone(),
        config.embedding_model.clone(),
    )?;

    let store: Arc<dyn TemplateStore> = match config.store_backend {
        StoreBackend::PgVector => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the pgvector store")?;
            let store = PgVectorStore::connect(
                database_url,
                &config.collection,
                config.distance_metric,
                config.provider_timeout,
            )
            .await?;
            store.ensure_schema().await?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory template store; the index is lost on restart");
            Arc::new(InMemoryStore::new(config.distance_metric))
        }
    };

    Ok(TemplateIndex::new(
        Arc::new(embedder),
        store,
        config.provider_timeout,
    ))
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "template-match-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
