use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::extract::{extract_text, DocumentKind};
use super::IngestError;
use crate::blob::{Blob, BlobError, BlobStore};
use crate::models::template::Metadata;
use crate::store::TemplateIndex;

/// Content shorter than this (after trimming) is treated as noise.
pub const MIN_CONTENT_CHARS: usize = 10;

/// Indexes one template. Upsert semantics: re-ingesting an id overwrites it,
/// and identical input reproduces an equivalent entry.
pub async fn ingest(
    index: &TemplateIndex,
    id: &str,
    content: &str,
    metadata: &Metadata,
) -> Result<(), IngestError> {
    if id.trim().is_empty() {
        return Err(IngestError::InvalidInput("template id is empty".to_string()));
    }
    check_content(id, content)?;

    index.upsert_text(id, content, metadata).await?;
    Ok(())
}

fn check_content(id: &str, content: &str) -> Result<(), IngestError> {
    if content.trim().chars().count() < MIN_CONTENT_CHARS {
        return Err(IngestError::NoExtractableContent(id.to_string()));
    }
    Ok(())
}

/// A blob's extracted text and index metadata, checked and ready to embed.
#[derive(Debug, Clone)]
pub struct PreparedTemplate {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
}

/// Extracts and validates a blob's text without touching the index. Fails
/// for empty or unsupported files and for text below `MIN_CONTENT_CHARS`.
pub async fn prepare_blob(blob: Blob) -> Result<PreparedTemplate, IngestError> {
    let id = blob.info.id.clone();
    if blob.bytes.is_empty() {
        return Err(IngestError::NoExtractableContent(id));
    }

    let filename = blob.filename();
    let kind = DocumentKind::detect(blob.content_type.as_deref(), &filename, &blob.bytes).ok_or_else(
        || IngestError::Extraction {
            id: id.clone(),
            message: format!(
                "unsupported file type {}",
                blob.content_type.as_deref().unwrap_or("(unknown)")
            ),
        },
    )?;

    let metadata = template_metadata(&blob, &filename, kind);
    let text = extract_text(&id, kind, blob.bytes).await?;
    check_content(&id, &text)?;
    info!("Extracted {} characters from {filename}", text.chars().count());

    Ok(PreparedTemplate { id, text, metadata })
}

/// Extracts text from a fetched blob and ingests it under the blob id.
pub async fn ingest_blob(index: &TemplateIndex, blob: Blob) -> Result<String, IngestError> {
    let prepared = prepare_blob(blob).await?;
    ingest(index, &prepared.id, &prepared.text, &prepared.metadata).await?;
    Ok(prepared.id)
}

/// Metadata stored alongside a template: blob id, display title, filename,
/// file type, and optional category and upload time.
fn template_metadata(blob: &Blob, filename: &str, kind: DocumentKind) -> Metadata {
    let title = blob
        .metadata
        .get("title")
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| filename.to_string());

    let mut metadata = Metadata::new();
    metadata.insert("file_id".to_string(), Value::from(blob.info.id.as_str()));
    metadata.insert("title".to_string(), Value::from(title));
    metadata.insert("filename".to_string(), Value::from(filename));
    metadata.insert("file_type".to_string(), Value::from(kind.label()));
    if let Some(category) = blob.metadata.get("category").filter(|c| !c.trim().is_empty()) {
        metadata.insert("category".to_string(), Value::from(category.as_str()));
    }
    if let Some(uploaded_at) = blob.info.last_modified {
        metadata.insert("uploaded_at".to_string(), Value::from(uploaded_at.to_rfc3339()));
    }
    metadata
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub id: String,
    pub kind: &'static str,
    pub message: String,
}

/// Per-item outcome of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub total: usize,
    pub indexed: Vec<String>,
    pub failures: Vec<IngestFailure>,
}

/// Ingests every blob in `blobs`. Item failures are collected and the batch
/// continues; only a failure to list the source aborts.
pub async fn ingest_all(blobs: &dyn BlobStore, index: &TemplateIndex) -> Result<IngestReport, IngestError> {
    let listing = blobs
        .list()
        .await
        .map_err(|e| IngestError::Blob(e.to_string()))?;

    info!(
        "Indexing {} template blob(s) with model {}",
        listing.len(),
        index.embedding_model()
    );
    if listing.is_empty() {
        warn!("No template blobs found; upload resume templates first");
    }

    let mut report = IngestReport {
        total: listing.len(),
        ..Default::default()
    };

    for item in listing {
        debug!(
            "Fetching template {} ({} bytes)",
            item.id,
            item.size.map_or_else(|| "?".to_string(), |s| s.to_string())
        );
        let outcome = match blobs.fetch(&item.id).await {
            Ok(blob) => ingest_blob(index, blob).await,
            Err(BlobError::NotFound(id)) => Err(IngestError::NotFound(id)),
            Err(e) => Err(IngestError::Blob(e.to_string())),
        };

        match outcome {
            Ok(id) => {
                info!("Indexed template {id}");
                report.indexed.push(id);
            }
            Err(e) => {
                match &e {
                    IngestError::NoExtractableContent(_) | IngestError::NotFound(_) => {
                        warn!("Skipping template {}: {e}", item.id)
                    }
                    _ => error!("Failed to index template {}: {e}", item.id),
                }
                report.failures.push(IngestFailure {
                    id: item.id,
                    kind: e.kind(),
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        "Finished indexing: {} of {} template(s) indexed, {} failed",
        report.indexed.len(),
        report.total,
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::retrieval::ranker::{SearchParams, TemplateRanker};
    use crate::store::{DistanceMetric, InMemoryStore, TemplateStore};
    use crate::testing::{FailingEmbedder, KeywordEmbedder, MemoryBlobStore};

    fn index_over(store: Arc<InMemoryStore>) -> TemplateIndex {
        TemplateIndex::new(Arc::new(KeywordEmbedder), store, Duration::from_secs(5))
    }

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[tokio::test]
    async fn test_short_content_rejected_and_store_unchanged() {
        let store = Arc::new(InMemoryStore::new(DistanceMetric::Cosine));
        let index = index_over(store.clone());

        let err = ingest(&index, "t1", "hello", &Metadata::new()).await.unwrap_err();
        assert!(matches!(err, IngestError::NoExtractableContent(_)));

        let err = ingest(&index, "t1", "   short    \n", &Metadata::new()).await.unwrap_err();
        assert!(matches!(err, IngestError::NoExtractableContent(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_prepare_rejects_short_text_before_indexing() {
        let blobs = MemoryBlobStore::default();
        blobs.insert("tiny.txt", b"  hi  ", "text/plain", &[]).await;
        let blob = blobs.fetch("tiny.txt").await.unwrap();

        let err = prepare_blob(blob).await.unwrap_err();
        assert_eq!(err.kind(), "no_extractable_content");
    }

    #[tokio::test]
    async fn test_prepare_carries_text_and_metadata() {
        let blobs = MemoryBlobStore::default();
        blobs
            .insert(
                "pm.md",
                b"  Product manager template: roadmaps, discovery  ",
                "text/markdown",
                &[("title", "Product Manager")],
            )
            .await;
        let prepared = prepare_blob(blobs.fetch("pm.md").await.unwrap()).await.unwrap();

        assert_eq!(prepared.id, "pm.md");
        assert_eq!(prepared.text, "Product manager template: roadmaps, discovery");
        assert_eq!(prepared.metadata["title"], "Product Manager");
        assert_eq!(prepared.metadata["file_id"], "pm.md");
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let index = index_over(Arc::new(InMemoryStore::new(DistanceMetric::Cosine)));
        let err = ingest(&index, " ", "a perfectly long template body", &Metadata::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let store = Arc::new(InMemoryStore::new(DistanceMetric::Cosine));
        let index = index_over(store.clone());
        let ranker = TemplateRanker::new(
            index.clone(),
            SearchParams {
                top_k: 3,
                score_threshold: 0.0,
            },
        );
        let metadata = meta(&[("title", "Backend Engineer"), ("file_id", "f-1")]);
        let content = "Backend engineer resume template with Rust and Postgres";

        ingest(&index, "t1", content, &metadata).await.unwrap();
        let first = ranker.search_default("rust backend").await;
        ingest(&index, "t1", content, &metadata).await.unwrap();
        let second = ranker.search_default("rust backend").await;

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(first, second);
        assert_eq!(first[0].title, "Backend Engineer");
    }

    #[tokio::test]
    async fn test_provider_failure_reported_for_single_ingest() {
        let index = TemplateIndex::new(
            Arc::new(FailingEmbedder),
            Arc::new(InMemoryStore::new(DistanceMetric::Cosine)),
            Duration::from_secs(5),
        );
        let err = ingest(&index, "t1", "a perfectly long template body", &Metadata::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "provider");
    }

    #[tokio::test]
    async fn test_batch_continues_past_bad_items() {
        let blobs = MemoryBlobStore::with_phantom(&["vanished.pdf"]);
        blobs
            .insert(
                "swe.txt",
                b"Software engineer template: Rust, Kubernetes, distributed systems",
                "text/plain",
                &[("title", "Software Engineer"), ("category", "engineering")],
            )
            .await;
        blobs.insert("empty.txt", b"", "text/plain", &[]).await;
        blobs.insert("tiny.txt", b"  hi  ", "text/plain", &[]).await;
        blobs.insert("logo.png", b"\x89PNG....", "image/png", &[]).await;
        blobs
            .insert(
                "design.md",
                b"Graphic design portfolio template with Figma case studies",
                "text/markdown",
                &[],
            )
            .await;

        let store = Arc::new(InMemoryStore::new(DistanceMetric::Cosine));
        let report = ingest_all(&blobs, &index_over(store.clone())).await.unwrap();

        assert_eq!(report.total, 6);
        assert_eq!(report.indexed, vec!["swe.txt", "design.md"]);
        let kinds: Vec<(&str, &str)> = report
            .failures
            .iter()
            .map(|f| (f.id.as_str(), f.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("empty.txt", "no_extractable_content"),
                ("tiny.txt", "no_extractable_content"),
                ("logo.png", "extraction"),
                ("vanished.pdf", "not_found"),
            ]
        );
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_batch_metadata_flows_to_search_results() {
        let blobs = MemoryBlobStore::default();
        blobs
            .insert(
                "swe.txt",
                b"Software engineer template: Rust, Kubernetes, distributed systems",
                "text/plain",
                &[("title", "Software Engineer"), ("category", "engineering")],
            )
            .await;
        let store = Arc::new(InMemoryStore::new(DistanceMetric::Cosine));
        let index = index_over(store);
        ingest_all(&blobs, &index).await.unwrap();

        let ranker = TemplateRanker::new(
            index,
            SearchParams {
                top_k: 3,
                score_threshold: 0.0,
            },
        );
        let matches = ranker.search_default("rust engineer").await;
        let m = &matches[0];
        assert_eq!(m.title, "Software Engineer");
        assert_eq!(m.filename.as_deref(), Some("swe.txt"));
        assert_eq!(m.template_file_id.as_deref(), Some("swe.txt"));
        assert_eq!(m.metadata["category"], "engineering");
        assert_eq!(m.metadata["file_type"], "text");
    }

    #[tokio::test]
    async fn test_empty_source_yields_empty_report() {
        let store = Arc::new(InMemoryStore::new(DistanceMetric::Cosine));
        let report = ingest_all(&MemoryBlobStore::default(), &index_over(store))
            .await
            .unwrap();
        assert_eq!(report.total, 0);
        assert!(report.indexed.is_empty() && report.failures.is_empty());
    }
}
