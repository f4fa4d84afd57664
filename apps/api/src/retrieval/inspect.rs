//! Read-only view of the template collection: how many templates are indexed
//! and what a few of them look like.

use serde::Serialize;

use crate::models::template::{Metadata, Template};
use crate::retrieval::models::template_download_url;
use crate::retrieval::preview::truncate_preview;
use crate::store::{StoreError, TemplateIndex};

pub const DEFAULT_SAMPLE_SIZE: usize = 5;
pub const MAX_SAMPLE_SIZE: usize = 50;

/// Shorter than a match preview; this is a listing.
const SAMPLE_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateSummary {
    pub id: String,
    pub title: String,
    pub filename: String,
    pub preview: String,
    pub download_url: String,
    pub metadata: Metadata,
}

impl From<Template> for TemplateSummary {
    fn from(template: Template) -> Self {
        Self {
            download_url: template_download_url(template.file_id()),
            preview: truncate_preview(&template.content, SAMPLE_PREVIEW_CHARS),
            id: template.id,
            title: template.title,
            filename: template.filename,
            metadata: template.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionListing {
    pub collection: String,
    pub embedding_model: String,
    pub count: usize,
    pub sample: Vec<TemplateSummary>,
}

/// Counts the collection and samples up to `sample_size` templates (capped at
/// `MAX_SAMPLE_SIZE`), oldest first.
pub async fn inspect_collection(
    index: &TemplateIndex,
    collection: &str,
    sample_size: usize,
) -> Result<CollectionListing, StoreError> {
    let count = index.count().await?;
    let sample = index
        .peek(sample_size.min(MAX_SAMPLE_SIZE))
        .await?
        .into_iter()
        .map(TemplateSummary::from)
        .collect();

    Ok(CollectionListing {
        collection: collection.to_string(),
        embedding_model: index.embedding_model().to_string(),
        count,
        sample,
    })
}
