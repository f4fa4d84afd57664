use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::template::{Metadata, Template};
use crate::retrieval::preview::{truncate_preview, PREVIEW_CHARS};

/// One ranked search result. Produced per query, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// 1-based position in the returned list.
    pub rank: usize,
    pub similarity_score: f64,
    pub template_id: Option<String>,
    pub title: String,
    pub filename: Option<String>,
    pub template_preview_text: String,
    pub template_file_id: Option<String>,
    pub download_url: Option<String>,
    pub metadata: Metadata,
}

/// Why a search produced a placeholder instead of real templates.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceholderReason {
    /// The collection returned no candidates at all.
    NoCandidates,
    /// The embedding provider or store failed; carries the error text.
    Error(String),
    /// The query had no usable text.
    InvalidInput,
}

impl PlaceholderReason {
    pub fn category(&self) -> &'static str {
        match self {
            PlaceholderReason::NoCandidates => "no_match",
            PlaceholderReason::Error(_) => "error",
            PlaceholderReason::InvalidInput => "invalid_input",
        }
    }
}

pub const NO_MATCH_TITLE: &str = "No strong match";
pub const NO_MATCH_PREVIEW: &str =
    "No strong match found. No resume template could be retrieved for this job description.";

/// Download route for a stored template blob.
pub fn template_download_url(file_id: &str) -> String {
    format!("/download_template_by_id/{file_id}")
}

impl Match {
    pub fn from_template(rank: usize, similarity_score: f64, template: Template) -> Self {
        let file_id = template.file_id().to_string();
        Self {
            rank,
            similarity_score,
            download_url: Some(template_download_url(&file_id)),
            template_file_id: Some(file_id),
            template_preview_text: truncate_preview(&template.content, PREVIEW_CHARS),
            template_id: Some(template.id),
            title: template.title,
            filename: Some(template.filename),
            metadata: template.metadata,
        }
    }

    /// Synthetic rank-1 result with score 0.0 and no download reference.
    pub fn placeholder(reason: &PlaceholderReason) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("category".to_string(), Value::from(reason.category()));
        if let PlaceholderReason::Error(message) = reason {
            metadata.insert("error".to_string(), Value::from(message.as_str()));
        }
        Self {
            rank: 1,
            similarity_score: 0.0,
            template_id: None,
            title: NO_MATCH_TITLE.to_string(),
            filename: None,
            template_preview_text: NO_MATCH_PREVIEW.to_string(),
            template_file_id: None,
            download_url: None,
            metadata,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.template_id.is_none()
    }
}
