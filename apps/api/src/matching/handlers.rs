//! Axum route handlers for the upload flow and file downloads.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::blob::{Blob, BlobStore};
use crate::errors::AppError;
use crate::ingestion::extract::{extract_text, DocumentKind};
use crate::matching::recommend::{analyze_resume, recommend_template};
use crate::retrieval::models::Match;
use crate::routes::multipart::{collect_parts, require_pdf};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub resume_file_id: String,
    pub resume_download_url: String,
    pub analysis: Value,
    pub final_suggestion: String,
    pub template_matches: Vec<Match>,
}

pub fn resume_download_url(file_id: &str) -> String {
    format!("/download_resume/{file_id}")
}

/// POST /upload
///
/// Multipart fields `resume` and `jd`, both PDFs. Stores the resume, analyzes
/// it, matches templates against the job description and returns the LLM's
/// recommendation alongside the ranked matches.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut parts = collect_parts(multipart).await?;
    let resume = require_pdf(&mut parts, "resume")?;
    let jd = require_pdf(&mut parts, "jd")?;

    let resume_text = extract_text("resume", DocumentKind::Pdf, resume.bytes.clone()).await?;
    let jd_text = extract_text("jd", DocumentKind::Pdf, jd.bytes).await?;
    if resume_text.is_empty() || jd_text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No extractable text in the uploaded PDFs".to_string(),
        ));
    }

    let resume_file_id = format!("{}.pdf", Uuid::new_v4());
    let mut metadata = HashMap::from([("source".to_string(), "user_upload".to_string())]);
    if let Some(name) = resume.file_name {
        metadata.insert("filename".to_string(), name);
    }
    state
        .resume_blobs
        .put(&resume_file_id, resume.bytes, "application/pdf", &metadata)
        .await?;

    let (analysis, template_matches) = tokio::join!(
        analyze_resume(&resume_text, &state.llm),
        state.ranker.search_default(&jd_text)
    );
    let analysis = analysis?;

    let final_suggestion =
        recommend_template(&jd_text, &resume_text, &template_matches, &state.llm).await?;

    if template_matches.iter().all(Match::is_placeholder) {
        warn!("Upload {resume_file_id}: no template could be matched");
    }
    info!(
        "Processed upload {resume_file_id}: {} template match(es)",
        template_matches.len()
    );

    Ok(Json(UploadResponse {
        resume_download_url: resume_download_url(&resume_file_id),
        resume_file_id,
        analysis,
        final_suggestion,
        template_matches,
    }))
}

/// GET /download_resume/:id
pub async fn handle_download_resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    download(state.resume_blobs.as_ref(), &id).await
}

/// GET /download_template_by_id/:id
pub async fn handle_download_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    download(state.template_blobs.as_ref(), &id).await
}

async fn download(blobs: &dyn BlobStore, id: &str) -> Result<impl IntoResponse, AppError> {
    let blob = blobs.fetch(id).await?;
    Ok(attachment(blob))
}

fn attachment(blob: Blob) -> impl IntoResponse {
    let content_type = blob
        .content_type
        .clone()
        .unwrap_or_else(|| "application/pdf".to_string());
    // header values must be visible ASCII; quotes would end the parameter
    let filename: String = blob
        .filename()
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && *c != '"')
        .collect();
    (
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        blob.bytes,
    )
}
