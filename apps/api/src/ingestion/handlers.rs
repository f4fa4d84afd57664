//! Axum route handlers for template upload and re-indexing.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::blob::{Blob, BlobInfo};
use crate::errors::AppError;
use crate::ingestion::extract::DocumentKind;
use crate::ingestion::pipeline::{ingest, ingest_all, prepare_blob, IngestReport};
use crate::routes::multipart::{collect_parts, require_part};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TemplateUploadResponse {
    pub template_id: String,
    pub download_url: String,
}

/// POST /api/v1/templates
///
/// Multipart field `file` (PDF or text), optional `title` and `category`.
/// The file is stored in the template library and indexed immediately.
pub async fn handle_upload_template(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<TemplateUploadResponse>), AppError> {
    let mut parts = collect_parts(multipart).await?;
    let file = require_part(&mut parts, "file")?;

    let filename = file
        .file_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Uploaded file has no filename".to_string()))?;
    let kind = DocumentKind::detect(file.content_type.as_deref(), &filename, &file.bytes)
        .ok_or_else(|| {
            AppError::Validation("Only PDF or plain-text templates are supported.".to_string())
        })?;
    let content_type = match kind {
        DocumentKind::Pdf => "application/pdf".to_string(),
        DocumentKind::PlainText => file
            .content_type
            .clone()
            .unwrap_or_else(|| "text/plain".to_string()),
    };

    let mut metadata = HashMap::from([("filename".to_string(), filename.clone())]);
    for field in ["title", "category"] {
        if let Some(value) = parts.get(field).map(|p| p.text()).filter(|v| !v.is_empty()) {
            metadata.insert(field.to_string(), value);
        }
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_else(|| kind.label().to_string());
    let id = format!("{}.{extension}", Uuid::new_v4());

    // Unusable files are refused before anything reaches the library.
    let prepared = prepare_blob(Blob {
        info: BlobInfo {
            id: id.clone(),
            size: Some(file.bytes.len() as u64),
            last_modified: Some(Utc::now()),
        },
        content_type: Some(content_type.clone()),
        metadata: metadata.clone(),
        bytes: file.bytes.clone(),
    })
    .await?;

    state
        .template_blobs
        .put(&id, file.bytes, &content_type, &metadata)
        .await?;

    // The blob stays in the library if embedding or the store fails; reindex picks it up.
    ingest(&state.index, &prepared.id, &prepared.text, &prepared.metadata).await?;
    let template_id = prepared.id;

    Ok((
        StatusCode::CREATED,
        Json(TemplateUploadResponse {
            download_url: crate::retrieval::models::template_download_url(&template_id),
            template_id,
        }),
    ))
}

/// POST /api/v1/templates/reindex
///
/// Re-ingests every template in the library. Per-item failures are reported
/// in the body; the request itself only fails if the library cannot be listed.
pub async fn handle_reindex(State(state): State<AppState>) -> Result<Json<IngestReport>, AppError> {
    let report = ingest_all(state.template_blobs.as_ref(), &state.index).await?;
    Ok(Json(report))
}
