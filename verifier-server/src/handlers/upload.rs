//! Chart upload handler

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};

use helm_verifier_core::{UploadedArchive, VerificationReport};

use crate::{AppError, AppResult, AppState};

const FILE_FIELD: &str = "file";

/// Verify an uploaded Helm chart
pub async fn upload_helm(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<VerificationReport>> {
    let mut multipart = multipart?;

    // First field named "file" wins; everything else is ignored
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some(UploadedArchive::new(filename, bytes.to_vec()));
        break;
    }

    let upload = upload.ok_or_else(|| AppError::ValidationError("No file provided".to_string()))?;
    if upload.filename.is_empty() {
        return Err(AppError::ValidationError("No file selected".to_string()));
    }

    tracing::info!("Received chart '{}' ({} bytes)", upload.filename, upload.bytes.len());

    // Extraction and inference block; keep them off the async workers
    let verifier = state.verifier.clone();
    let report = tokio::task::spawn_blocking(move || verifier.verify(upload))
        .await
        .map_err(|e| AppError::InternalError(format!("Verification task failed: {}", e)))??;

    Ok(Json(report))
}
