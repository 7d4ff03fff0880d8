//! API request handlers

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use tracing::info;

use crate::error::PipelineError;
use crate::pipeline::{validate_parts, MediaUpload};
use crate::progress::ProgressSnapshot;
use crate::transcription::Language;
use super::server::AppState;

/// Handle clip generation requests: multipart fields `audio`, `video`,
/// `parts`, `language`
pub async fn generate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, PipelineError> {
    let mut audio: Option<MediaUpload> = None;
    let mut video: Option<MediaUpload> = None;
    let mut parts_raw: Option<String> = None;
    let mut language_raw: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        PipelineError::Validation(format!("malformed multipart body: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "audio" => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    PipelineError::Validation(format!("failed to read audio upload: {}", e))
                })?;
                audio = Some(MediaUpload::new(filename, bytes.to_vec()));
            }
            "video" => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    PipelineError::Validation(format!("failed to read video upload: {}", e))
                })?;
                video = Some(MediaUpload::new(filename, bytes.to_vec()));
            }
            "parts" => {
                parts_raw = Some(field.text().await.map_err(|e| {
                    PipelineError::Validation(format!("failed to read parts field: {}", e))
                })?);
            }
            "language" => {
                language_raw = Some(field.text().await.map_err(|e| {
                    PipelineError::Validation(format!("failed to read language field: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let parts_raw = parts_raw
        .ok_or_else(|| PipelineError::Validation("missing form field: parts".to_string()))?;
    let parts_value: i64 = parts_raw.trim().parse().map_err(|_| {
        PipelineError::Validation("parts must be an integer".to_string())
    })?;
    let parts = validate_parts(parts_value)?;

    let language = Language::parse(language_raw.as_deref().unwrap_or("fr"));

    let audio = audio
        .ok_or_else(|| PipelineError::Validation("missing file field: audio".to_string()))?;
    let video = video
        .ok_or_else(|| PipelineError::Validation("missing file field: video".to_string()))?;

    info!(
        "Received /generate request: parts={}, language={}, audio={:?}, video={:?}",
        parts, language.as_str(), audio.filename, video.filename
    );

    let archive = state.pipeline.run(audio, video, parts, language).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/zip"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"videos.zip\"",
        ),
    ];

    info!("Sending zip response ({} bytes)", archive.len());
    Ok((headers, archive).into_response())
}

/// Report segment progress for the most recently started request
pub async fn progress(State(state): State<AppState>) -> Json<ProgressSnapshot> {
    Json(state.progress.snapshot())
}

/// Health check
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "subclip",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
