//! Handlers for the `/analyze` resource.
//!
//! Both endpoints accept the same multipart form: one or more `files`
//! parts, an optional `fileMetadata` JSON array (positionally matched to
//! the files), and a required `config` JSON part with the statistical
//! settings. They differ only in delivery: `/analyze` streams NDJSON
//! events, `/analyze/sync` answers once with the terminal payload.

use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::Response;
use axum::Json;
use tokio::sync::mpsc;
use varia_core::analysis::{AnalysisConfig, FileMetadata};
use varia_core::error::CoreError;
use varia_core::events::DonePayload;
use varia_engine::job::UploadedFile;

use crate::error::{AppError, AppResult};
use crate::pipeline::{self, JobInput};
use crate::state::AppState;

/// Event channel depth. Small on purpose: an engine that outruns a slow
/// client blocks on the channel instead of buffering unboundedly.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// POST /api/v1/analyze
///
/// Starts an analysis job and streams its events as NDJSON. The response
/// begins immediately; the job runs on a spawned task and the stream ends
/// with exactly one `done` or `error` line. Malformed requests fail with a
/// JSON 400 before any streaming starts.
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Response> {
    let input = parse_request(multipart).await?;

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(pipeline::run_job(state, input, tx));

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(pipeline::ndjson_stream(rx)))
        .unwrap();
    Ok(response)
}

/// POST /api/v1/analyze/sync
///
/// Runs the same pipeline but answers once: the terminal payload as JSON
/// on success, the usual error envelope on failure. Intermediate progress
/// events are discarded.
pub async fn analyze_sync(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<DonePayload>> {
    let input = parse_request(multipart).await?;

    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    // Keep the channel draining so the pipeline never blocks on progress.
    let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

    let outcome = pipeline::execute(&state, input, &tx).await;
    drop(tx);
    let _ = drain.await;

    Ok(Json(outcome?))
}

/// Extract uploads, metadata, and settings from the multipart form.
async fn parse_request(mut multipart: Multipart) -> Result<JobInput, AppError> {
    let mut files: Vec<UploadedFile> = Vec::new();
    let mut metadata: Vec<FileMetadata> = Vec::new();
    let mut settings: Option<AnalysisConfig> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "files" => {
                let filename = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                files.push(UploadedFile {
                    filename,
                    bytes: data.to_vec(),
                });
            }
            "fileMetadata" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                metadata = serde_json::from_str(&text).map_err(|e| {
                    CoreError::Validation(format!("fileMetadata is not a valid JSON array: {e}"))
                })?;
            }
            "config" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let parsed: AnalysisConfig = serde_json::from_str(&text).map_err(|e| {
                    CoreError::Validation(format!("config is not valid JSON: {e}"))
                })?;
                settings = Some(parsed);
            }
            _ => {} // ignore unknown fields
        }
    }

    if files.is_empty() {
        return Err(CoreError::Validation("at least one file is required".to_string()).into());
    }
    let settings = settings
        .ok_or_else(|| CoreError::Validation("missing required 'config' field".to_string()))?;
    settings.validate()?;

    Ok(JobInput {
        files,
        metadata,
        settings,
    })
}
