//! Handlers for the `/artifacts` resource.
//!
//! Serves whatever the report engine left at the well-known scratch paths.
//! These endpoints back the locator URLs offered in the `done` payload when
//! inlining an artifact was not possible, and they also let clients re-pull
//! a download after the stream has ended.

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::Response;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::debug;
use varia_core::error::CoreError;
use varia_engine::job::{PARSED_DATA_FILE, PDF_FILE, REPORT_FILE};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const PDF_CONTENT_TYPE: &str = "application/pdf";

/// GET /api/v1/artifacts/report
pub async fn report(State(state): State<AppState>) -> AppResult<Response> {
    serve_artifact(
        &state,
        REPORT_FILE,
        XLSX_CONTENT_TYPE,
        "ab_test_report.xlsx",
        "report file",
    )
    .await
}

/// GET /api/v1/artifacts/parsed-data
pub async fn parsed_data(State(state): State<AppState>) -> AppResult<Response> {
    serve_artifact(
        &state,
        PARSED_DATA_FILE,
        XLSX_CONTENT_TYPE,
        "parsed_data.xlsx",
        "parsed data file",
    )
    .await
}

/// GET /api/v1/artifacts/pdf
pub async fn pdf(State(state): State<AppState>) -> AppResult<Response> {
    serve_artifact(
        &state,
        PDF_FILE,
        PDF_CONTENT_TYPE,
        "ab_test_report.pdf",
        "PDF report",
    )
    .await
}

/// Stream one artifact from the scratch directory as a download.
async fn serve_artifact(
    state: &AppState,
    file_name: &str,
    content_type: &'static str,
    attachment_name: &str,
    entity: &'static str,
) -> AppResult<Response> {
    let path = state.config.scratch_dir.join(file_name);
    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "artifact not present");
            return Err(CoreError::NotFound(entity).into());
        }
    };
    let size = file
        .metadata()
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .len();

    let stream = ReaderStream::new(file);
    Ok(Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{attachment_name}\""),
        )
        .body(Body::from_stream(stream))
        .unwrap())
}
