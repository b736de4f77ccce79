pub mod analysis;
pub mod artifacts;
pub mod detection;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Upload cap for multipart endpoints. Spreadsheet exports regularly exceed
/// axum's 2 MB default body limit.
pub(crate) const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /analyze                  start job, stream NDJSON events (POST, multipart)
/// /analyze/sync             run job, answer once with JSON (POST, multipart)
///
/// /artifacts/report         download report workbook (GET)
/// /artifacts/parsed-data    download parsed-data workbook (GET)
/// /artifacts/pdf            download PDF report (GET)
///
/// /detect-country           detect spreadsheet country (POST, multipart)
/// /parse-date-range         parse free text into a date range (POST, JSON)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Analysis jobs (streaming and synchronous variants).
        .nest("/analyze", analysis::router())
        // Report-engine outputs at well-known scratch paths.
        .nest("/artifacts", artifacts::router())
        // Detection helpers live directly under the version prefix.
        .merge(detection::router())
}
