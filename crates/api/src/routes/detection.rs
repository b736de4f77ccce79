//! Route definitions for the detection helpers.
//!
//! Merged directly under `/api/v1` (no shared prefix).
//!
//! ```text
//! POST /detect-country      detect_country    (multipart spreadsheet)
//! POST /parse-date-range    parse_date_range  (JSON free text)
//! ```

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::detection;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/detect-country", post(detection::detect_country))
        .route("/parse-date-range", post(detection::parse_date_range))
        .layer(DefaultBodyLimit::max(super::MAX_UPLOAD_BYTES))
}
