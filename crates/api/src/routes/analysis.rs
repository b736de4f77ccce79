//! Route definitions for analysis jobs.
//!
//! Mounted at `/analyze`.
//!
//! ```text
//! POST /          analyze        (multipart in, NDJSON event stream out)
//! POST /sync      analyze_sync   (multipart in, single JSON payload out)
//! ```

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::analysis;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(analysis::analyze))
        .route("/sync", post(analysis::analyze_sync))
        .layer(DefaultBodyLimit::max(super::MAX_UPLOAD_BYTES))
}
