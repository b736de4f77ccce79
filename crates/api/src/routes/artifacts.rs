//! Route definitions for artifact downloads.
//!
//! Mounted at `/artifacts`. Each route serves one well-known report-engine
//! output from the scratch directory.
//!
//! ```text
//! GET /report         formatted report workbook
//! GET /parsed-data    parsed-data workbook
//! GET /pdf            PDF rendering (when the engine produced one)
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::artifacts;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/report", get(artifacts::report))
        .route("/parsed-data", get(artifacts::parsed_data))
        .route("/pdf", get(artifacts::pdf))
}
