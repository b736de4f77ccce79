//! Job orchestration: staging, engine supervision, artifact resolution,
//! and NDJSON delivery.

pub mod resolve;
pub mod runner;
pub mod stream;

pub use resolve::resolve_artifacts;
pub use runner::{execute, run_job, JobInput};
pub use stream::ndjson_stream;
