//! Artifact resolution for the terminal `done` payload.
//!
//! Every artifact gets exactly one representation: inline base64 when the
//! file is readable, a retrieval locator otherwise. Locators carry a
//! timestamp query so clients never hit a stale cache entry.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio::fs;
use tracing::{debug, warn};

use varia_core::events::DonePayload;
use varia_core::results::ResultDocument;
use varia_engine::JobContext;

/// Read an artifact and encode it inline; `None` when unreadable.
async fn read_encoded(path: &Path, artifact: &str) -> Option<String> {
    match fs::read(path).await {
        Ok(bytes) => {
            debug!(artifact, bytes = bytes.len(), "inlining artifact");
            Some(STANDARD.encode(bytes))
        }
        Err(err) => {
            warn!(
                artifact,
                path = %path.display(),
                error = %err,
                "artifact not readable, offering locator instead"
            );
            None
        }
    }
}

/// Build the terminal payload from the result document and whatever the
/// report engine left on disk.
pub async fn resolve_artifacts(job: &JobContext, results: ResultDocument) -> DonePayload {
    let stamp = chrono::Utc::now().timestamp_millis();

    let excel_base64 = read_encoded(&job.report_path(), "report").await;
    let parsed_data_base64 = read_encoded(&job.parsed_data_path(), "parsed data").await;

    let excel_url = excel_base64
        .is_none()
        .then(|| format!("/api/v1/artifacts/report?t={stamp}"));
    let parsed_data_url = parsed_data_base64
        .is_none()
        .then(|| format!("/api/v1/artifacts/parsed-data?t={stamp}"));

    DonePayload {
        results,
        excel_url,
        parsed_data_url,
        excel_base64,
        parsed_data_base64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inlines_artifacts_when_readable() {
        let dir = tempfile::tempdir().unwrap();
        let job = JobContext::new(dir.path());
        fs::write(job.report_path(), b"report bytes").await.unwrap();
        fs::write(job.parsed_data_path(), b"parsed bytes")
            .await
            .unwrap();

        let payload = resolve_artifacts(&job, ResultDocument::default()).await;

        let decoded = STANDARD.decode(payload.excel_base64.unwrap()).unwrap();
        assert_eq!(decoded, b"report bytes");
        let decoded = STANDARD
            .decode(payload.parsed_data_base64.unwrap())
            .unwrap();
        assert_eq!(decoded, b"parsed bytes");
        assert_eq!(payload.excel_url, None);
        assert_eq!(payload.parsed_data_url, None);
    }

    #[tokio::test]
    async fn test_falls_back_to_locator_per_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let job = JobContext::new(dir.path());
        // Only the parsed-data dump exists.
        fs::write(job.parsed_data_path(), b"parsed bytes")
            .await
            .unwrap();

        let payload = resolve_artifacts(&job, ResultDocument::default()).await;

        assert_eq!(payload.excel_base64, None);
        let url = payload.excel_url.unwrap();
        assert!(url.starts_with("/api/v1/artifacts/report?t="));
        assert!(payload.parsed_data_base64.is_some());
        assert_eq!(payload.parsed_data_url, None);
    }

    #[tokio::test]
    async fn test_locators_for_everything_when_nothing_written() {
        let dir = tempfile::tempdir().unwrap();
        let job = JobContext::new(dir.path());

        let payload = resolve_artifacts(&job, ResultDocument::default()).await;

        assert!(payload.excel_url.is_some());
        assert!(payload
            .parsed_data_url
            .unwrap()
            .starts_with("/api/v1/artifacts/parsed-data?t="));
        assert_eq!(payload.excel_base64, None);
        assert_eq!(payload.parsed_data_base64, None);
    }
}
