//! Result file polling.
//!
//! The metrics engine writes its result document to a well-known path in
//! the job's scratch directory, sometimes finishing the write shortly after
//! the process itself exits. The poller re-reads that path on a fixed
//! schedule until it sees a parseable document with result rows, the
//! attempt budget runs out, or both.

use std::path::Path;

use tracing::debug;

use varia_core::results::ResultDocument;

use crate::error::EngineError;

/// Retry schedule for [`poll_results`].
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Total read attempts before giving up.
    pub max_attempts: usize,
    /// Pause between consecutive attempts. The first attempt is immediate.
    pub delay: std::time::Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: std::time::Duration::from_millis(200),
        }
    }
}

/// Wait for the result document at `path`.
///
/// A document with at least one result row short-circuits the schedule. A
/// document that parses but stays empty through every attempt is still
/// returned so the caller can attach a warning instead of failing the job.
/// Only a path that never yields parseable JSON is an error.
pub async fn poll_results(path: &Path, config: &PollConfig) -> Result<ResultDocument, EngineError> {
    let mut last_empty: Option<ResultDocument> = None;
    let mut last_reason = String::from("result file was never written");

    for attempt in 1..=config.max_attempts.max(1) {
        if attempt > 1 {
            tokio::time::sleep(config.delay).await;
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(attempt, path = %path.display(), %err, "result file not readable yet");
                last_reason = format!("result file not readable: {err}");
                continue;
            }
        };

        match serde_json::from_slice::<ResultDocument>(&bytes) {
            Ok(doc) if doc.has_rows() => {
                debug!(attempt, "result document ready");
                return Ok(doc);
            }
            Ok(doc) => {
                debug!(attempt, "result document parsed but empty; retrying");
                last_reason = String::from("result document contained no rows");
                last_empty = Some(doc);
            }
            Err(err) => {
                // Engines write in place, so a torn read is expected here.
                debug!(attempt, %err, "result file not parseable yet");
                last_reason = format!("result file not valid JSON: {err}");
            }
        }
    }

    match last_empty {
        Some(doc) => Ok(doc),
        None => Err(EngineError::ResultUnavailable {
            attempts: config.max_attempts.max(1),
            reason: last_reason,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;

    fn fast() -> PollConfig {
        PollConfig {
            max_attempts: 10,
            delay: Duration::from_millis(20),
        }
    }

    const POPULATED: &str = r#"{"primaryResults":[{"country":"UK","kpiName":"conversion_rate"}]}"#;
    const EMPTY: &str = r#"{"primaryResults":[],"secondaryResults":[]}"#;

    #[tokio::test]
    async fn test_poll_returns_populated_document_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        tokio::fs::write(&path, POPULATED).await.unwrap();

        let doc = poll_results(&path, &fast()).await.unwrap();
        assert!(doc.has_rows());
        assert_eq!(doc.primary_results[0].country.as_deref(), Some("UK"));
    }

    #[tokio::test]
    async fn test_poll_waits_for_file_written_late() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        let writer_path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            tokio::fs::write(&writer_path, POPULATED).await.unwrap();
        });

        let doc = poll_results(&path, &fast()).await.unwrap();
        assert!(doc.has_rows());
    }

    #[tokio::test]
    async fn test_poll_keeps_retrying_past_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        tokio::fs::write(&path, EMPTY).await.unwrap();

        let writer_path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            tokio::fs::write(&writer_path, POPULATED).await.unwrap();
        });

        let doc = poll_results(&path, &fast()).await.unwrap();
        assert!(doc.has_rows());
    }

    #[tokio::test]
    async fn test_poll_accepts_persistently_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        tokio::fs::write(&path, EMPTY).await.unwrap();

        let config = PollConfig {
            max_attempts: 3,
            delay: Duration::from_millis(5),
        };
        let doc = poll_results(&path, &config).await.unwrap();
        assert!(!doc.has_rows());
    }

    #[tokio::test]
    async fn test_poll_missing_file_is_result_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        let config = PollConfig {
            max_attempts: 3,
            delay: Duration::from_millis(5),
        };
        let err = poll_results(&path, &config).await.unwrap_err();
        assert_matches!(err, EngineError::ResultUnavailable { attempts: 3, .. });
    }

    #[tokio::test]
    async fn test_poll_unparseable_file_is_result_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let config = PollConfig {
            max_attempts: 2,
            delay: Duration::from_millis(5),
        };
        let err = poll_results(&path, &config).await.unwrap_err();
        assert_matches!(err, EngineError::ResultUnavailable { .. });
        assert!(err.to_string().contains("not valid JSON"));
    }
}
