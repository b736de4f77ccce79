/// Errors from engine execution and result retrieval.
///
/// Every variant is fatal to the job it occurred in; the orchestrator turns
/// it into a single terminal error event after cleanup.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{engine} engine failed to start: {source}")]
    Spawn {
        engine: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{engine} engine failed (exit code {code:?}): {stderr}")]
    Failed {
        engine: &'static str,
        /// `None` when the process was killed by a signal.
        code: Option<i32>,
        /// Retained tail of non-benign stderr lines.
        stderr: String,
    },

    #[error("{engine} engine timed out after {elapsed_secs}s")]
    Timeout {
        engine: &'static str,
        elapsed_secs: u64,
    },

    #[error("{engine} engine aborted: client disconnected")]
    Aborted { engine: &'static str },

    #[error("result file did not become readable within {attempts} attempts: {reason}")]
    ResultUnavailable { attempts: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
