use std::path::PathBuf;
use std::time::Duration;

use varia_engine::PollConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`; analysis jobs run
    /// for minutes, not milliseconds).
    pub request_timeout_secs: u64,
    /// Scratch directory holding staged uploads and engine outputs.
    pub scratch_dir: PathBuf,
    /// Explicit interpreter for engine scripts; `None` means auto-resolve
    /// (local venv first, then `python3`).
    pub python_bin: Option<String>,
    /// Metrics engine script path.
    pub metrics_script: PathBuf,
    /// Report engine script path.
    pub report_script: PathBuf,
    /// Country detection script path.
    pub detect_script: PathBuf,
    /// Wall-clock budget per engine run, in seconds.
    pub engine_timeout_secs: u64,
    /// Result poller retry budget.
    pub result_poll_attempts: usize,
    /// Result poller inter-attempt delay, in milliseconds.
    pub result_poll_delay_ms: u64,
    /// Generative-text API key. Forwarded to the metrics engine when AI
    /// insights are requested, and used directly for date-range parsing.
    pub genai_api_key: Option<String>,
    /// Generative-text API base URL.
    pub genai_base_url: String,
    /// Generative-text model name.
    pub genai_model: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                                            |
    /// |------------------------|----------------------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                                          |
    /// | `PORT`                 | `3000`                                             |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`                            |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                                              |
    /// | `SCRATCH_DIR`          | `tmp`                                              |
    /// | `PYTHON_BIN`           | (unset: venv autodetect, then `python3`)           |
    /// | `METRICS_SCRIPT`       | `python/analyze.py`                                |
    /// | `REPORT_SCRIPT`        | `python/report_excel.py`                           |
    /// | `DETECT_SCRIPT`        | `python/detect_country_ai.py`                      |
    /// | `ENGINE_TIMEOUT_SECS`  | `600`                                              |
    /// | `RESULT_POLL_ATTEMPTS` | `10`                                               |
    /// | `RESULT_POLL_DELAY_MS` | `200`                                              |
    /// | `GEMINI_API_KEY`       | (unset)                                            |
    /// | `GENAI_BASE_URL`       | `https://generativelanguage.googleapis.com/v1beta` |
    /// | `GENAI_MODEL`          | `gemini-pro`                                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let scratch_dir =
            PathBuf::from(std::env::var("SCRATCH_DIR").unwrap_or_else(|_| "tmp".into()));

        let python_bin = std::env::var("PYTHON_BIN").ok().filter(|s| !s.is_empty());

        let metrics_script = PathBuf::from(
            std::env::var("METRICS_SCRIPT").unwrap_or_else(|_| "python/analyze.py".into()),
        );
        let report_script = PathBuf::from(
            std::env::var("REPORT_SCRIPT").unwrap_or_else(|_| "python/report_excel.py".into()),
        );
        let detect_script = PathBuf::from(
            std::env::var("DETECT_SCRIPT").unwrap_or_else(|_| "python/detect_country_ai.py".into()),
        );

        let engine_timeout_secs: u64 = std::env::var("ENGINE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("ENGINE_TIMEOUT_SECS must be a valid u64");

        let result_poll_attempts: usize = std::env::var("RESULT_POLL_ATTEMPTS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("RESULT_POLL_ATTEMPTS must be a valid usize");

        let result_poll_delay_ms: u64 = std::env::var("RESULT_POLL_DELAY_MS")
            .unwrap_or_else(|_| "200".into())
            .parse()
            .expect("RESULT_POLL_DELAY_MS must be a valid u64");

        let genai_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|s| !s.is_empty());

        let genai_base_url = std::env::var("GENAI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());

        let genai_model = std::env::var("GENAI_MODEL").unwrap_or_else(|_| "gemini-pro".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            scratch_dir,
            python_bin,
            metrics_script,
            report_script,
            detect_script,
            engine_timeout_secs,
            result_poll_attempts,
            result_poll_delay_ms,
            genai_api_key,
            genai_base_url,
            genai_model,
        }
    }

    /// Per-engine wall-clock budget.
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }

    /// Result poller schedule.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            max_attempts: self.result_poll_attempts,
            delay: Duration::from_millis(self.result_poll_delay_ms),
        }
    }
}
