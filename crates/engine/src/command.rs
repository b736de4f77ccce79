//! Engine command construction.
//!
//! Engines are Python scripts invoked as `<interpreter> <script> <args...>`
//! with an explicit argument vector and environment, never through a shell.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default wall-clock budget for one engine run.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(600);

/// Relative venv interpreter path probed when no override is configured.
const VENV_PYTHON: &str = "venv/bin/python";

/// A fully resolved engine invocation.
#[derive(Debug, Clone)]
pub struct EngineCommand {
    /// Short engine name used in logs and error messages
    /// ("metrics", "report", "country detection").
    pub engine: &'static str,
    /// Interpreter (or any executable) to run.
    pub program: PathBuf,
    /// Argument vector, script path first.
    pub args: Vec<String>,
    /// Extra environment variables for the child.
    pub envs: Vec<(String, String)>,
    /// Wall-clock budget; expiry kills the child.
    pub timeout: Duration,
}

impl EngineCommand {
    pub fn new(engine: &'static str, program: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            timeout: DEFAULT_ENGINE_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Pick the interpreter for engine scripts.
///
/// An explicit override wins (tests point this at `sh`); otherwise a local
/// `venv/bin/python` is preferred when present, falling back to `python3`
/// on PATH.
pub fn resolve_interpreter(overridden: Option<&str>) -> PathBuf {
    if let Some(program) = overridden {
        return PathBuf::from(program);
    }
    let venv = Path::new(VENV_PYTHON);
    if venv.exists() {
        venv.to_path_buf()
    } else {
        PathBuf::from("python3")
    }
}
