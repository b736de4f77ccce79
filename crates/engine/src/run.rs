//! Supervised engine execution.
//!
//! Two modes. [`run_streaming`] is used by the analysis pipeline: stdout is
//! consumed chunk-by-chunk, reassembled into lines, and every progress
//! marker is forwarded to the job's event channel while the engine runs.
//! [`run_captured`] runs a program to completion and returns its trimmed
//! stdout (country detection). Both spawn without a shell, bound the run
//! with a wall-clock timeout, and treat any non-zero exit as fatal to the
//! job. A failed send on the event channel means the client disconnected:
//! the child is killed rather than left to run unobserved.

use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use varia_core::events::JobEvent;
use varia_core::progress::{parse_marker, LineBuffer};

use crate::command::EngineCommand;
use crate::error::EngineError;

/// Stderr substring treated as noise rather than a real diagnostic.
pub const BENIGN_STDERR_MARKER: &str = "DeprecationWarning";

/// Maximum bytes captured per stream in captured mode (10 MiB).
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Non-benign stderr lines retained for error reporting.
const STDERR_TAIL_LINES: usize = 32;

/// Run an engine, forwarding marker-derived progress events to `events`.
///
/// Resolves to `Ok(())` only on exit code 0. The child is killed on timeout
/// and when the event receiver has been dropped; `kill_on_drop` backstops
/// every other early exit.
pub async fn run_streaming(
    cmd: &EngineCommand,
    events: &mpsc::Sender<JobEvent>,
) -> Result<(), EngineError> {
    let engine = cmd.engine;
    let mut child = spawn(cmd)?;
    let stderr_task = tokio::spawn(drain_stderr(engine, child.stderr.take()));

    let start = Instant::now();
    let status = match tokio::time::timeout(cmd.timeout, supervise(&mut child, engine, events)).await
    {
        Ok(result) => result?,
        Err(_elapsed) => {
            let _ = child.kill().await;
            return Err(EngineError::Timeout {
                engine,
                elapsed_secs: start.elapsed().as_secs(),
            });
        }
    };

    let stderr_tail = stderr_task.await.unwrap_or_default();
    if !status.success() {
        return Err(EngineError::Failed {
            engine,
            code: status.code(),
            stderr: stderr_tail,
        });
    }
    debug!(
        engine,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "engine finished"
    );
    Ok(())
}

/// Run an engine to completion and return its trimmed stdout.
pub async fn run_captured(cmd: &EngineCommand) -> Result<String, EngineError> {
    let engine = cmd.engine;
    let mut child = spawn(cmd)?;

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(drain_stderr(engine, child.stderr.take()));

    let start = Instant::now();
    match tokio::time::timeout(cmd.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let stdout_bytes = stdout_task.await.unwrap_or_default();
            let stderr_tail = stderr_task.await.unwrap_or_default();
            if !status.success() {
                return Err(EngineError::Failed {
                    engine,
                    code: status.code(),
                    stderr: stderr_tail,
                });
            }
            Ok(String::from_utf8_lossy(&stdout_bytes).trim().to_string())
        }
        Ok(Err(err)) => Err(EngineError::Io(err)),
        Err(_elapsed) => {
            let _ = child.kill().await;
            Err(EngineError::Timeout {
                engine,
                elapsed_secs: start.elapsed().as_secs(),
            })
        }
    }
}

fn spawn(cmd: &EngineCommand) -> Result<Child, EngineError> {
    let mut command = Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &cmd.envs {
        command.env(key, value);
    }
    debug!(engine = cmd.engine, program = %cmd.program.display(), "spawning engine");
    command.spawn().map_err(|source| EngineError::Spawn {
        engine: cmd.engine,
        source,
    })
}

/// Read stdout to EOF, forwarding marker lines, then reap the exit status.
async fn supervise(
    child: &mut Child,
    engine: &'static str,
    events: &mpsc::Sender<JobEvent>,
) -> Result<std::process::ExitStatus, EngineError> {
    if let Some(mut stdout) = child.stdout.take() {
        let mut chunk = [0u8; 4096];
        let mut lines = LineBuffer::default();
        loop {
            let n = stdout.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            for line in lines.push(&chunk[..n]) {
                forward_line(child, engine, events, &line).await?;
            }
        }
        // EOF completes a trailing unterminated line.
        if let Some(line) = lines.finish() {
            forward_line(child, engine, events, &line).await?;
        }
    }
    Ok(child.wait().await?)
}

async fn forward_line(
    child: &mut Child,
    engine: &'static str,
    events: &mpsc::Sender<JobEvent>,
    line: &str,
) -> Result<(), EngineError> {
    debug!(engine, line, "engine stdout");
    if let Some(update) = parse_marker(line) {
        if events.send(update.into()).await.is_err() {
            warn!(engine, "event receiver gone; killing engine");
            let _ = child.kill().await;
            return Err(EngineError::Aborted { engine });
        }
    }
    Ok(())
}

/// Log stderr lines as they arrive, keeping a bounded tail of the
/// non-benign ones for the error message on failure.
async fn drain_stderr<R: AsyncRead + Unpin>(engine: &'static str, handle: Option<R>) -> String {
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
    if let Some(stderr) = handle {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.contains(BENIGN_STDERR_MARKER) {
                debug!(engine, line, "engine stderr (benign)");
                continue;
            }
            warn!(engine, line, "engine stderr");
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    }
    Vec::from(tail).join("\n")
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;

    /// Engines in tests are shell one-liners; the supervisor still runs
    /// them through the same no-shell argv path (`sh -c <script>`).
    fn sh(engine: &'static str, script: &str) -> EngineCommand {
        EngineCommand::new(engine, "sh").arg("-c").arg(script)
    }

    async fn collect(rx: &mut mpsc::Receiver<JobEvent>) -> Vec<serde_json::Value> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(serde_json::to_value(&event).unwrap());
        }
        events
    }

    #[tokio::test]
    async fn test_run_streaming_forwards_markers() {
        let (tx, mut rx) = mpsc::channel(8);
        run_streaming(
            &sh(
                "metrics",
                "echo 'PROGRESS(10|loading)'; echo 'plain noise'; echo 'PROGRESS(90)'",
            ),
            &tx,
        )
        .await
        .unwrap();
        drop(tx);

        let events = collect(&mut rx).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["type"], "progress");
        assert_eq!(events[0]["percent"], 10);
        assert_eq!(events[0]["message"], "loading");
        assert_eq!(events[1]["percent"], 90);
        assert!(events[1].get("message").is_none());
    }

    #[tokio::test]
    async fn test_run_streaming_marker_split_across_writes() {
        let (tx, mut rx) = mpsc::channel(8);
        run_streaming(
            &sh("metrics", "printf 'PROGRESS(4'; sleep 0.1; echo '2|Halfway)'"),
            &tx,
        )
        .await
        .unwrap();
        drop(tx);

        let events = collect(&mut rx).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["percent"], 42);
        assert_eq!(events[0]["message"], "Halfway");
    }

    #[tokio::test]
    async fn test_run_streaming_trailing_line_without_newline() {
        let (tx, mut rx) = mpsc::channel(8);
        run_streaming(&sh("metrics", "printf 'PROGRESS(77|almost)'"), &tx)
            .await
            .unwrap();
        drop(tx);

        let events = collect(&mut rx).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["percent"], 77);
    }

    #[tokio::test]
    async fn test_run_streaming_nonzero_exit() {
        let (tx, _rx) = mpsc::channel(8);
        let err = run_streaming(&sh("report", "echo 'boom' >&2; exit 3"), &tx)
            .await
            .unwrap_err();
        assert_matches!(
            err,
            EngineError::Failed {
                engine: "report",
                code: Some(3),
                ..
            }
        );
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_run_streaming_benign_stderr_excluded_from_tail() {
        let (tx, _rx) = mpsc::channel(8);
        let err = run_streaming(
            &sh(
                "metrics",
                "echo 'lib DeprecationWarning: old api' >&2; echo 'real failure' >&2; exit 1",
            ),
            &tx,
        )
        .await
        .unwrap_err();

        let text = err.to_string();
        assert!(text.contains("real failure"));
        assert!(!text.contains("DeprecationWarning"));
    }

    #[tokio::test]
    async fn test_run_streaming_spawn_error() {
        let (tx, _rx) = mpsc::channel(8);
        let err = run_streaming(
            &EngineCommand::new("metrics", "varia-no-such-binary").arg("x"),
            &tx,
        )
        .await
        .unwrap_err();
        assert_matches!(err, EngineError::Spawn { engine: "metrics", .. });
    }

    #[tokio::test]
    async fn test_run_streaming_timeout_kills_child() {
        let (tx, _rx) = mpsc::channel(8);
        let cmd = sh("metrics", "sleep 30").timeout(Duration::from_millis(200));
        let start = Instant::now();
        let err = run_streaming(&cmd, &tx).await.unwrap_err();
        assert_matches!(err, EngineError::Timeout { engine: "metrics", .. });
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_streaming_aborts_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let start = Instant::now();
        let err = run_streaming(&sh("metrics", "echo 'PROGRESS(10)'; sleep 30"), &tx)
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::Aborted { engine: "metrics" });
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_captured_trims_stdout() {
        let out = run_captured(&sh("country detection", "echo '  FR  '"))
            .await
            .unwrap();
        assert_eq!(out, "FR");
    }

    #[tokio::test]
    async fn test_run_captured_nonzero_exit() {
        let err = run_captured(&sh("country detection", "exit 2"))
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::Failed { code: Some(2), .. });
    }

    #[tokio::test]
    async fn test_drain_stderr_filters_benign_lines() {
        let input = &b"keep me\nfoo DeprecationWarning bar\nalso keep\n"[..];
        let tail = drain_stderr("metrics", Some(input)).await;
        assert_eq!(tail, "keep me\nalso keep");
    }
}
