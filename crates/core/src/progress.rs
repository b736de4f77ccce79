//! Progress-marker lexer for engine stdout.
//!
//! Engines report progress as marker substrings embedded in ordinary output
//! lines: `TAG(percent)` or `TAG(percent|message)`, e.g. `PROGRESS(42|Parsing
//! workbook)`. Parsing is a pure function from one line to an optional
//! update; lines without a marker yield nothing. [`LineBuffer`] handles the
//! plumbing side: reassembling complete lines from arbitrarily split byte
//! chunks so a marker cut across two reads is still seen exactly once.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Regex pattern matching a progress marker anywhere in a line: an
/// identifier tag, a 1-3 digit percent, and an optional `|message` part
/// (message runs to the closing parenthesis).
pub const MARKER_PATTERN: &str = r"([A-Za-z][A-Za-z0-9_]*)\((\d{1,3})(?:\|([^)]*))?\)";

/// Compiled marker regex. Compiled once, reused forever.
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MARKER_PATTERN).expect("valid regex"));

/// One structured progress update decoded from a single engine output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    /// Completion percentage, clamped to 0-100.
    pub percent: u8,
    /// Free-text status message, when the marker carried one.
    pub message: Option<String>,
}

/// Parse one complete line, returning the first progress marker it contains.
///
/// Returns `None` for lines without a well-formed marker. Percent values
/// above 100 are clamped; the message is trimmed and dropped when empty.
pub fn parse_marker(line: &str) -> Option<ProgressUpdate> {
    let caps = MARKER_RE.captures(line)?;

    let percent: u32 = caps[2].parse().ok()?;
    let message = caps
        .get(3)
        .map(|m| m.as_str().trim())
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    Some(ProgressUpdate {
        percent: percent.min(100) as u8,
        message,
    })
}

// ---------------------------------------------------------------------------
// Chunk-to-line reassembly
// ---------------------------------------------------------------------------

/// Reassembles complete lines from raw output chunks.
///
/// Child stdout arrives in arbitrary byte chunks; a partial trailing line is
/// carried forward and only released once its terminating newline arrives.
/// Splitting happens on byte boundaries, so multi-byte characters broken
/// across chunks are reassembled intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Feed one chunk, returning every line completed by it (without the
    /// trailing `\n`/`\r\n`).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                let mut line = std::mem::take(&mut self.pending);
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                lines.push(String::from_utf8_lossy(&line).into_owned());
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Release the unterminated trailing line, if any. Called once at EOF.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}
