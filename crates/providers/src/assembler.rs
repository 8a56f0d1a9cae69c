//! Stream assembler — rebuilds one assistant message from a chunked,
//! newline-delimited-JSON byte stream.
//!
//! Each complete line is one self-contained JSON object optionally carrying
//! a `message.content` fragment. A line that fails to parse is a soft
//! error: it is counted and skipped, and must never abort the stream or its
//! sibling lines — one malformed fragment never costs the turn. The
//! assembler is sans-IO; callers feed it byte chunks as they arrive and
//! republish the partial view after every append.

use hearth_core::message::{ChatMessage, StreamingMessage};
use serde::Deserialize;
use tracing::trace;

/// One NDJSON line from the backend.
#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    message: Option<LineMessage>,
    /// Terminal marker on the backend's final line.
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct LineMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Incrementally assembles the turn's single in-flight assistant message.
#[derive(Debug)]
pub struct StreamAssembler {
    message: StreamingMessage,
    /// Carry-over for a line split across chunk boundaries.
    pending: String,
    malformed_lines: usize,
    done_seen: bool,
}

impl StreamAssembler {
    /// Open an assembler for a new turn.
    pub fn new() -> Self {
        Self {
            message: StreamingMessage::open(),
            pending: String::new(),
            malformed_lines: 0,
            done_seen: false,
        }
    }

    /// The in-flight message ID.
    pub fn id(&self) -> &str {
        &self.message.id
    }

    /// The accumulated content so far.
    pub fn content(&self) -> &str {
        &self.message.content
    }

    /// Number of lines skipped as unparseable.
    pub fn malformed_lines(&self) -> usize {
        self.malformed_lines
    }

    /// Whether the backend's terminal marker has been seen.
    pub fn is_done(&self) -> bool {
        self.done_seen
    }

    /// Feed one byte chunk; returns the content fragments it contributed,
    /// in order, so the caller can republish the partial view after each.
    pub fn push_chunk(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.push_str(&String::from_utf8_lossy(bytes));

        let mut fragments = Vec::new();
        while let Some(line_end) = self.pending.find('\n') {
            let line = self.pending[..line_end].trim_end_matches('\r').to_string();
            self.pending.drain(..=line_end);
            if let Some(fragment) = self.apply_line(&line) {
                fragments.push(fragment);
            }
        }
        fragments
    }

    /// End-of-stream: flush an unterminated final line, then finalize the
    /// message exactly once. Consuming `self` makes a second finalization
    /// unrepresentable. An empty stream finalizes to empty content — valid,
    /// not an error.
    pub fn finish(mut self) -> ChatMessage {
        let tail = std::mem::take(&mut self.pending);
        let tail = tail.trim_end_matches('\r');
        if !tail.is_empty() {
            self.apply_line(tail);
        }
        self.message.finalize()
    }

    fn apply_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_str::<StreamLine>(line) {
            Ok(parsed) => {
                if parsed.done {
                    self.done_seen = true;
                }
                let fragment = parsed
                    .message
                    .and_then(|m| m.content)
                    .filter(|c| !c.is_empty())?;
                self.message.append(&fragment);
                Some(fragment)
            }
            Err(e) => {
                self.malformed_lines += 1;
                trace!(error = %e, line_len = line.len(), "Ignoring unparseable stream line");
                None
            }
        }
    }
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}
