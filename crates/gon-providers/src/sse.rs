//! Server-Sent-Events decoder for streaming chat completions.
//!
//! Bytes arrive in arbitrary chunks; lines may be split anywhere, including
//! inside a multi-byte UTF-8 sequence. The decoder buffers raw bytes and only
//! interprets complete `\n`-terminated lines.

use gon_core::types::ChatCompletionChunk;
use tracing::trace;

const DONE_MARKER: &str = "[DONE]";

/// One decoded event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SseEvent {
    /// A non-empty `choices[0].delta.content` fragment.
    Delta(String),
    /// An in-band `error` object; the stream carries no more content.
    Error(String),
    /// `data: [DONE]`.
    Done,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `[DONE]` has been seen. Later input is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a chunk of the response body and collect the events it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                let finished = event == SseEvent::Done;
                events.push(event);
                if finished {
                    self.done = true;
                    self.buffer.clear();
                    break;
                }
            }
        }
        events
    }

    /// Flush a final unterminated line, if any.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        if self.done || self.buffer.is_empty() {
            return Vec::new();
        }
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&rest))
            .map(|event| {
                if event == SseEvent::Done {
                    self.done = true;
                }
                vec![event]
            })
            .unwrap_or_default()
    }
}

/// Interpret one line. Comments, blank lines, non-`data:` fields, invalid
/// JSON and empty deltas yield `None`.
fn parse_line(line: &str) -> Option<SseEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    let data = line.strip_prefix("data:")?.trim_start();

    if data == DONE_MARKER {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) if chunk.error.is_some() => {
            let message = chunk
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "unknown stream error".to_string());
            Some(SseEvent::Error(message))
        }
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|c| !c.is_empty())
            .map(SseEvent::Delta),
        Err(e) => {
            trace!(error = %e, "Skipping unparsable SSE line");
            None
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
