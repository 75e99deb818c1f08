//! Optimization stream framing.
//!
//! Bytes → text (`decoder`) → `data: ` lines (`splitter`) → events (`event`).
//! [`EventFramer`] chains the three for one stream; the read loop in
//! `session::controller` feeds it chunks and drains events between reads.

pub mod decoder;
pub mod event;
pub mod splitter;

use tracing::warn;

use crate::stream::decoder::ChunkDecoder;
use crate::stream::event::{parse_event_line, StreamEvent};
use crate::stream::splitter::LineSplitter;

/// Upper bound on a single buffered event line unless configured otherwise.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Per-stream framing state: decoder, line buffer and skip counter.
#[derive(Debug)]
pub struct EventFramer {
    decoder: ChunkDecoder,
    splitter: LineSplitter,
    malformed_lines: u64,
}

impl EventFramer {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            decoder: ChunkDecoder::new(),
            splitter: LineSplitter::new(max_line_bytes),
            malformed_lines: 0,
        }
    }

    /// Appends one raw body chunk. Never blocks; only grows the buffer.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.decoder.decode_into(chunk, self.splitter.buffer_mut());
    }

    /// Next well-formed event from the buffered text.
    ///
    /// Malformed lines are logged, counted and skipped; they never end the
    /// stream.
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        while let Some(line) = self.splitter.next_line() {
            match parse_event_line(&line) {
                Ok(event) => return Some(event),
                Err(e) => {
                    self.malformed_lines += 1;
                    warn!(
                        "Skipping event line ({e}): {:?}",
                        line.chars().take(80).collect::<String>()
                    );
                }
            }
        }
        None
    }

    /// Ends the stream. A trailing unterminated line is never parsed; it is
    /// returned (if non-empty) so the caller can log it.
    pub fn finish(&mut self) -> Option<String> {
        self.decoder.finish(self.splitter.buffer_mut());
        let remainder = self.splitter.take_remainder();
        (!remainder.is_empty()).then_some(remainder)
    }

    /// Lines dropped so far, malformed and oversized together.
    pub fn lines_skipped(&self) -> u64 {
        self.malformed_lines + self.splitter.oversized_lines()
    }
}
