//! Event Line Splitter: pulls complete `data: ` lines out of the decoded buffer.

use tracing::warn;

/// Every event line on the wire starts with this literal.
pub const EVENT_PREFIX: &str = "data: ";

/// Owns the decoded-text buffer of one stream.
///
/// Complete lines are removed from the front of the buffer as they are
/// yielded; an unterminated tail stays put until more text arrives. Lines that
/// are empty or lack [`EVENT_PREFIX`] are dropped without comment so the
/// server can add other framing later.
#[derive(Debug)]
pub struct LineSplitter {
    buffer: String,
    max_line_bytes: usize,
    /// Set after an oversized partial line was thrown away; everything up to
    /// the next terminator belongs to that line and is skipped too.
    discarding: bool,
    oversized_lines: u64,
}

impl LineSplitter {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buffer: String::new(),
            max_line_bytes,
            discarding: false,
            oversized_lines: 0,
        }
    }

    #[cfg(test)]
    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Mutable access for decoders that write straight into the buffer.
    pub fn buffer_mut(&mut self) -> &mut String {
        &mut self.buffer
    }

    /// Returns the next complete event line, terminator stripped, prefix kept.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let Some(newline) = self.buffer.find('\n') else {
                self.guard_partial_line();
                return None;
            };

            let mut line: String = self.buffer.drain(..=newline).collect();
            line.pop();

            if std::mem::take(&mut self.discarding) {
                continue;
            }
            // Same bound as a partial line, so the outcome does not depend
            // on where the chunks were cut.
            if line.len() > self.max_line_bytes {
                self.drop_oversized();
                continue;
            }
            if line.ends_with('\r') {
                line.pop();
            }
            if line.is_empty() || !line.starts_with(EVENT_PREFIX) {
                continue;
            }
            return Some(line);
        }
    }

    /// The unterminated text still waiting for its line break.
    #[cfg(test)]
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    /// Empties the buffer, returning whatever partial line it held.
    pub fn take_remainder(&mut self) -> String {
        self.discarding = false;
        std::mem::take(&mut self.buffer)
    }

    /// Number of lines dropped for exceeding the size limit.
    pub fn oversized_lines(&self) -> u64 {
        self.oversized_lines
    }

    fn guard_partial_line(&mut self) {
        if self.buffer.len() <= self.max_line_bytes {
            return;
        }
        if !self.discarding {
            self.drop_oversized();
            self.discarding = true;
        }
        self.buffer.clear();
    }

    fn drop_oversized(&mut self) {
        warn!(
            "Dropping event line larger than {} bytes",
            self.max_line_bytes
        );
        self.oversized_lines += 1;
    }
}
