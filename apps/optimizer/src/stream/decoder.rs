//! Incremental UTF-8 decoding of raw body chunks.
//!
//! A multi-byte character may be split across two network chunks. The decoder
//! holds back the incomplete tail of a chunk and completes it with the head of
//! the next one. Invalid sequences decode to U+FFFD instead of failing the
//! stream.

const REPLACEMENT: char = '\u{FFFD}';

#[derive(Debug, Default)]
pub struct ChunkDecoder {
    /// Bytes of a character whose remaining bytes have not arrived yet (≤ 3).
    pending: Vec<u8>,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `chunk` and appends the text to `out`.
    pub fn decode_into(&mut self, chunk: &[u8], out: &mut String) {
        if self.pending.is_empty() {
            self.decode_bytes(chunk, out);
            return;
        }

        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);
        self.decode_bytes(&bytes, out);
    }

    /// Signals end of stream. A dangling partial character becomes U+FFFD.
    pub fn finish(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            self.pending.clear();
            out.push(REPLACEMENT);
        }
    }

    fn decode_bytes(&mut self, mut bytes: &[u8], out: &mut String) {
        loop {
            match std::str::from_utf8(bytes) {
                Ok(text) => {
                    out.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, rest) = bytes.split_at(err.valid_up_to());
                    // `valid` was just checked by from_utf8.
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        Some(invalid_len) => {
                            out.push(REPLACEMENT);
                            bytes = &rest[invalid_len..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more input.
                            self.pending.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }
}
