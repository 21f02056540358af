use tracing::warn;

/// Longest line kept before it is dropped as garbage.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Splits a byte stream into trimmed, non-empty text lines.
///
/// Bytes are buffered until a newline arrives, so multi-byte characters split
/// across network chunks survive. A line that is not valid UTF-8, or longer
/// than the configured cap, is dropped with a warning.
#[derive(Debug)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no newline.
    scanned: usize,
    max_line_len: usize,
    /// Set after an overlong line was cut; bytes are skipped up to the next newline.
    discarding: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::with_max_line_len(MAX_LINE_BYTES)
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_line_len,
            discarding: false,
        }
    }

    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.buffer[from..].iter().position(|byte| *byte == b'\n') {
            let end = from + offset;
            if self.discarding {
                self.discarding = false;
            } else {
                push_line(&mut lines, &self.buffer[start..end]);
            }
            start = end + 1;
            from = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_line_len {
            warn!(
                event = "upstream_line_skipped",
                reason = "line_too_long",
                limit = self.max_line_len
            );
            self.buffer.clear();
            self.scanned = 0;
            self.discarding = true;
        }
        lines
    }

    /// Returns the unterminated tail, if any.
    pub fn finish(&mut self) -> Vec<String> {
        let raw = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        let mut lines = Vec::new();
        if !std::mem::take(&mut self.discarding) {
            push_line(&mut lines, &raw);
        }
        lines
    }
}

fn push_line(lines: &mut Vec<String>, raw: &[u8]) {
    match std::str::from_utf8(raw) {
        Ok(text) => {
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
        Err(err) => {
            warn!(event = "upstream_line_skipped", reason = "invalid_utf8", error = %err);
        }
    }
}
