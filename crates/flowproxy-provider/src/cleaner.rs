//! Removes the scaffolding preamble FlowGPT sometimes puts in front of an answer.
//!
//! Whether a response carries the preamble is unknown until either the marker
//! shows up or enough text has arrived without it, so the cleaner buffers
//! until one of those happens and then commits to a decision for the rest of
//! the stream.

/// Ends the preamble. Inferred from upstream output; revisit if the format changes.
pub const MARKER: &str = "Response:**";
/// Characters buffered without seeing [`MARKER`] before the response is assumed
/// to have no preamble.
pub const DECISION_THRESHOLD: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanerState {
    Undecided,
    PreambleStripped,
    NoPreamble,
}

/// One per stream. Not shared, not reused.
#[derive(Debug)]
pub struct StreamCleaner {
    state: CleanerState,
    buffer: String,
    buffered_chars: usize,
    // Whitespace right after the marker is dropped even if it arrives in later
    // increments, up to the first visible character.
    trim_pending: bool,
}

impl Default for StreamCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamCleaner {
    pub fn new() -> Self {
        Self {
            state: CleanerState::Undecided,
            buffer: String::new(),
            buffered_chars: 0,
            trim_pending: false,
        }
    }

    pub fn state(&self) -> CleanerState {
        self.state
    }

    /// Feeds one raw increment and returns the text to emit for it, possibly empty.
    pub fn push(&mut self, increment: &str) -> String {
        match self.state {
            CleanerState::Undecided => self.push_undecided(increment),
            CleanerState::PreambleStripped if self.trim_pending => {
                let rest = increment.trim_start();
                if !rest.is_empty() {
                    self.trim_pending = false;
                }
                rest.to_string()
            }
            CleanerState::PreambleStripped | CleanerState::NoPreamble => increment.to_string(),
        }
    }

    /// Text still held back when the stream ends without a decision.
    pub fn finish(&mut self) -> Option<String> {
        self.buffered_chars = 0;
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    fn push_undecided(&mut self, increment: &str) -> String {
        self.buffer.push_str(increment);
        self.buffered_chars += increment.chars().count();

        if let Some(pos) = self.buffer.find(MARKER) {
            let rest = self.buffer[pos + MARKER.len()..].trim_start().to_string();
            self.buffer.clear();
            self.buffered_chars = 0;
            self.state = CleanerState::PreambleStripped;
            self.trim_pending = rest.is_empty();
            return rest;
        }

        if self.buffered_chars > DECISION_THRESHOLD {
            self.buffered_chars = 0;
            self.state = CleanerState::NoPreamble;
            return std::mem::take(&mut self.buffer);
        }

        String::new()
    }
}
