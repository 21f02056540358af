use bytes::Bytes;

pub const DONE_DATA: &str = "[DONE]";

/// Encodes one data-only SSE event. Multi-line payloads get one `data:` line each.
pub fn encode_data(data: &str) -> Bytes {
    let mut out = String::with_capacity(data.len() + 8);
    for line in data.split('\n') {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    Bytes::from(out)
}

pub fn encode_done() -> Bytes {
    Bytes::from_static(b"data: [DONE]\n\n")
}

/// Incremental reader for data-only SSE streams. Yields the joined `data:`
/// payload of every completed event; `event:`, `id:` and comment lines are dropped.
#[derive(Debug, Default)]
pub struct SseDataParser {
    buffer: String,
    data_lines: Vec<String>,
}

impl SseDataParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        self.push_str(&String::from_utf8_lossy(chunk))
    }

    pub fn push_str(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                self.finish_event(&mut events);
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data_lines
                    .push(value.strip_prefix(' ').unwrap_or(value).to_string());
            } else if line == "data" {
                self.data_lines.push(String::new());
            }
        }

        events
    }

    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest.trim_end_matches('\r');
        if let Some(value) = rest.strip_prefix("data:") {
            self.data_lines
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        self.finish_event(&mut events);
        events
    }

    fn finish_event(&mut self, events: &mut Vec<String>) {
        if self.data_lines.is_empty() {
            return;
        }
        events.push(self.data_lines.join("\n"));
        self.data_lines.clear();
    }
}
