use serde::Deserialize;

// Incremental decoder for OpenAI-style SSE bodies. Feed raw byte chunks,
// get back complete `data:` payloads; partial lines carry over to the next
// push. `[DONE]` flips the terminal flag and is not returned.
pub struct SseDecoder {
    buf: String,
    done: bool,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            done: false,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        let mut payloads = Vec::new();
        while let Some(newline) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=newline).collect();
            let line = line.trim();
            let Some(payload) = line.strip_prefix("data: ") else {
                continue;
            };
            if payload == "[DONE]" {
                self.done = true;
                break;
            }
            payloads.push(payload.to_string());
        }
        payloads
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

// Extracts the delta text from one decoded payload. Malformed payloads and
// empty deltas yield None.
pub fn delta_content(payload: &str) -> Option<String> {
    let chunk: StreamChunk = serde_json::from_str(payload).ok()?;
    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_splits_complete_lines() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: {\"a\":1}\n\ndata: {\"b\":2}\n");
        assert_eq!(payloads, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn decoder_carries_partial_lines_across_pushes() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        let payloads = decoder.push(b":1}\n");
        assert_eq!(payloads, vec!["{\"a\":1}"]);
    }

    #[test]
    fn done_marker_terminates_the_stream() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: {\"a\":1}\ndata: [DONE]\ndata: {\"b\":2}\n");
        assert_eq!(payloads, vec!["{\"a\":1}"]);
        assert!(decoder.is_done());
        assert!(decoder.push(b"data: {\"c\":3}\n").is_empty());
    }

    #[test]
    fn non_data_lines_are_ignored() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keepalive\nevent: ping\ndata: {\"a\":1}\n");
        assert_eq!(payloads, vec!["{\"a\":1}"]);
    }

    #[test]
    fn delta_content_reads_openai_shape() {
        let payload = r#"{"choices":[{"delta":{"content":"Great "}}]}"#;
        assert_eq!(delta_content(payload), Some("Great ".to_string()));
        assert_eq!(delta_content(r#"{"choices":[{"delta":{}}]}"#), None);
        assert_eq!(delta_content("not json"), None);
    }
}
