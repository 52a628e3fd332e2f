//! Server-Sent Events parsing for streaming providers

use crate::chat::TextStreamDecoder;

/// Server-Sent Events (SSE) decoder
///
/// Buffers incoming bytes and extracts complete SSE `data:` payloads.
/// Handles events split across chunks, several events in one chunk, a final
/// event without a trailing newline, and multi-byte characters cut in half
/// by a chunk boundary.
///
/// # Example
/// ```
/// use streamchat::llm::streaming::SseDecoder;
///
/// let mut decoder = SseDecoder::new();
///
/// let payloads = decoder.push(b"data: {\"text\":\"hello\"}\n\n");
/// assert_eq!(payloads, vec!["{\"text\":\"hello\"}"]);
///
/// assert!(decoder.push(b"data: {\"text\"").is_empty());
/// assert_eq!(decoder.push(b":\"world\"}\n\n"), vec!["{\"text\":\"world\"}"]);
///
/// decoder.push(b"data: [DONE]");
/// assert_eq!(decoder.finish(), vec!["[DONE]"]);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    text: TextStreamDecoder,
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push incoming bytes and extract complete `data:` payloads
    ///
    /// Incomplete lines stay buffered for the next `push()` or `finish()`.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let decoded = self.text.decode(bytes);
        self.buffer.push_str(&decoded);

        let mut payloads = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline_pos).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush whatever is left once the stream has ended
    pub fn finish(&mut self) -> Vec<String> {
        let tail = self.text.finish();
        self.buffer.push_str(&tail);

        let payloads = self.buffer.lines().filter_map(data_payload).collect();
        self.buffer.clear();
        payloads
    }
}

fn data_payload(line: &str) -> Option<String> {
    line.trim()
        .strip_prefix("data:")
        .map(|payload| payload.trim().to_string())
}
