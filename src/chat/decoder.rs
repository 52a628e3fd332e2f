//! Incremental UTF-8 text decoder
//!
//! Turns a sequence of byte chunks into text. A multi-byte character split
//! across two chunks is held back until its remaining bytes arrive, so the
//! concatenated output never depends on where the chunk boundaries fall.
//! Invalid sequences decode to U+FFFD.
//!
//! # Example
//! ```
//! use streamchat::chat::TextStreamDecoder;
//!
//! let mut decoder = TextStreamDecoder::new();
//! // "é" is 0xC3 0xA9
//! assert_eq!(decoder.decode(b"caf\xC3"), "caf");
//! assert_eq!(decoder.decode(b"\xA9!"), "é!");
//! assert_eq!(decoder.finish(), "");
//! ```

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Default)]
pub struct TextStreamDecoder {
    /// Bytes of an incomplete trailing sequence
    pending: Vec<u8>,
    /// Whether the leading byte-order mark check has been done
    started: bool,
}

impl TextStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text that is complete so far
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        if !self.started {
            if self.pending.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(&self.pending) {
                return String::new();
            }
            if self.pending.starts_with(UTF8_BOM) {
                self.pending.drain(..UTF8_BOM.len());
            }
            self.started = true;
        }

        let mut out = String::with_capacity(self.pending.len());
        loop {
            let err = std::str::from_utf8(&self.pending).err();
            let valid = err.map_or(self.pending.len(), |e| e.valid_up_to());
            out.push_str(std::str::from_utf8(&self.pending[..valid]).unwrap_or_default());

            match err.and_then(|e| e.error_len()) {
                Some(bad) => {
                    out.push(char::REPLACEMENT_CHARACTER);
                    self.pending.drain(..valid + bad);
                }
                None => {
                    // Whatever is left is an incomplete sequence; keep it for the next chunk
                    self.pending.drain(..valid);
                    break;
                }
            }
        }
        out
    }

    /// Flush the decoder at end of stream
    ///
    /// A dangling partial sequence becomes a single U+FFFD.
    pub fn finish(&mut self) -> String {
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        self.started = false;
        out
    }

    /// Whether bytes are being held back waiting for the rest of a character
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
