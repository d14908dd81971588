//! Streaming protocol handling for the chat-completions SSE stream
//!
//! Split into a decoder (bytes -> parsed chunk payloads) and an accumulator
//! (chunk payloads -> one reconstructed tool call) so each can be tested
//! against arbitrary chunk boundaries in isolation.

mod accumulator;
mod chunk;

pub use accumulator::ToolCallAccumulator;
pub use chunk::{ChatChunk, ChunkChoice, ChunkDelta, FunctionDelta, ToolCallDelta};

/// Sentinel payload that terminates the event stream
const DONE_SENTINEL: &str = "[DONE]";

/// Server-Sent Events decoder for the chat-completions stream
///
/// Buffers incoming bytes and extracts complete `data:` payloads, parsed into
/// [`ChatChunk`]s. The buffer holds raw bytes and only complete lines are
/// UTF-8-decoded, so a multi-byte character split across network chunks is
/// reassembled intact. Handles:
/// - Events split across multiple network chunks (including mid-character)
/// - Multiple events in a single chunk
/// - Final event without a trailing newline (via [`SseDecoder::finish`])
/// - The `[DONE]` sentinel (swallowed, never surfaced as an event)
/// - Malformed payloads (logged and skipped, never fatal)
///
/// # Example
/// ```
/// use vidchat_cli::llm::streaming::SseDecoder;
///
/// let mut decoder = SseDecoder::new();
///
/// // Event split across two pushes
/// assert!(decoder.push(b"data: {\"choices\":[{\"delta\":{\"con").is_empty());
/// let chunks = decoder.push(b"tent\":\"hi\"}}]}\n\n");
/// assert_eq!(chunks.len(), 1);
///
/// // Sentinel produces no event
/// assert!(decoder.push(b"data: [DONE]\n\n").is_empty());
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push incoming bytes and extract complete, parsed chunk payloads
    ///
    /// Incomplete trailing lines remain buffered as raw bytes for the next
    /// `push()` or `finish()`, so chunk boundaries never corrupt multi-byte
    /// characters.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<ChatChunk> {
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        let mut start = 0;

        while let Some(pos) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            // Lossy UTF-8 conversion for robustness, on complete lines only
            let line = String::from_utf8_lossy(&self.buffer[start..end]);
            if let Some(chunk) = Self::decode_line(line.trim()) {
                chunks.push(chunk);
            }
            start = end + 1;
        }

        self.buffer.drain(..start);
        chunks
    }

    /// Flush any remaining buffered content
    ///
    /// Call this when the transport signals end-of-stream to extract a final
    /// event that lacked a trailing newline.
    pub fn finish(&mut self) -> Vec<ChatChunk> {
        let mut chunks = Vec::new();

        let buffer = std::mem::take(&mut self.buffer);
        for line in String::from_utf8_lossy(&buffer).lines() {
            if let Some(chunk) = Self::decode_line(line.trim()) {
                chunks.push(chunk);
            }
        }

        chunks
    }

    /// Decode one complete line: only `data:`-prefixed lines are candidate
    /// events; the `[DONE]` sentinel and unparseable payloads yield nothing.
    fn decode_line(line: &str) -> Option<ChatChunk> {
        if line.is_empty() {
            return None;
        }

        let payload = line.strip_prefix("data:")?.trim();
        if payload == DONE_SENTINEL {
            return None;
        }

        match serde_json::from_str::<ChatChunk>(payload) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                tracing::warn!("Skipping malformed stream payload: {} ({})", payload, e);
                None
            }
        }
    }
}
