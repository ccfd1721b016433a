//! Server-sent event decoding for the roundtable stream.
//!
//! [`SseDecoder`] turns raw body chunks into [`ServerEvent`]s, carrying
//! partial frames (and split UTF-8 sequences) over to the next chunk.
//! [`StreamEventDispatcher`] drives a decoder from an async byte stream and
//! hands events out one at a time, in arrival order.

use futures::{Stream, StreamExt};
use roundtable_core::error::{Result, RoundtableError};
use roundtable_core::roundtable::ServerEvent;
use std::collections::VecDeque;

/// Literal that ends the stream on transports that do not send `done`.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental SSE frame decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already searched for a frame boundary
    scanned: usize,
    /// Set once the sentinel was seen; later bytes are ignored.
    finished: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns the events of every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        if self.finished {
            return Vec::new();
        }
        // CRLF framing is normalized to LF before boundary detection.
        self.buffer
            .extend(chunk.iter().copied().filter(|byte| *byte != b'\r'));

        let mut events = Vec::new();
        while let Some(boundary) = find_frame_boundary(&self.buffer, self.scanned) {
            let frame: Vec<u8> = self.buffer.drain(..boundary + 2).collect();
            self.scanned = 0;
            if let Some(event) = self.decode_frame(&frame[..boundary]) {
                events.push(event);
            }
            if self.finished {
                self.buffer.clear();
                break;
            }
        }
        // The last byte may be the first half of the next boundary.
        self.scanned = self.buffer.len().saturating_sub(1);
        events
    }

    /// Flushes a trailing frame that was not terminated by a blank line.
    pub fn finish(&mut self) -> Vec<ServerEvent> {
        self.scanned = 0;
        if self.finished || self.buffer.is_empty() {
            self.buffer.clear();
            return Vec::new();
        }
        let frame = std::mem::take(&mut self.buffer);
        self.decode_frame(&frame).into_iter().collect()
    }

    /// True after the `[DONE]` sentinel.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn decode_frame(&mut self, frame: &[u8]) -> Option<ServerEvent> {
        let text = String::from_utf8_lossy(frame);
        let mut data_lines = Vec::new();

        for line in text.split('\n') {
            if line.starts_with(':') {
                continue;
            }
            if let Some(payload) = line.strip_prefix("data:") {
                data_lines.push(payload.strip_prefix(' ').unwrap_or(payload));
            } else if line.trim() == DONE_SENTINEL {
                data_lines.push(line.trim());
            }
        }

        if data_lines.is_empty() {
            return None;
        }
        let payload = data_lines.join("\n");
        if payload.trim() == DONE_SENTINEL {
            tracing::debug!("[SseDecoder] Sentinel received, closing stream");
            self.finished = true;
            return Some(ServerEvent::Done);
        }

        let event = ServerEvent::from_payload(&payload);
        if event.is_none() {
            tracing::warn!(
                "[SseDecoder] Dropped malformed frame ({} bytes)",
                payload.len()
            );
        }
        event
    }
}

fn find_frame_boundary(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(2)
        .position(|pair| pair == b"\n\n")
        .map(|position| position + from)
}

/// Reads a byte stream and yields decoded events strictly in order.
///
/// A stream error or a terminal event (`done`, `error`) ends dispatching:
/// nothing is read or returned after it.
pub struct StreamEventDispatcher<S> {
    stream: S,
    decoder: SseDecoder,
    pending: VecDeque<ServerEvent>,
    exhausted: bool,
}

impl<S, B> StreamEventDispatcher<S>
where
    S: Stream<Item = std::result::Result<B, RoundtableError>> + Unpin,
    B: AsRef<[u8]>,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Returns the next event, `None` at end of stream, or the transport error.
    pub async fn next_event(&mut self) -> Option<Result<ServerEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                if event.is_terminal() {
                    self.exhausted = true;
                    self.pending.clear();
                }
                return Some(Ok(event));
            }
            if self.exhausted || self.decoder.is_finished() {
                return None;
            }

            match self.stream.next().await {
                Some(Ok(chunk)) => {
                    let events = self.decoder.push(chunk.as_ref());
                    self.pending.extend(events);
                }
                Some(Err(error)) => {
                    self.exhausted = true;
                    return Some(Err(error));
                }
                None => {
                    self.exhausted = true;
                    let events = self.decoder.finish();
                    self.pending.extend(events);
                }
            }
        }
    }
}
