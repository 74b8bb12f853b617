use bytes::{Bytes, BytesMut};

use crate::codec::{decode_frame, DEFAULT_MAX_PAYLOAD};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Incremental frame parser.
///
/// Accepts bytes in arbitrary chunks and emits complete payloads: any
/// partition of a frame stream fed in order yields the same payload
/// sequence as feeding the stream whole. Consumed prefixes are discarded
/// as frames complete, so the buffer stays bounded by one partial frame.
#[derive(Debug)]
pub struct FrameReceiver {
    buf: BytesMut,
    max_payload: usize,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReceiver {
    /// Create a receiver with the default payload cap.
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }

    /// Create a receiver with an explicit payload cap.
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_payload,
        }
    }

    /// Append a chunk and drain every frame it completes, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>> {
        self.buf.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(payload) = decode_frame(&mut self.buf, self.max_payload)? {
            payloads.push(payload);
        }
        Ok(payloads)
    }

    /// Append bytes without draining frames.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Extract the next complete frame from already-buffered bytes.
    pub fn next_payload(&mut self) -> Result<Option<Bytes>> {
        decode_frame(&mut self.buf, self.max_payload)
    }

    /// Number of buffered, not yet consumed bytes.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Update the payload cap for subsequent frames.
    pub fn set_max_payload(&mut self, max_payload: usize) {
        self.max_payload = max_payload;
    }
}
