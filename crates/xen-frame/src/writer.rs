use std::io::Write;

use crate::codec::{write_frame, DEFAULT_MAX_PAYLOAD};
use crate::error::Result;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    max_payload: usize,
}

impl<T: Write> FrameWriter<T> {
    /// Create a frame writer with the default payload cap.
    pub fn new(inner: T) -> Self {
        Self::with_max_payload(inner, DEFAULT_MAX_PAYLOAD)
    }

    /// Create a frame writer with an explicit payload cap.
    pub fn with_max_payload(inner: T, max_payload: usize) -> Self {
        Self { inner, max_payload }
    }

    /// Frame and write a payload, then flush.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        write_frame(&mut self.inner, payload, self.max_payload)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the payload cap for subsequent frames.
    pub fn set_max_payload(&mut self, max_payload: usize) {
        self.max_payload = max_payload;
    }
}
