/// Errors that can occur during framing, transcoding and envelope parsing.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte stream violates the frame header syntax.
    #[error("protocol error: {0}")]
    Protocol(&'static str),

    /// The announced payload size exceeds the configured maximum.
    #[error("oversized frame ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The payload is not a well-formed `CATEGORY:SERIAL:TEXT` envelope.
    #[error("malformed envelope: {0}")]
    Envelope(String),

    /// Text could not be converted to or from the agreed encoding.
    #[error("encoding error ({encoding}): {reason}")]
    Encoding {
        encoding: &'static str,
        reason: String,
    },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
