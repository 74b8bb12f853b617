/// Errors that can occur in channel and endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] xen_transport::TransportError),

    /// Framing, encoding or envelope error.
    #[error("frame error: {0}")]
    Frame(#[from] xen_frame::FrameError),

    /// The channel has been closed.
    #[error("channel closed")]
    Closed,

    /// The server is at its configured peer capacity.
    #[error("peer capacity exhausted")]
    AtCapacity,
}

pub type Result<T> = std::result::Result<T, PeerError>;
