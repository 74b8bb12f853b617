//! Bidirectional, asynchronous messaging between cooperating processes.
//!
//! Xen connects a controlling process to one or more compute peers over
//! framed byte channels. Each peer exposes its evaluation capability to
//! the other through four message categories — commands, results,
//! errors and events — correlated by monotone serial numbers, so
//! responses can be matched to requests out of order.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP and pipe byte streams
//! - [`frame`] — wire framing, text encodings, envelopes
//! - [`peer`] — channels, endpoints, dispatch and the evaluator port

/// Re-export transport types.
pub mod transport {
    pub use xen_transport::*;
}

/// Re-export framing types.
pub mod frame {
    pub use xen_frame::*;
}

/// Re-export channel and endpoint types.
pub mod peer {
    pub use xen_peer::*;
}
