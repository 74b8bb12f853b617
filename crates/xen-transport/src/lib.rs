//! Byte-stream transports for Xen message channels.
//!
//! Provides the abstract bidirectional [`Stream`] that every channel owns,
//! plus the concrete transports that produce one:
//! - TCP sockets (listening acceptor and outbound connector)
//! - pipe pairs (stdin/stdout of a spawned peer process)
//!
//! This is the lowest layer of Xen. Everything else builds on top of the
//! [`Stream`] type provided here.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::Stream;
pub use tcp::TcpSocket;
