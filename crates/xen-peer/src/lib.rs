//! Channel and endpoint layer for Xen messaging.
//!
//! A [`Channel`] wraps one transport with framed, bidirectional message
//! exchange: commands, events, results and errors, correlated by serial
//! number. [`Server`] and [`connect`] produce channels from TCP
//! endpoints; [`subprocess`] builds them over a spawned peer's pipes.
//! Commands are given meaning by the host through the [`Evaluator`]
//! contract.

pub mod channel;
pub mod connector;
pub mod error;
pub mod evaluator;
pub mod message;
pub mod queue;
pub mod server;
pub mod subprocess;

pub use channel::{Channel, ChannelConfig, DispatchFn};
pub use connector::{connect, connect_host, connect_with_config};
pub use error::{PeerError, Result};
pub use evaluator::Evaluator;
pub use message::Message;
pub use queue::MessageQueue;
pub use server::{Server, ServerConfig};
pub use subprocess::{channel_for, ChildPipes, ChildProcess, SubprocessPort};
