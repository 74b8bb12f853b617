//! Wire framing and envelope format for Xen message channels.
//!
//! Every message on the wire is an ASCII header `@<decimal-size>:`
//! followed by exactly `<decimal-size>` payload bytes. Textual payloads
//! carry a `CATEGORY:SERIAL:TEXT` envelope; in binary mode the payload is
//! opaque octets.
//!
//! The [`FrameReceiver`] parses incrementally and tolerates arbitrary
//! chunking, so the same codec serves blocking and non-blocking
//! transports. No partial frames ever reach user code.

pub mod codec;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod reader;
pub mod receiver;
pub mod writer;

pub use codec::{decode_frame, encode_frame, write_frame, DEFAULT_MAX_PAYLOAD};
pub use encoding::TextEncoding;
pub use envelope::{format_envelope, parse_envelope, Envelope, CMD, ERR, EVT, OK};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use receiver::FrameReceiver;
pub use writer::FrameWriter;
