use std::io::{ErrorKind, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame begin marker: `@`.
pub const BEGIN: u8 = 0x40;

/// Header terminator separating the size from the payload: `:`.
pub const SEPARATOR: u8 = 0x3A;

/// Default maximum payload size: 64 MiB.
///
/// A cap on the announced size defends against truncation bugs turning
/// into unbounded buffer growth; peers exchanging larger payloads raise it
/// explicitly.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// @<decimal-size>:<size bytes of payload>
/// ```
/// The header is pure ASCII: the `@` marker, the payload length in decimal
/// with no sign and no padding, and a terminating `:`. The payload is
/// opaque octets.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    let header = format!("@{}:", payload.len());
    dst.reserve(header.len() + payload.len());
    dst.put_slice(header.as_bytes());
    dst.put_slice(payload);
}

/// Decode one frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
///
/// The header is validated byte-by-byte even when the remaining data is
/// obviously truncated, so stray bytes are reported as soon as they
/// arrive. Leading zeros in the size are accepted.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.is_empty() {
        return Ok(None);
    }
    if src[0] != BEGIN {
        return Err(FrameError::Protocol("missing begin marker"));
    }

    let mut size = 0usize;
    let mut idx = 1;
    loop {
        let Some(&byte) = src.get(idx) else {
            return Ok(None); // header incomplete, need more data
        };
        match byte {
            b'0'..=b'9' => {
                size = size * 10 + usize::from(byte - b'0');
                if size > max_payload {
                    return Err(FrameError::PayloadTooLarge {
                        size,
                        max: max_payload,
                    });
                }
                idx += 1;
            }
            SEPARATOR => {
                if idx == 1 {
                    return Err(FrameError::Protocol("no size digits in header"));
                }
                break;
            }
            _ => return Err(FrameError::Protocol("unexpected byte in header")),
        }
    }

    let body_start = idx + 1;
    if src.len() < body_start + size {
        return Ok(None); // body incomplete, need more data
    }

    src.advance(body_start);
    Ok(Some(src.split_to(size).freeze()))
}

/// Frame a payload, write it to a transport and flush.
///
/// This is the single write path shared by the blocking [`FrameWriter`]
/// and the channel layer. Writes interrupted by signals or short
/// non-blocking writes are retried; a zero-length write is reported as
/// [`FrameError::ConnectionClosed`].
///
/// [`FrameWriter`]: crate::writer::FrameWriter
pub fn write_frame<W: Write>(out: &mut W, payload: &[u8], max_payload: usize) -> Result<()> {
    if payload.len() > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: max_payload,
        });
    }

    let mut buf = BytesMut::with_capacity(payload.len() + 24);
    encode_frame(payload, &mut buf);

    let mut offset = 0usize;
    while offset < buf.len() {
        match out.write(&buf[offset..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    loop {
        match out.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}
