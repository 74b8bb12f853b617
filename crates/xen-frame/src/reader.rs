use std::io::{ErrorKind, Read};

use bytes::Bytes;

use crate::codec::DEFAULT_MAX_PAYLOAD;
use crate::error::{FrameError, Result};
use crate::receiver::FrameReceiver;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any blocking `Read` stream.
///
/// Loops the incremental receiver until one frame emerges, so callers
/// never deal with partial reads.
pub struct FrameReader<T> {
    inner: T,
    receiver: FrameReceiver,
}

impl<T: Read> FrameReader<T> {
    /// Create a frame reader with the default payload cap.
    pub fn new(inner: T) -> Self {
        Self::with_max_payload(inner, DEFAULT_MAX_PAYLOAD)
    }

    /// Create a frame reader with an explicit payload cap.
    pub fn with_max_payload(inner: T, max_payload: usize) -> Self {
        Self {
            inner,
            receiver: FrameReceiver::with_max_payload(max_payload),
        }
    }

    /// Read the next complete frame payload (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached
    /// before a full frame.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(payload) = self.receiver.next_payload()? {
                return Ok(payload);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.receiver.extend(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the payload cap for subsequent frames.
    pub fn set_max_payload(&mut self, max_payload: usize) {
        self.receiver.set_max_payload(max_payload);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode_frame;

    fn wire(payloads: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for payload in payloads {
            encode_frame(payload, &mut buf);
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[b"hello"])));
        let payload = reader.read_frame().unwrap();
        assert_eq!(payload.as_ref(), b"hello");
    }

    #[test]
    fn read_multiple_frames_in_order() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[b"one", b"two", b"three"])));

        assert_eq!(reader.read_frame().unwrap().as_ref(), b"one");
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"two");
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"three");
    }

    #[test]
    fn partial_reads_are_reassembled() {
        struct ByteByByteReader {
            bytes: Vec<u8>,
            pos: usize,
        }
        impl Read for ByteByByteReader {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.pos >= self.bytes.len() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.bytes[self.pos];
                self.pos += 1;
                Ok(1)
            }
        }

        let mut reader = FrameReader::new(ByteByByteReader {
            bytes: wire(&[b"slow"]),
            pos: 0,
        });
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"slow");
    }

    #[test]
    fn eof_before_any_frame() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn eof_mid_frame() {
        let mut truncated = wire(&[b"only-part"]);
        truncated.truncate(truncated.len() - 4);

        let mut reader = FrameReader::new(Cursor::new(truncated));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn protocol_violation_in_stream() {
        let mut reader = FrameReader::new(Cursor::new(b"!5:hello".to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Protocol(_)));
    }

    #[test]
    fn interrupted_read_retries() {
        struct InterruptedThenData {
            interrupted: bool,
            bytes: Vec<u8>,
            pos: usize,
        }
        impl Read for InterruptedThenData {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(std::io::Error::from(ErrorKind::Interrupted));
                }
                if self.pos >= self.bytes.len() {
                    return Ok(0);
                }
                let n = (self.bytes.len() - self.pos).min(buf.len());
                buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
                self.pos += n;
                Ok(n)
            }
        }

        let mut reader = FrameReader::new(InterruptedThenData {
            interrupted: false,
            bytes: wire(&[b"ok"]),
            pos: 0,
        });
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"ok");
    }

    #[test]
    fn oversized_frame_rejected() {
        let mut reader = FrameReader::with_max_payload(Cursor::new(wire(&[b"too long"])), 4);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socketpair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.send(b"ping").unwrap();
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"ping");
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }
}
