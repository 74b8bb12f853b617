use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::{Result, TransportError};

/// A connected bidirectional byte stream — implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// A stream carries raw octets: no line-ending translation, no end-of-file
/// sentinel byte, no buffering beyond the operating system's.
pub struct Stream {
    inner: StreamInner,
}

enum StreamInner {
    Tcp(TcpStream),
    Pipe {
        reader: Box<dyn Read + Send>,
        writer: Box<dyn Write + Send>,
    },
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.read(buf),
            StreamInner::Pipe { reader, .. } => reader.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.write(buf),
            StreamInner::Pipe { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.flush(),
            StreamInner::Pipe { writer, .. } => writer.flush(),
        }
    }
}

impl Stream {
    /// Create a stream from a connected TCP socket.
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: StreamInner::Tcp(stream),
        }
    }

    /// Create a stream from a readable/writable pipe pair.
    ///
    /// Used to talk to a spawned peer over its stdout/stdin pipes. The
    /// halves are owned by the stream and closed when it drops.
    pub fn from_pipes(
        reader: impl Read + Send + 'static,
        writer: impl Write + Send + 'static,
    ) -> Self {
        Self {
            inner: StreamInner::Pipe {
                reader: Box::new(reader),
                writer: Box::new(writer),
            },
        }
    }

    /// Switch the stream between blocking and non-blocking mode.
    ///
    /// Pipe pairs are left as the subprocess facility configured them; the
    /// call is a no-op for them.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_nonblocking(nonblocking).map_err(Into::into),
            StreamInner::Pipe { .. } => Ok(()),
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            StreamInner::Pipe { .. } => Err(TransportError::Unsupported("pipe")),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            StreamInner::Pipe { .. } => Err(TransportError::Unsupported("pipe")),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// Pipe halves are single-owner and cannot be cloned.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            StreamInner::Tcp(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_tcp(cloned))
            }
            StreamInner::Pipe { .. } => Err(TransportError::Unsupported("pipe")),
        }
    }

    /// Shut the stream down for both directions.
    ///
    /// Safe to call more than once; an already-disconnected socket is not
    /// an error. Pipe halves close when the stream drops; here only the
    /// write side is flushed.
    pub fn shutdown(&mut self) -> Result<()> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => match stream.shutdown(Shutdown::Both) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                Err(err) => Err(err.into()),
            },
            StreamInner::Pipe { writer, .. } => {
                writer.flush()?;
                Ok(())
            }
        }
    }

    /// Address of the connected peer, for TCP streams.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.peer_addr().ok(),
            StreamInner::Pipe { .. } => None,
        }
    }

    /// Local address of the stream, for TCP streams.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.local_addr().ok(),
            StreamInner::Pipe { .. } => None,
        }
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            StreamInner::Tcp(_) => f.debug_struct("Stream").field("type", &"tcp").finish(),
            StreamInner::Pipe { .. } => f.debug_struct("Stream").field("type", &"pipe").finish(),
        }
    }
}
