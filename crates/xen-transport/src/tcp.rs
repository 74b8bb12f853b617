use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::Stream;

/// TCP socket transport.
///
/// Provides bind/accept/connect over IPv4/IPv6 stream sockets. Accepted
/// and connected streams are binary-clean: `TCP_NODELAY` is enabled so
/// small frames are not held back, and no translation of any kind is
/// applied to the byte stream.
pub struct TcpSocket {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpSocket {
    /// Bind and listen on `addr`.
    ///
    /// Port 0 requests an OS-assigned port, discoverable afterwards
    /// through [`TcpSocket::local_addr`].
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr()?;

        info!(%local_addr, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Stream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted connection");
        Ok(Stream::from_tcp(stream))
    }

    /// Connect to a listening socket (blocking).
    pub fn connect(addr: SocketAddr) -> Result<Stream> {
        let stream = TcpStream::connect(addr).map_err(|e| TransportError::Connect {
            addr: addr.to_string(),
            source: e,
        })?;
        stream.set_nodelay(true)?;
        debug!(%addr, "connected to tcp socket");
        Ok(Stream::from_tcp(stream))
    }

    /// Connect by host name and port (blocking, resolves the name).
    pub fn connect_host(host: &str, port: u16) -> Result<Stream> {
        let stream = TcpStream::connect((host, port)).map_err(|e| TransportError::Connect {
            addr: format!("{host}:{port}"),
            source: e,
        })?;
        stream.set_nodelay(true)?;
        debug!(host, port, "connected to tcp socket");
        Ok(Stream::from_tcp(stream))
    }

    /// Switch the listener between blocking and non-blocking accept.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.listener.set_nonblocking(nonblocking).map_err(Into::into)
    }

    /// The bound address, with the OS-assigned port filled in.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}
