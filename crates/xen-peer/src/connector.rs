use std::net::SocketAddr;

use tracing::debug;

use xen_transport::TcpSocket;

use crate::channel::{Channel, ChannelConfig};
use crate::error::Result;

/// Connect to a listening endpoint.
pub fn connect(addr: SocketAddr) -> Result<Channel> {
    connect_with_config(addr, ChannelConfig::default())
}

/// Connect with explicit channel configuration.
pub fn connect_with_config(addr: SocketAddr, config: ChannelConfig) -> Result<Channel> {
    let stream = TcpSocket::connect(addr)?;
    debug!(%addr, "connected to peer");
    Channel::with_config(stream, config)
}

/// Connect by host name and port.
pub fn connect_host(host: &str, port: u16) -> Result<Channel> {
    let stream = TcpSocket::connect_host(host, port)?;
    debug!(host, port, "connected to peer");
    Channel::new(stream)
}
