use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::{debug, warn};

use xen_frame::{codec, envelope};
use xen_transport::{Stream, TcpSocket};

use crate::channel::{Channel, ChannelConfig};
use crate::error::{PeerError, Result};

/// Configuration for a listening endpoint.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub address: IpAddr,
    /// Listen port; 0 requests an OS-assigned port.
    pub port: u16,
    /// Maximum number of simultaneous peers; `None` means unlimited.
    pub max_peers: Option<usize>,
    /// Configuration applied to accepted channels.
    pub channel: ChannelConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            max_peers: None,
            channel: ChannelConfig::default(),
        }
    }
}

/// A listening endpoint producing channels.
///
/// The server owns its peer set: accepted channels live here until they
/// close or the server shuts down. Client and server use the same
/// [`Channel`] type; the protocol is fully symmetric.
pub struct Server {
    socket: TcpSocket,
    config: ServerConfig,
    peers: Vec<Channel>,
}

impl Server {
    /// Bind with default configuration: loopback, OS-assigned port,
    /// unlimited peers.
    pub fn bind() -> Result<Self> {
        Self::with_config(ServerConfig::default())
    }

    /// Bind with explicit configuration.
    pub fn with_config(config: ServerConfig) -> Result<Self> {
        let socket = TcpSocket::bind(SocketAddr::new(config.address, config.port))?;
        Ok(Self {
            socket,
            config,
            peers: Vec::new(),
        })
    }

    /// The bound address, with the OS-assigned port filled in.
    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr()
    }

    /// Accept the next connection and add it to the peer set (blocking).
    ///
    /// At capacity the new transport is rejected: a best-effort
    /// `ERR:0:capacity-exhausted` is written, the stream closed and
    /// [`PeerError::AtCapacity`] returned. Existing peers are unaffected.
    pub fn accept(&mut self) -> Result<&mut Channel> {
        let stream = self.socket.accept()?;
        self.remove_closed();

        if let Some(max) = self.config.max_peers {
            if self.peers.len() >= max {
                warn!(max, "rejecting connection, peer capacity exhausted");
                reject(stream, &self.config.channel);
                return Err(PeerError::AtCapacity);
            }
        }

        let channel = Channel::with_config(stream, self.config.channel.clone())?;
        self.peers.push(channel);
        debug!(peers = self.peers.len(), "accepted peer");

        let last = self.peers.len() - 1;
        Ok(&mut self.peers[last])
    }

    /// Live peer channels.
    pub fn peers(&self) -> &[Channel] {
        &self.peers
    }

    /// Mutable access to the peer set, for polling and dispatch.
    pub fn peers_mut(&mut self) -> &mut [Channel] {
        &mut self.peers
    }

    /// Number of live peers.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Drop peers whose channels have closed.
    pub fn remove_closed(&mut self) {
        self.peers.retain(|peer| !peer.is_closed());
    }

    /// Destroy all peer channels, then the listener.
    pub fn close(mut self) {
        for peer in &mut self.peers {
            peer.close();
        }
        self.peers.clear();
        // The listener socket closes as `self` drops.
    }
}

/// Turn away a connection that exceeds the peer cap.
fn reject(mut stream: Stream, config: &ChannelConfig) {
    let body = envelope::format_envelope(envelope::ERR, 0, "capacity-exhausted");
    let payload = config
        .encoding
        .encode(&body)
        .unwrap_or_else(|_| body.clone().into_bytes());
    if let Err(err) = codec::write_frame(&mut stream, &payload, config.max_payload) {
        debug!(error = %err, "capacity rejection notice not delivered");
    }
    if let Err(err) = stream.shutdown() {
        debug!(error = %err, "rejected stream shutdown failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::connect;
    use crate::evaluator::Unsupported;
    use crate::message::Message;

    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    fn poll_until(channel: &mut Channel, want: usize) -> usize {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut total = 0usize;
        while total < want && Instant::now() < deadline {
            match channel.poll() {
                Ok(n) => total += n,
                Err(_) => break,
            }
            if total < want {
                thread::sleep(Duration::from_millis(2));
            }
        }
        total
    }

    #[test]
    fn bind_reports_assigned_port() {
        let server = Server::bind().unwrap();
        assert_ne!(server.local_addr().port(), 0);
        assert_eq!(server.peer_count(), 0);
    }

    #[test]
    fn accept_and_exchange_messages() {
        let mut server = Server::bind().unwrap();
        let addr = server.local_addr();

        let handle = thread::spawn(move || {
            let mut client = connect(addr).unwrap();
            let serial = client.send_event("hello from client").unwrap();
            serial
        });

        let peer = server.accept().unwrap();
        assert_eq!(poll_until(peer, 1), 1);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        peer.set_dispatcher(Some(Box::new(move |_chan, message| {
            sink.lock().unwrap().push(message.clone());
        })));
        peer.dispatch_one(&mut Unsupported).unwrap();

        let serial = handle.join().unwrap();
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            [Message::Event {
                serial,
                text: "hello from client".to_string(),
            }]
        );
    }

    #[test]
    fn capacity_rejection_leaves_existing_peer_working() {
        let mut server = Server::with_config(ServerConfig {
            max_peers: Some(1),
            ..ServerConfig::default()
        })
        .unwrap();
        let addr = server.local_addr();

        let first = thread::spawn(move || {
            let mut client = connect(addr).unwrap();
            client.send_event("settled").unwrap();
            client
        });
        server.accept().unwrap();
        let mut first_client = first.join().unwrap();

        let second = thread::spawn(move || {
            let mut client = connect(addr).unwrap();

            // The rejection notice arrives, then the stream closes.
            let deadline = Instant::now() + Duration::from_secs(5);
            while !client.has_pending() && Instant::now() < deadline {
                if client.poll().is_err() {
                    break;
                }
                thread::sleep(Duration::from_millis(2));
            }

            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            client.set_dispatcher(Some(Box::new(move |_chan, message| {
                sink.lock().unwrap().push(message.clone());
            })));
            while client.dispatch_one(&mut Unsupported).unwrap() {}
            let messages = seen.lock().unwrap().clone();
            messages
        });

        let err = server.accept().unwrap_err();
        assert!(matches!(err, PeerError::AtCapacity));
        assert_eq!(server.peer_count(), 1);

        let rejected = second.join().unwrap();
        assert_eq!(
            rejected.as_slice(),
            [Message::Error {
                serial: 0,
                text: "capacity-exhausted".to_string(),
            }]
        );

        // The surviving peer still exchanges messages both ways.
        first_client.send_event("still here").unwrap();
        let peer = &mut server.peers_mut()[0];
        assert_eq!(poll_until(peer, 2), 2);
        peer.send_result(1, "ack").unwrap();
        assert_eq!(poll_until(&mut first_client, 1), 1);
    }

    #[test]
    fn closed_peers_are_pruned() {
        let mut server = Server::bind().unwrap();
        let addr = server.local_addr();

        let handle = thread::spawn(move || connect(addr).unwrap());
        server.accept().unwrap();
        let client = handle.join().unwrap();
        assert_eq!(server.peer_count(), 1);

        drop(client);
        // Poll until the EOF is observed and the channel closes itself.
        let deadline = Instant::now() + Duration::from_secs(5);
        while !server.peers()[0].is_closed() && Instant::now() < deadline {
            let _ = server.peers_mut()[0].poll();
            thread::sleep(Duration::from_millis(2));
        }

        server.remove_closed();
        assert_eq!(server.peer_count(), 0);
    }

    #[test]
    fn close_destroys_all_peers() {
        let mut server = Server::bind().unwrap();
        let addr = server.local_addr();

        let handle = thread::spawn(move || connect(addr).unwrap());
        server.accept().unwrap();
        let _client = handle.join().unwrap();

        server.close();
    }
}
