use std::io::{ErrorKind, Read};
use std::time::Duration;

use tracing::{debug, info, warn};

use xen_frame::codec::{self, DEFAULT_MAX_PAYLOAD};
use xen_frame::envelope::{self, CMD, ERR, EVT, OK};
use xen_frame::{FrameError, FrameReceiver, TextEncoding};
use xen_transport::Stream;

use crate::error::{PeerError, Result};
use crate::evaluator::Evaluator;
use crate::message::Message;
use crate::queue::MessageQueue;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Callback invoked for dispatched events, responses and raw payloads.
///
/// The channel is passed back so the callback can reply or reconfigure
/// the channel, including replacing the callback itself.
pub type DispatchFn = Box<dyn FnMut(&mut Channel, &Message) + Send>;

enum DispatchSlot {
    /// Log the message at info level.
    Default,
    /// User-supplied callback.
    Custom(DispatchFn),
    /// Marker while a custom callback is running.
    Running,
}

/// Configuration for a channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Text encoding for envelope payloads. `Binary` disables envelopes.
    pub encoding: TextEncoding,
    /// Maximum accepted and produced payload size in bytes.
    pub max_payload: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::Latin1,
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// A framed, bidirectional message connection over one transport.
///
/// The channel owns its transport: closing the channel closes the
/// transport exactly once. Send operations return promptly and never wait
/// for the peer. Receive work happens in [`Channel::poll`] and dispatch
/// in [`Channel::dispatch_one`], one message per idle tick, so a host
/// event loop stays responsive even while commands evaluate.
///
/// The channel is single-consumer: a parallel host wraps it in
/// `Arc<Mutex<Channel>>` and dispatches from one task to preserve
/// ordering.
pub struct Channel {
    stream: Stream,
    config: ChannelConfig,
    serial: u64,
    receiver: FrameReceiver,
    pending: MessageQueue,
    dispatcher: DispatchSlot,
    closed: bool,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("config", &self.config)
            .field("serial", &self.serial)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Channel {
    /// Wrap a connected stream with default configuration.
    ///
    /// The stream is switched to non-blocking binary mode where the
    /// transport supports it; hosts without an event loop can switch
    /// back with [`Channel::set_nonblocking`].
    pub fn new(stream: Stream) -> Result<Self> {
        Self::with_config(stream, ChannelConfig::default())
    }

    /// Wrap a connected stream with an explicit encoding.
    pub fn with_encoding(stream: Stream, encoding: TextEncoding) -> Result<Self> {
        Self::with_config(
            stream,
            ChannelConfig {
                encoding,
                ..ChannelConfig::default()
            },
        )
    }

    /// Wrap a connected stream with explicit configuration.
    pub fn with_config(stream: Stream, config: ChannelConfig) -> Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self {
            receiver: FrameReceiver::with_max_payload(config.max_payload),
            stream,
            config,
            serial: 0,
            pending: MessageQueue::new(),
            dispatcher: DispatchSlot::Default,
            closed: false,
        })
    }

    /// Current text encoding.
    pub fn encoding(&self) -> TextEncoding {
        self.config.encoding
    }

    /// Replace the text encoding for subsequent messages.
    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.config.encoding = encoding;
    }

    /// Switch the transport between blocking and non-blocking mode.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        Ok(self.stream.set_nonblocking(nonblocking)?)
    }

    /// Replace the dispatch callback; `None` restores the default, which
    /// logs each message.
    pub fn set_dispatcher(&mut self, dispatcher: Option<DispatchFn>) {
        self.dispatcher = match dispatcher {
            Some(callback) => DispatchSlot::Custom(callback),
            None => DispatchSlot::Default,
        };
    }

    /// Serial number of the last command or event sent.
    pub fn last_serial(&self) -> u64 {
        self.serial
    }

    /// True once the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// True while decoded messages await dispatch.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of decoded messages awaiting dispatch.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Send a command to be evaluated by the peer; returns its serial.
    pub fn send_command(&mut self, text: &str) -> Result<u64> {
        self.send_with_serial(CMD, text)
    }

    /// Signal an event to the peer; returns its serial.
    pub fn send_event(&mut self, text: &str) -> Result<u64> {
        self.send_with_serial(EVT, text)
    }

    /// Report the success of the command with serial `id`.
    pub fn send_result(&mut self, id: u64, text: &str) -> Result<()> {
        self.send_envelope(OK, id, text)
    }

    /// Report the failure of the command with serial `id`.
    ///
    /// An `id` of 0 denotes an error not tied to a specific command.
    pub fn send_error(&mut self, id: u64, text: &str) -> Result<()> {
        self.send_envelope(ERR, id, text)
    }

    /// Send a payload verbatim, without an envelope.
    ///
    /// The frame header is still produced; only the envelope is skipped.
    /// This is the send path for binary-mode peers.
    pub fn send_raw(&mut self, payload: &[u8]) -> Result<()> {
        self.write_payload(payload)
    }

    fn send_with_serial(&mut self, category: &str, text: &str) -> Result<u64> {
        // The counter starts at 0 and is bumped before use, so the first
        // emitted serial is 1 and 0 stays free to mean "no associated
        // command" on ERR.
        let serial = self.serial + 1;
        self.send_envelope(category, serial, text)?;
        self.serial = serial;
        Ok(serial)
    }

    fn send_envelope(&mut self, category: &str, serial: u64, text: &str) -> Result<()> {
        let body = envelope::format_envelope(category, serial, text);
        // An encoding failure fails this send only; the channel stays open.
        let payload = self.config.encoding.encode(&body)?;
        self.write_payload(&payload)
    }

    fn write_payload(&mut self, payload: &[u8]) -> Result<()> {
        if self.closed {
            return Err(PeerError::Closed);
        }
        match codec::write_frame(&mut self.stream, payload, self.config.max_payload) {
            Ok(()) => Ok(()),
            Err(err @ FrameError::PayloadTooLarge { .. }) => {
                // Nothing went on the wire; the channel stays usable.
                Err(err.into())
            }
            Err(err) => {
                // A failed write leaves the wire in an unknown state.
                warn!(error = %err, "write failed, closing channel");
                self.close();
                Err(err.into())
            }
        }
    }

    /// Read whatever bytes the transport has ready and queue the decoded
    /// messages; returns how many were queued by this call.
    ///
    /// On a protocol, envelope or I/O failure the channel is closed after
    /// a diagnostic and the error returned once; subsequent calls report
    /// [`PeerError::Closed`]. EOF closes the channel after the final
    /// buffered messages have been queued.
    pub fn poll(&mut self) -> Result<usize> {
        if self.closed {
            return Err(PeerError::Closed);
        }

        let mut queued = 0usize;
        let mut eof = false;
        loop {
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.stream.read(&mut chunk) {
                Ok(0) => {
                    eof = true;
                    break;
                }
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) => {
                    warn!(error = %err, "read failed, closing channel");
                    self.close();
                    return Err(FrameError::Io(err).into());
                }
            };
            queued += self.ingest(&chunk[..read])?;
            if read < READ_CHUNK_SIZE {
                break; // drained what was ready
            }
        }

        if eof {
            debug!("peer closed the connection");
            self.close();
        }
        Ok(queued)
    }

    fn ingest(&mut self, chunk: &[u8]) -> Result<usize> {
        let payloads = match self.receiver.feed(chunk) {
            Ok(payloads) => payloads,
            Err(err) => {
                warn!(error = %err, "protocol violation, closing channel");
                self.close();
                return Err(err.into());
            }
        };

        let mut queued = 0usize;
        for payload in payloads {
            let message = if self.config.encoding == TextEncoding::Binary {
                Message::Raw { payload }
            } else {
                match self
                    .config
                    .encoding
                    .decode(&payload)
                    .and_then(|body| envelope::parse_envelope(&body))
                {
                    Ok(env) => Message::from(env),
                    Err(err) => {
                        // A malformed envelope means the peer is
                        // malfunctioning; treat it like a protocol error.
                        warn!(error = %err, "malformed payload, closing channel");
                        self.close();
                        return Err(err.into());
                    }
                }
            };
            self.pending.push(message);
            queued += 1;
        }
        Ok(queued)
    }

    /// Dispatch at most one pending message; returns whether one was
    /// dispatched.
    ///
    /// One message per call keeps receive processing independent from
    /// evaluation latency: the host calls again on its next idle tick
    /// while [`Channel::has_pending`] holds.
    ///
    /// Commands go to the evaluator and are answered with `OK`/`ERR`;
    /// evaluation failures never close the channel. Events, responses and
    /// raw payloads go to the dispatch callback. Unknown categories are
    /// logged and dropped, never evaluated.
    pub fn dispatch_one<E: Evaluator>(&mut self, evaluator: &mut E) -> Result<bool> {
        let Some(message) = self.pending.pop() else {
            return Ok(false);
        };

        match message {
            Message::Command { serial, text } => {
                let reply = match evaluator.evaluate(&text) {
                    Ok(value) => {
                        let result = evaluator.stringify(&value);
                        self.send_result(serial, &result)
                    }
                    Err(reason) => self.send_error(serial, &reason),
                };
                match reply {
                    Ok(()) => {}
                    Err(PeerError::Closed) => {
                        debug!(serial, "reply dropped, channel closed");
                    }
                    Err(err) => return Err(err),
                }
            }
            Message::Unknown {
                ref category,
                serial,
                ..
            } => {
                warn!(%category, serial, "ignoring message with unknown category");
            }
            other => self.run_dispatcher(&other),
        }
        Ok(true)
    }

    fn run_dispatcher(&mut self, message: &Message) {
        match std::mem::replace(&mut self.dispatcher, DispatchSlot::Running) {
            DispatchSlot::Custom(mut callback) => {
                callback(self, message);
                // Put the callback back unless it installed a replacement
                // (or restored the default) while it ran.
                if matches!(self.dispatcher, DispatchSlot::Running) {
                    self.dispatcher = DispatchSlot::Custom(callback);
                }
            }
            previous => {
                self.dispatcher = previous;
                info!(?message, "unhandled message");
            }
        }
    }

    /// Block until the next message is available and return it.
    ///
    /// Bypasses the dispatch callback; meant for hosts without an event
    /// loop, typically after switching the transport back to blocking
    /// mode with [`Channel::set_nonblocking`].
    pub fn recv(&mut self) -> Result<Message> {
        loop {
            if let Some(message) = self.pending.pop() {
                return Ok(message);
            }
            if self.closed {
                return Err(PeerError::Closed);
            }
            if self.poll()? == 0 && !self.closed {
                // Non-blocking transports would otherwise spin here.
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    /// Close the channel and its transport; idempotent.
    ///
    /// Responses to commands still outstanding at close are dropped.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(err) = self.stream.shutdown() {
            debug!(error = %err, "transport shutdown failed");
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}
