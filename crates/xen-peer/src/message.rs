use bytes::Bytes;

use xen_frame::envelope::{self, Envelope};

/// A decoded inbound message, tagged by category.
///
/// Unknown categories get their own variant so they surface as a warning
/// at dispatch and are never mistaken for a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// `CMD`: script text for the evaluator; expects `OK`/`ERR` back.
    Command { serial: u64, text: String },
    /// `EVT`: asynchronous notification, no reply expected.
    Event { serial: u64, text: String },
    /// `OK`: successful result for the command with the same serial.
    Result { serial: u64, text: String },
    /// `ERR`: failed result, or an unsolicited error when serial is 0.
    Error { serial: u64, text: String },
    /// Any other category literal.
    Unknown {
        category: String,
        serial: u64,
        text: String,
    },
    /// Verbatim payload received in binary transport mode.
    Raw { payload: Bytes },
}

impl Message {
    /// Serial number, if the message carries one.
    pub fn serial(&self) -> Option<u64> {
        match self {
            Message::Command { serial, .. }
            | Message::Event { serial, .. }
            | Message::Result { serial, .. }
            | Message::Error { serial, .. }
            | Message::Unknown { serial, .. } => Some(*serial),
            Message::Raw { .. } => None,
        }
    }

    /// Message text, if the message is textual.
    pub fn text(&self) -> Option<&str> {
        match self {
            Message::Command { text, .. }
            | Message::Event { text, .. }
            | Message::Result { text, .. }
            | Message::Error { text, .. }
            | Message::Unknown { text, .. } => Some(text),
            Message::Raw { .. } => None,
        }
    }

    /// Category literal as it appeared on the wire.
    pub fn category(&self) -> Option<&str> {
        match self {
            Message::Command { .. } => Some(envelope::CMD),
            Message::Event { .. } => Some(envelope::EVT),
            Message::Result { .. } => Some(envelope::OK),
            Message::Error { .. } => Some(envelope::ERR),
            Message::Unknown { category, .. } => Some(category),
            Message::Raw { .. } => None,
        }
    }
}

impl From<Envelope> for Message {
    fn from(env: Envelope) -> Self {
        let Envelope {
            category,
            serial,
            text,
        } = env;
        match category.as_str() {
            envelope::CMD => Message::Command { serial, text },
            envelope::EVT => Message::Event { serial, text },
            envelope::OK => Message::Result { serial, text },
            envelope::ERR => Message::Error { serial, text },
            _ => Message::Unknown {
                category,
                serial,
                text,
            },
        }
    }
}
