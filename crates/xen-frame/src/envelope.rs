//! The `CATEGORY:SERIAL:TEXT` envelope carried inside textual payloads.
//!
//! Category validity is deliberately not enforced here: unknown categories
//! must surface at dispatch time through a single observable path, so the
//! parser keeps the literal as it appeared on the wire.

use crate::error::{FrameError, Result};

/// Category literal for remote commands.
pub const CMD: &str = "CMD";
/// Category literal for asynchronous events.
pub const EVT: &str = "EVT";
/// Category literal for successful command results.
pub const OK: &str = "OK";
/// Category literal for failed results and unsolicited errors.
pub const ERR: &str = "ERR";

/// A parsed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Category literal as it appeared on the wire.
    pub category: String,
    /// Sender-assigned serial number.
    pub serial: u64,
    /// Message text; may itself contain `:` bytes.
    pub text: String,
}

/// Format an envelope as `<category>:<serial>:<text>`.
pub fn format_envelope(category: &str, serial: u64, text: &str) -> String {
    format!("{category}:{serial}:{text}")
}

/// Parse an envelope, splitting on the first two colons only.
///
/// The text field is everything after the second colon, verbatim,
/// including any further colons. The serial must be a plain non-negative
/// decimal integer: no sign, no leading `+`.
pub fn parse_envelope(input: &str) -> Result<Envelope> {
    let malformed = || FrameError::Envelope(format!("expected CATEGORY:SERIAL:TEXT, got {input:?}"));

    let first = input.find(':').ok_or_else(malformed)?;
    let rest = &input[first + 1..];
    let second = rest.find(':').ok_or_else(malformed)?;

    let category = &input[..first];
    let serial_field = &rest[..second];
    let text = &rest[second + 1..];

    if serial_field.is_empty() || !serial_field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FrameError::Envelope(format!(
            "serial {serial_field:?} is not a non-negative decimal"
        )));
    }
    let serial = serial_field.parse::<u64>().map_err(|_| {
        FrameError::Envelope(format!("serial {serial_field:?} out of range"))
    })?;

    Ok(Envelope {
        category: category.to_string(),
        serial,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_then_parse_roundtrip() {
        for (category, serial, text) in [
            (CMD, 1, "return 1+1"),
            (EVT, 7, ""),
            (OK, 42, "2"),
            (ERR, 0, "capacity-exhausted"),
        ] {
            let wire = format_envelope(category, serial, text);
            let env = parse_envelope(&wire).unwrap();
            assert_eq!(env.category, category);
            assert_eq!(env.serial, serial);
            assert_eq!(env.text, text);
        }
    }

    #[test]
    fn text_keeps_further_colons() {
        let env = parse_envelope("EVT:7:a:b:c").unwrap();
        assert_eq!(env.category, "EVT");
        assert_eq!(env.serial, 7);
        assert_eq!(env.text, "a:b:c");
    }

    #[test]
    fn empty_text_is_legal() {
        let env = parse_envelope("EVT:1:").unwrap();
        assert_eq!(env.text, "");
    }

    #[test]
    fn unknown_category_parses() {
        // Validity is the dispatcher's concern, not the parser's.
        let env = parse_envelope("WTF:3:x").unwrap();
        assert_eq!(env.category, "WTF");
    }

    #[test]
    fn fewer_than_two_colons_rejected() {
        assert!(matches!(
            parse_envelope("CMD"),
            Err(FrameError::Envelope(_))
        ));
        assert!(matches!(
            parse_envelope("CMD:12"),
            Err(FrameError::Envelope(_))
        ));
    }

    #[test]
    fn non_decimal_serial_rejected() {
        for input in ["CMD::x", "CMD:abc:x", "CMD:+5:x", "CMD:-5:x", "CMD:1 2:x"] {
            assert!(
                matches!(parse_envelope(input), Err(FrameError::Envelope(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn serial_overflow_rejected() {
        let input = format!("CMD:{}0:x", u64::MAX);
        assert!(matches!(
            parse_envelope(&input),
            Err(FrameError::Envelope(_))
        ));
    }
}
