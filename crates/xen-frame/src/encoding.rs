use std::fmt;
use std::str::FromStr;

use crate::error::{FrameError, Result};

/// Text encoding agreed between peers for envelope payloads.
///
/// `Binary` disables transcoding entirely: payloads are opaque octets,
/// delivered verbatim, and no envelope parsing takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// ISO 8859-1: one byte per character, code points U+0000..=U+00FF.
    #[default]
    Latin1,
    /// UTF-8.
    Utf8,
    /// No transcoding; payloads carry no text.
    Binary,
}

impl TextEncoding {
    /// Canonical label for this encoding.
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Latin1 => "iso8859-1",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Binary => "binary",
        }
    }

    /// Convert text into payload bytes.
    ///
    /// Fails when the text contains characters the encoding cannot
    /// represent. For `Binary` the string's bytes pass through unchanged.
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            TextEncoding::Latin1 => {
                let mut bytes = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    let code = u32::from(ch);
                    if code > 0xFF {
                        return Err(FrameError::Encoding {
                            encoding: self.label(),
                            reason: format!("character {ch:?} is not representable"),
                        });
                    }
                    bytes.push(code as u8);
                }
                Ok(bytes)
            }
            TextEncoding::Utf8 | TextEncoding::Binary => Ok(text.as_bytes().to_vec()),
        }
    }

    /// Convert payload bytes into text.
    ///
    /// `Binary` payloads never pass through here: the channel delivers
    /// them verbatim, so calling this for `Binary` is an error.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            TextEncoding::Utf8 => {
                String::from_utf8(bytes.to_vec()).map_err(|err| FrameError::Encoding {
                    encoding: self.label(),
                    reason: err.to_string(),
                })
            }
            TextEncoding::Binary => Err(FrameError::Encoding {
                encoding: self.label(),
                reason: "binary payloads carry no text".to_string(),
            }),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = FrameError;

    fn from_str(label: &str) -> Result<Self> {
        match label.to_ascii_lowercase().as_str() {
            "iso8859-1" | "iso-8859-1" | "latin1" | "latin-1" => Ok(TextEncoding::Latin1),
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "binary" => Ok(TextEncoding::Binary),
            _ => Err(FrameError::Encoding {
                encoding: "unknown",
                reason: format!("unsupported encoding label {label:?}"),
            }),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_roundtrip() {
        let text = "caf\u{e9} au lait";
        let bytes = TextEncoding::Latin1.encode(text).unwrap();
        assert_eq!(bytes.len(), text.chars().count());
        assert_eq!(TextEncoding::Latin1.decode(&bytes).unwrap(), text);
    }

    #[test]
    fn latin1_rejects_wide_characters() {
        let err = TextEncoding::Latin1.encode("snowman \u{2603}").unwrap_err();
        assert!(matches!(err, FrameError::Encoding { .. }));
    }

    #[test]
    fn latin1_decode_is_total() {
        let all: Vec<u8> = (0..=255).collect();
        let text = TextEncoding::Latin1.decode(&all).unwrap();
        assert_eq!(text.chars().count(), 256);
    }

    #[test]
    fn utf8_roundtrip() {
        let text = "snowman \u{2603}";
        let bytes = TextEncoding::Utf8.encode(text).unwrap();
        assert_eq!(TextEncoding::Utf8.decode(&bytes).unwrap(), text);
    }

    #[test]
    fn utf8_rejects_invalid_sequences() {
        let err = TextEncoding::Utf8.decode(&[0xFF, 0xFE]).unwrap_err();
        assert!(matches!(err, FrameError::Encoding { .. }));
    }

    #[test]
    fn binary_encode_passes_bytes_through() {
        let bytes = TextEncoding::Binary.encode("as-is").unwrap();
        assert_eq!(bytes, b"as-is");
    }

    #[test]
    fn binary_decode_is_refused() {
        let err = TextEncoding::Binary.decode(b"raw").unwrap_err();
        assert!(matches!(err, FrameError::Encoding { .. }));
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(
            "ISO8859-1".parse::<TextEncoding>().unwrap(),
            TextEncoding::Latin1
        );
        assert_eq!(
            "latin-1".parse::<TextEncoding>().unwrap(),
            TextEncoding::Latin1
        );
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!(
            "binary".parse::<TextEncoding>().unwrap(),
            TextEncoding::Binary
        );
        assert!("ebcdic".parse::<TextEncoding>().is_err());
    }

    #[test]
    fn default_is_latin1() {
        assert_eq!(TextEncoding::default(), TextEncoding::Latin1);
        assert_eq!(TextEncoding::default().to_string(), "iso8859-1");
    }
}
