//! Charset decoding of message text
//!
//! The charset is resolved from a `Content-Type` value. The Unicode
//! encodings are recognised anywhere in the value, other labels only through
//! an explicit `charset=` parameter. Anything unresolvable decodes as ASCII.

use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::{alphabet, Engine as _};
use encoding_rs::{Encoding, UTF_16LE, UTF_8};

use crate::mime::headers::parameter;

/// Base64 flavour used inside UTF-7 shift sequences (RFC 2152): no padding,
/// and the final partial sextet may carry spare bits.
const UTF7_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// A resolved text charset
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Charset {
    Utf7,
    Utf8,
    /// Little-endian unless a byte order mark says otherwise
    Utf16,
    /// Little-endian
    Utf32,
    /// 7-bit ASCII; bytes above 127 become `?`
    Ascii,
    /// Any other label known to the WHATWG encoding registry
    Label(&'static Encoding),
}

impl Charset {
    /// Resolve the charset of a `Content-Type` header value
    pub fn from_content_type(content_type: &str) -> Self {
        let lower = content_type.to_ascii_lowercase();

        if lower.contains("utf-7") {
            Charset::Utf7
        } else if lower.contains("utf-8") {
            Charset::Utf8
        } else if lower.contains("utf-16") {
            Charset::Utf16
        } else if lower.contains("utf32") || lower.contains("utf-32") {
            Charset::Utf32
        } else {
            parameter(&lower, "charset")
                .map(Self::from_label)
                .unwrap_or(Charset::Ascii)
        }
    }

    /// Resolve a bare charset label such as `iso-8859-1`
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_ascii_lowercase();
        match label.as_str() {
            "utf-7" | "utf7" => return Charset::Utf7,
            "utf-32" | "utf32" | "utf-32le" => return Charset::Utf32,
            "us-ascii" | "ascii" => return Charset::Ascii,
            _ => {}
        }

        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) if encoding == UTF_8 => Charset::Utf8,
            Some(encoding) if encoding == UTF_16LE => Charset::Utf16,
            Some(encoding) => Charset::Label(encoding),
            None => Charset::Ascii,
        }
    }

    /// Decode `bytes` into text. Malformed input is replaced, never rejected.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf7 => decode_utf7(bytes),
            Charset::Utf8 => UTF_8.decode(bytes).0.into_owned(),
            Charset::Utf16 => UTF_16LE.decode(bytes).0.into_owned(),
            Charset::Utf32 => decode_utf32(bytes),
            Charset::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect(),
            Charset::Label(encoding) => encoding.decode(bytes).0.into_owned(),
        }
    }
}

/// Decode message bytes using the charset of `content_type`.
pub fn decode_text(bytes: &[u8], content_type: &str) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    Charset::from_content_type(content_type).decode(bytes)
}

fn decode_utf32(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xFF, 0xFE, 0x00, 0x00]).unwrap_or(bytes);

    let chunks = bytes.chunks_exact(4);
    let dangling = !chunks.remainder().is_empty();

    let mut text: String = chunks
        .map(|c| {
            char::from_u32(u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect();

    if dangling {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}

fn is_utf7_base64(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'+' || byte == b'/'
}

/// Permissive UTF-7 decoding. The shift-out `-` is optional and a shift
/// sequence that fails to decode is passed through as-is.
fn decode_utf7(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    let mut ix = 0;

    while ix < bytes.len() {
        if bytes[ix] != b'+' {
            let start = ix;
            while ix < bytes.len() && bytes[ix] != b'+' {
                ix += 1;
            }
            text.push_str(&String::from_utf8_lossy(&bytes[start..ix]));
            continue;
        }

        ix += 1;
        let start = ix;
        while ix < bytes.len() && is_utf7_base64(bytes[ix]) {
            ix += 1;
        }
        let encoded = &bytes[start..ix];

        let shift_out = ix < bytes.len() && bytes[ix] == b'-';
        if shift_out {
            ix += 1;
        }

        if encoded.is_empty() {
            // "+-" stands for a literal plus
            text.push('+');
            continue;
        }

        match UTF7_BASE64.decode(encoded) {
            Ok(raw) => {
                let units: Vec<u16> = raw
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                text.push_str(&String::from_utf16_lossy(&units));
            }
            Err(_) => {
                text.push('+');
                text.push_str(&String::from_utf8_lossy(encoded));
                if shift_out {
                    text.push('-');
                }
            }
        }
    }

    text
}
