//! Content-Transfer-Encoding decoding

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// The transfer encodings that change the bytes of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    Base64,
    QuotedPrintable,
    /// 7bit, 8bit, binary, absent or unknown
    Identity,
}

impl TransferEncoding {
    /// Resolve a `Content-Transfer-Encoding` header value (case-insensitive)
    pub fn from_header(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("base64") {
            TransferEncoding::Base64
        } else if value.eq_ignore_ascii_case("quoted-printable") {
            TransferEncoding::QuotedPrintable
        } else {
            TransferEncoding::Identity
        }
    }

    /// Decode body text into raw bytes
    pub fn decode(&self, body: &str) -> Result<Vec<u8>, DecodeError> {
        match self {
            TransferEncoding::Base64 => {
                let compact: Vec<u8> = body
                    .bytes()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                Ok(STANDARD.decode(compact)?)
            }
            TransferEncoding::QuotedPrintable => Ok(qp_decode(body.as_bytes())),
            TransferEncoding::Identity => Ok(body.as_bytes().to_vec()),
        }
    }
}

/// Decode a body according to a `Content-Transfer-Encoding` header value.
pub fn decode_body(body: &str, content_encoding: &str) -> Result<Vec<u8>, DecodeError> {
    TransferEncoding::from_header(content_encoding).decode(body)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Quoted-printable decoding in one forward pass.
///
/// `=XX` becomes the raw byte `XX`, soft line breaks (`=` before CRLF or LF)
/// are dropped, and any other `=` is kept verbatim.
pub(crate) fn qp_decode(input: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::with_capacity(input.len());
    let mut ix = 0;

    while ix < input.len() {
        let byte = input[ix];
        if byte != b'=' {
            decoded.push(byte);
            ix += 1;
            continue;
        }

        let rest = &input[ix + 1..];
        if rest.starts_with(b"\r\n") {
            ix += 3;
        } else if rest.starts_with(b"\n") {
            ix += 2;
        } else if let [hi, lo, ..] = rest {
            match (hex_value(*hi), hex_value(*lo)) {
                (Some(hi), Some(lo)) => {
                    decoded.push(hi << 4 | lo);
                    ix += 3;
                }
                _ => {
                    decoded.push(b'=');
                    ix += 1;
                }
            }
        } else {
            decoded.push(b'=');
            ix += 1;
        }
    }

    decoded
}
