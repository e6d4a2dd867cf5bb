//! RFC 2047 encoded-word decoding for unstructured header text

use std::borrow::Cow;

use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::{alphabet, Engine as _};

use crate::mime::charset::Charset;
use crate::mime::transfer::qp_decode;

/// Some agents drop the padding of B-encoded words.
const WORD_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode every `=?charset?B|Q?text?=` word in `text`.
///
/// Whitespace between two adjacent encoded words is removed. Words that do
/// not parse or decode are left untouched.
pub fn decode_words(text: &str) -> Cow<'_, str> {
    if !text.contains("=?") {
        return Cow::Borrowed(text);
    }

    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;
    let mut after_word = false;

    while let Some((start, end, word)) = next_word(rest) {
        let gap = &rest[..start];
        if !(after_word && gap.chars().all(char::is_whitespace)) {
            decoded.push_str(gap);
        }
        decoded.push_str(&word);
        rest = &rest[end..];
        after_word = true;
    }
    decoded.push_str(rest);

    Cow::Owned(decoded)
}

/// Find the next decodable encoded word, returning its span and text.
fn next_word(text: &str) -> Option<(usize, usize, String)> {
    let mut from = 0;
    while let Some(found) = text[from..].find("=?") {
        let start = from + found;
        if let Some((len, word)) = decode_word(&text[start..]) {
            return Some((start, start + len, word));
        }
        from = start + 2;
    }
    None
}

/// Decode an encoded word at the start of `text`; returns its length too.
fn decode_word(text: &str) -> Option<(usize, String)> {
    let inner = text.strip_prefix("=?")?;
    let (charset, inner) = inner.split_once('?')?;
    let (encoding, inner) = inner.split_once('?')?;
    let payload_len = inner.find("?=")?;
    let payload = &inner[..payload_len];

    let token_ok = |s: &str| !s.is_empty() && !s.contains(char::is_whitespace);
    if !token_ok(charset) || !token_ok(encoding) || payload.contains(char::is_whitespace) {
        return None;
    }

    let raw = if encoding.eq_ignore_ascii_case("b") {
        WORD_BASE64.decode(payload).ok()?
    } else if encoding.eq_ignore_ascii_case("q") {
        qp_decode(payload.replace('_', " ").as_bytes())
    } else {
        return None;
    };

    // RFC 2231 allows a language suffix: charset*lang
    let label = charset.split('*').next().unwrap_or(charset);
    let word = Charset::from_label(label).decode(&raw);

    let len = 2 + charset.len() + 1 + encoding.len() + 1 + payload_len + 2;
    Some((len, word))
}
