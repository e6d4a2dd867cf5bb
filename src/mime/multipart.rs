//! Multipart body splitting

use tracing::{debug, warn};

use crate::mime::attachment::Attachment;
use crate::mime::body::extract_body;
use crate::mime::charset::decode_text;
use crate::mime::encoded_word::decode_words;
use crate::mime::headers::{parameter, parse_header_block};
use crate::mime::transfer::decode_body;

/// Nested multiparts deeper than this are treated as opaque parts
const MAX_NESTING: usize = 8;

/// What a multipart body splits into
#[derive(Debug, Default)]
pub struct MultipartContent {
    /// Decoded text of the last non-attachment part, if there was one
    pub body: Option<String>,
    /// Attachments in the order they appeared
    pub attachments: Vec<Attachment>,
}

/// Split `body` on `boundary` and decode every part.
pub fn split_parts(body: &str, boundary: &str) -> MultipartContent {
    let mut content = MultipartContent::default();
    split_into(body, boundary, 0, &mut content);
    content
}

fn split_into(body: &str, boundary: &str, depth: usize, content: &mut MultipartContent) {
    let lines: Vec<&str> = body.split("\r\n").collect();
    let delimiter = format!("--{boundary}");
    let closing = format!("{delimiter}--");

    let boundary_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| **line == delimiter || **line == closing)
        .map(|(ix, _)| ix)
        .collect();

    debug!(
        "Splitting multipart body on {boundary:?}: {} part(s)",
        boundary_lines.len().saturating_sub(1)
    );

    for pair in boundary_lines.windows(2) {
        // The part text keeps its trailing boundary line as the terminator.
        let part = lines[pair[0] + 1..=pair[1]].join("\r\n");
        decode_part(&part, boundary, depth, content);
    }
}

fn decode_part(part: &str, boundary: &str, depth: usize, content: &mut MultipartContent) {
    let block = parse_header_block(part);
    let headers = &block.headers;

    let content_type = headers.get_or_empty("Content-Type");
    let content_encoding = headers.get_or_empty("Content-Transfer-Encoding");
    let disposition = headers.get_or_empty("Content-Disposition");

    let raw_body = extract_body(part, Some(boundary));

    if let Some(inner) = block.boundary.as_deref().filter(|inner| *inner != boundary) {
        if depth < MAX_NESTING {
            split_into(&raw_body, inner, depth + 1, content);
            return;
        }
    }

    let bytes = match decode_body(&raw_body, content_encoding) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to decode {content_encoding} part: {e}");
            Vec::new()
        }
    };

    if disposition.to_ascii_lowercase().contains("attachment") {
        let name = parameter(content_type, "name")
            .or_else(|| parameter(disposition, "filename"))
            .unwrap_or("");
        let attachment = Attachment::new(
            decode_words(name).into_owned(),
            bytes,
            content_type.to_owned(),
            content_encoding.to_owned(),
        );
        debug!(
            "Found attachment {:?} ({} bytes)",
            attachment.name,
            attachment.size()
        );
        content.attachments.push(attachment);
    } else {
        content.body = Some(decode_text(&bytes, content_type));
    }
}
