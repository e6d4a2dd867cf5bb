//! Header block parsing
//!
//! A header block runs from the first line up to the first blank line.
//! Lines of the form `name: value` start a header; any other line is folded
//! onto the value of the header before it. Independently, a line carrying a
//! `boundary=` parameter records the multipart boundary.

use std::fmt;

/// Case-insensitive header map that keeps insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// Set a header, replacing any earlier value under the same name.
    ///
    /// A replaced header keeps its original position and spelling.
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.position(name) {
            Some(ix) => self.entries[ix].1 = value.to_owned(),
            None => self.entries.push((name.to_owned(), value.to_owned())),
        }
    }

    /// Append folded text to the value of `name`
    pub fn append(&mut self, name: &str, text: &str) {
        match self.position(name) {
            Some(ix) => self.entries[ix].1.push_str(text),
            None => self.entries.push((name.to_owned(), text.to_owned())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|ix| self.entries[ix].1.as_str())
    }

    /// Lookup that treats an absent header as the empty string
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

/// The result of parsing one header block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    pub headers: Headers,
    /// Multipart boundary found in the block, if any
    pub boundary: Option<String>,
}

/// How a single line of a header block reads
#[derive(Debug, PartialEq, Eq)]
enum HeaderLine<'a> {
    Field { name: &'a str, value: &'a str },
    Continuation(&'a str),
}

/// `name: value` is recognised at the first colon that is followed by
/// whitespace. Everything else continues the previous header.
fn classify_line(line: &str) -> HeaderLine<'_> {
    let bytes = line.as_bytes();
    let field = bytes
        .iter()
        .enumerate()
        .find(|&(ix, &b)| b == b':' && bytes.get(ix + 1).is_some_and(u8::is_ascii_whitespace));

    match field {
        Some((ix, _)) => HeaderLine::Field {
            name: &line[..ix],
            value: line[ix + 1..].trim_start(),
        },
        None => HeaderLine::Continuation(line),
    }
}

/// Parse the header block at the start of `text` (CRLF separated).
pub fn parse_header_block(text: &str) -> HeaderBlock {
    let mut block = HeaderBlock::default();
    let mut current: Option<&str> = None;

    for line in text.split("\r\n") {
        if line.trim().is_empty() {
            break;
        }

        match classify_line(line) {
            HeaderLine::Field { name, value } => {
                block.headers.insert(name, value);
                current = Some(name);
            }
            HeaderLine::Continuation(folded) => match current {
                Some(name) => block.headers.append(name, folded),
                None => tracing::trace!("Dropping header continuation with no header: {folded:?}"),
            },
        }

        if let Some(boundary) = boundary_in_line(line) {
            block.boundary = Some(boundary.to_owned());
        }
    }

    block
}

/// Find a `boundary=` parameter (quotes optional) in one header line
pub(crate) fn boundary_in_line(line: &str) -> Option<&str> {
    const KEY: &str = "boundary=";

    let lower = line.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(found) = lower[search_from..].find(KEY) {
        let start = search_from + found;
        let preceded_ok = lower[..start]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace() || c == ';');

        if preceded_ok {
            let value = parameter_value(&line[start + KEY.len()..]);
            if !value.is_empty() {
                return Some(value);
            }
        }
        search_from = start + KEY.len();
    }

    None
}

/// Read a parameter value: quoted up to the closing quote, otherwise up to
/// `;` or whitespace.
fn parameter_value(raw: &str) -> &str {
    match raw.strip_prefix('"') {
        Some(quoted) => match quoted.find('"') {
            Some(end) => &quoted[..end],
            None => quoted.trim_end(),
        },
        None => {
            let end = raw
                .find(|c: char| c == ';' || c.is_whitespace())
                .unwrap_or(raw.len());
            &raw[..end]
        }
    }
}

/// Look up parameter `key` (case-insensitive) in a structured header value
/// such as `text/plain; charset="utf-8"`.
pub fn parameter<'a>(value: &'a str, key: &str) -> Option<&'a str> {
    value.split(';').skip(1).find_map(|segment| {
        let (name, raw) = segment.split_once('=')?;
        if name.trim().eq_ignore_ascii_case(key) {
            Some(parameter_value(raw.trim()))
        } else {
            None
        }
    })
}
