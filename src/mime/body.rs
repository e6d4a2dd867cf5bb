//! Body extraction from a header/body text block

/// Extract the body of `text` (CRLF separated).
///
/// Without a boundary this reads a DATA payload: the body runs from the line
/// after the first blank line up to the last bare `.` line, a trailing blank
/// line before the `.` is dropped, and dot-stuffed lines are unstuffed.
///
/// With a boundary this reads one MIME part: the body ends at the last
/// `--{boundary}` line, or the last `--{boundary}--` line if there is none.
///
/// A missing terminator or a blank body yields an empty string.
pub fn extract_body(text: &str, boundary: Option<&str>) -> String {
    let lines: Vec<&str> = text.split("\r\n").collect();
    let boundary = boundary.filter(|b| !b.is_empty());

    let end = match boundary {
        Some(boundary) => {
            let delimiter = format!("--{boundary}");
            let closing = format!("{delimiter}--");
            lines
                .iter()
                .rposition(|line| *line == delimiter)
                .or_else(|| lines.iter().rposition(|line| *line == closing))
        }
        None => lines.iter().rposition(|line| *line == "."),
    };
    let Some(end) = end else {
        return String::new();
    };

    let start = lines
        .iter()
        .position(|line| line.is_empty())
        .map_or(0, |ix| ix + 1);
    if start >= end {
        return String::new();
    }

    let mut span = &lines[start..end];
    let body = match boundary {
        Some(_) => span.join("\r\n"),
        None => {
            if let Some((last, rest)) = span.split_last() {
                if last.is_empty() {
                    span = rest;
                }
            }
            span.iter()
                .map(|&line| line.strip_prefix('.').filter(|l| l.starts_with('.')).unwrap_or(line))
                .collect::<Vec<_>>()
                .join("\r\n")
        }
    };

    if body.trim().is_empty() {
        String::new()
    } else {
        body
    }
}

/// A DATA payload is well formed when it contains a bare `.` line.
pub fn is_body_valid(text: &str) -> bool {
    text.split("\r\n").any(|line| line == ".")
}
