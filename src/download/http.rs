//! HTTP/1.1 request construction and response-head parsing.
//!
//! Only the pieces the downloader needs: a `GET` request line with a fixed set
//! of headers, a `<version> <status>` status line, and `Name: value` header
//! lines. Everything here is pure; socket I/O lives in the client module.

use std::fmt::Write as _;

use super::constants::RANGE_HEADER;

/// A single response header as it appeared on the wire.
///
/// Names and values are kept as parsed (no case folding, no trimming beyond
/// the spaces directly after the colon).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Header field name.
    pub name: String,
    /// Header field value.
    pub value: String,
}

impl Header {
    /// Creates a header pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Parsed first line of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Protocol version token, e.g. `HTTP/1.1`.
    pub version: String,
    /// Numeric status code.
    pub status: u16,
}

impl StatusLine {
    /// Whether the version token names HTTP at all.
    #[must_use]
    pub fn is_http(&self) -> bool {
        self.version.starts_with("HTTP/")
    }

    /// Whether the status code is in the 2xx class.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status / 100 == 2
    }
}

/// Status line plus the header pairs that followed it, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// The parsed status line.
    pub status: StatusLine,
    /// Header pairs in the order received.
    pub headers: Vec<Header>,
}

impl ResponseHead {
    /// Returns the value of the first header named `name` (ASCII case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Returns the declared `Content-Length`, if present and numeric.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        declared_length(&self.headers)
    }

    /// Returns `N` from a `Content-Range: bytes */N` header, the form a server
    /// uses to report the full length when rejecting a range as unsatisfiable.
    #[must_use]
    pub fn unsatisfied_range_length(&self) -> Option<u64> {
        unsatisfied_range_length(&self.headers)
    }
}

/// Parses the first `Content-Length` header of `headers`.
pub(crate) fn declared_length(headers: &[Header]) -> Option<u64> {
    find_header(headers, "Content-Length").and_then(|value| value.trim().parse().ok())
}

pub(crate) fn unsatisfied_range_length(headers: &[Header]) -> Option<u64> {
    let value = find_header(headers, "Content-Range")?.trim();
    let (unit, length) = value.split_once(' ')?;
    if !unit.eq_ignore_ascii_case("bytes") {
        return None;
    }
    length.trim().strip_prefix("*/")?.parse().ok()
}

/// Looks up a header value by name (ASCII case-insensitive), first match wins.
#[must_use]
pub fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(name))
        .map(|header| header.value.as_str())
}

/// Builds a `GET` request for `path` on `host`.
///
/// When `range_start` is given a `RANGE: bytes=<offset>-` header is added,
/// including for offset 0.
#[must_use]
pub fn build_request(host: &str, path: &str, range_start: Option<u64>) -> String {
    let mut request = format!("GET {path} HTTP/1.1\r\nHost: {host}\r\n");
    if let Some(offset) = range_start {
        let _ = write!(request, "{RANGE_HEADER}: bytes={offset}-\r\n");
    }
    request.push_str("Accept: */*\r\n");
    request.push_str("Connection: Close\r\n\r\n");
    request
}

/// Parses `<version> <status-code> [reason...]`.
///
/// The reason phrase is ignored. Returns `None` when either token is missing
/// or the status code is not a number.
#[must_use]
pub fn parse_status_line(line: &[u8]) -> Option<StatusLine> {
    let line = String::from_utf8_lossy(line);
    let mut tokens = line.split_ascii_whitespace();
    let version = tokens.next()?.to_string();
    let status = tokens.next()?.parse().ok()?;
    Some(StatusLine { version, status })
}

/// Whether `line` ends the response head (empty, or only a line terminator).
#[must_use]
pub fn is_head_terminator(line: &[u8]) -> bool {
    matches!(line, b"" | b"\n" | b"\r\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Name,
    SkipSpace,
    Value,
}

/// Scans one header line into a name/value pair.
///
/// The name runs up to the first colon. Spaces right after the colon are
/// skipped; the value starts at the first other byte and runs to the end of
/// the line, colons included. Control bytes are dropped from both parts, which
/// also strips the line terminator. Lines that yield an empty name or an empty
/// value produce no pair.
///
/// # Examples
///
/// ```
/// use rangeget::download::{Header, parse_header_line};
///
/// assert_eq!(
///     parse_header_line(b"Content-Type: text/html\r\n"),
///     Some(Header::new("Content-Type", "text/html"))
/// );
/// assert_eq!(parse_header_line(b"X-Empty:\r\n"), None);
/// assert_eq!(parse_header_line(b"no colon here\r\n"), None);
/// ```
#[must_use]
pub fn parse_header_line(line: &[u8]) -> Option<Header> {
    let mut state = ScanState::Name;
    let mut name = Vec::new();
    let mut value = Vec::new();

    for &byte in line {
        match state {
            ScanState::Name if byte == b':' => state = ScanState::SkipSpace,
            ScanState::Name => push_printable(&mut name, byte),
            ScanState::SkipSpace if byte == b' ' => {}
            ScanState::SkipSpace | ScanState::Value => {
                state = ScanState::Value;
                push_printable(&mut value, byte);
            }
        }
    }

    if name.is_empty() || value.is_empty() {
        return None;
    }

    Some(Header {
        name: String::from_utf8_lossy(&name).into_owned(),
        value: String::from_utf8_lossy(&value).into_owned(),
    })
}

fn push_printable(buf: &mut Vec<u8>, byte: u8) {
    if byte >= 0x20 {
        buf.push(byte);
    }
}
