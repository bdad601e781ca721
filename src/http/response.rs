//! HTTP response parsing
//!
//! Responses are read until the server closes the connection, then split
//! at the first blank line into header block and body.

use std::collections::HashMap;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// A parsed HTTP response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// Second token of the status line, e.g. `"200"`
    pub status_code: String,
    /// Header fields keyed by lowercased name
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    /// The status code as a number, if it is one
    pub fn status(&self) -> Option<u16> {
        self.status_code.parse().ok()
    }

    /// Returns true for any 2xx status code
    pub fn is_success(&self) -> bool {
        self.status_code.len() == 3 && self.status_code.starts_with('2')
    }

    /// Returns true for 301 and 302
    pub fn is_redirect(&self) -> bool {
        matches!(self.status(), Some(301) | Some(302))
    }

    /// Looks up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }
}

/// Parses the raw bytes of a complete response
///
/// Without a `\r\n\r\n` terminator the whole input is treated as header
/// block and the body is empty.
pub fn parse_response(raw: &[u8]) -> HttpResponse {
    let (head, body) = match find_terminator(raw) {
        Some(index) => (&raw[..index], &raw[index + HEADER_TERMINATOR.len()..]),
        None => (raw, &raw[raw.len()..]),
    };

    let head = String::from_utf8_lossy(head);
    let (status_code, headers) = parse_head(&head);

    HttpResponse {
        status_code,
        headers,
        body: String::from_utf8_lossy(body).into_owned(),
    }
}

fn find_terminator(raw: &[u8]) -> Option<usize> {
    raw.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

/// Parses the status line and header fields
///
/// Lines without a colon, with an empty name or with an empty value are
/// skipped. A repeated header keeps its last value.
fn parse_head(head: &str) -> (String, HashMap<String, String>) {
    let mut lines = head.split("\r\n");

    let status_code = lines
        .next()
        .and_then(|status_line| status_line.split(' ').nth(1))
        .unwrap_or_default()
        .to_string();

    let mut headers = HashMap::new();
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        let name = name.trim();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }

        headers.insert(name.to_ascii_lowercase(), value.to_string());
    }

    (status_code, headers)
}
