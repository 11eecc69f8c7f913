//! Source classification: is the argument a URL or an inline payload?
//!
//! Purely structural. No DNS lookup, no request: a string is `Remote` when
//! it has the shape of a host name (dotted domain with an alphabetic TLD, or
//! `localhost`) optionally preceded by `http://`/`https://` and followed by a
//! port and a path. Everything else, including strings full of `/` and `+`
//! that happen to look path-like, is inline data.
//!
//! base64 has no `.` in its alphabet, so a bare base64 payload can never
//! satisfy the dotted-domain rule. A data URI fails on the `:` after `data`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(https?://)?(([A-Za-z0-9-]+\.)+[A-Za-z]{2,}|localhost)(:[0-9]+)?(/.*)?$",
    )
    .expect("URL pattern is a valid regex")
});

/// Where the image bytes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Fetch over HTTP.
    Remote,
    /// base64 (optionally a data URI, optionally percent-encoded).
    Inline,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Remote => f.write_str("remote"),
            SourceKind::Inline => f.write_str("inline"),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    URL_PATTERN.is_match(input)
}

/// Classify an input argument.
pub fn classify(input: &str) -> SourceKind {
    if is_url(input) {
        SourceKind::Remote
    } else {
        SourceKind::Inline
    }
}
