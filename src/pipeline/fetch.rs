//! Source fetching: turn the classified argument into raw bytes.
//!
//! Remote references get exactly one GET bounded by a timeout; inline
//! payloads are percent-decoded, stripped of an optional data-URI prefix and
//! strictly base64-decoded. Either way the result is a [`RawPayload`]: the
//! bytes plus whatever the source *claimed* the format to be. The claim is
//! only a hint; [`crate::pipeline::sniff`] decides.

use crate::error::OcrError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info};

/// `data:image/<subtype>;base64,`. The subtype may contain `+` (`svg+xml`).
static DATA_URI_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:image/([a-zA-Z+]+);base64,").expect("data-URI pattern is a valid regex")
});

const PREVIEW_CHARS: usize = 50;

/// What the source declared about the payload's format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatHint {
    /// Fetched over HTTP. The URL is kept for the file-extension fallback.
    Remote {
        url: String,
        content_type: Option<String>,
    },
    /// Inline data URI; the lower-cased subtype, e.g. `png`, `svg+xml`.
    DataUri { subtype: String },
    /// Bare base64, nothing declared.
    None,
}

/// Raw image bytes and the format the source declared for them.
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub bytes: Vec<u8>,
    pub hint: FormatHint,
}

/// Fetch a remote image with a single GET.
///
/// A scheme-less reference (`example.com/a.png`) is requested over plain
/// HTTP. Any non-2xx status, transport failure or timeout is returned as a
/// network error; there is no retry.
pub async fn fetch_remote(url: &str, timeout_secs: u64) -> Result<RawPayload, OcrError> {
    let request_url = with_scheme(url);
    info!("Fetching image from: {}", request_url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| OcrError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let transport_err = |e: reqwest::Error| {
        if e.is_timeout() {
            OcrError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            OcrError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client
        .get(request_url.as_str())
        .send()
        .await
        .map_err(transport_err)?;

    if !response.status().is_success() {
        return Err(OcrError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_lowercase())
        .filter(|v| !v.is_empty());
    debug!("Content-Type: {:?}", content_type);

    let bytes = response.bytes().await.map_err(transport_err)?;
    info!("Fetched {} bytes", bytes.len());

    Ok(RawPayload {
        bytes: bytes.to_vec(),
        hint: FormatHint::Remote {
            url: request_url,
            content_type,
        },
    })
}

/// Decode an inline payload: percent-decoding, optional data-URI prefix,
/// then strict base64.
pub fn decode_inline(input: &str) -> Result<RawPayload, OcrError> {
    let unquoted = urlencoding::decode(input).map_err(|e| OcrError::InvalidBase64 {
        detail: format!("percent-decoded input is not valid UTF-8: {e}"),
    })?;
    debug!("URL-decoded input (first {PREVIEW_CHARS} chars): {}", preview(&unquoted));

    let (encoded, hint) = split_data_uri(&unquoted)?;
    if let FormatHint::DataUri { ref subtype } = hint {
        debug!("Data URI declares image/{}", subtype);
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| OcrError::InvalidBase64 {
            detail: e.to_string(),
        })?;
    debug!("Decoded data length: {} bytes", bytes.len());

    Ok(RawPayload { bytes, hint })
}

/// Split `data:image/<subtype>;base64,<payload>` into payload and hint.
///
/// Strings without the `data:image/` prefix are returned whole.
fn split_data_uri(input: &str) -> Result<(&str, FormatHint), OcrError> {
    if !input.starts_with("data:image/") {
        return Ok((input, FormatHint::None));
    }

    let caps = DATA_URI_PREFIX
        .captures(input)
        .ok_or_else(|| OcrError::MalformedDataUri {
            detail: format!("'{}' is not a base64 image data URI", preview(input)),
        })?;
    let subtype = caps[1].to_lowercase();

    // The regex guarantees a comma; split on the first one.
    let payload = input
        .split_once(',')
        .map(|(_, rest)| rest)
        .unwrap_or_default();

    Ok((payload, FormatHint::DataUri { subtype }))
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// First few characters of a possibly huge payload, for log lines.
pub(crate) fn preview(s: &str) -> &str {
    match s.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
