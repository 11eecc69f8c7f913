//! Error types for the img2text library.
//!
//! Every failure is fatal: the pipeline runs exactly one image per call and
//! no stage recovers from an earlier stage's error. [`OcrError`] carries the
//! detail a human needs to fix the input; [`ErrorKind`] collapses the
//! variants into the six categories callers actually branch on.
//!
//! The binary does not distinguish kinds in its exit code: every error is
//! one diagnostic line and exit status 1. Library callers and tests
//! can match on [`OcrError::kind`].

use serde::Serialize;
use thiserror::Error;

/// Error category for an [`OcrError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or empty input argument.
    Input,
    /// Remote fetch failed (timeout, connection, non-success status).
    Network,
    /// The declared or inferred format is outside PNG / JPEG / SVG.
    UnsupportedFormat,
    /// base64, data-URI or image byte decoding failed.
    Decode,
    /// SVG → raster conversion failed or produced nothing.
    Render,
    /// The recognition engine failed or could not be set up.
    Recognition,
    /// Configuration or runtime plumbing.
    Internal,
}

/// All errors returned by the img2text library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Argument was empty or whitespace only.
    #[error("No input provided.\nUsage: img2text <BASE64_STRING_OR_URL>")]
    EmptyInput,

    // ── Network errors ────────────────────────────────────────────────────
    /// Connection, DNS or body-read failure.
    #[error("Failed to fetch '{url}': {reason}\nCheck the URL and your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Fetching '{url}' timed out after {secs}s\nIncrease --timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// Server answered with a non-2xx status.
    #[error("Failed to fetch '{url}': HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // ── Format errors ─────────────────────────────────────────────────────
    #[error("Unsupported image format: '{format}'\nSupported formats: png, jpeg, svg.")]
    UnsupportedFormat { format: String },

    // ── Decode errors ─────────────────────────────────────────────────────
    /// Strict base64 decoding rejected the payload.
    #[error("Invalid base64 string: {detail}")]
    InvalidBase64 { detail: String },

    /// Input starts with `data:image/` but is not a base64 data URI.
    #[error("Malformed data URI: {detail}\nExpected data:image/<subtype>;base64,<payload>")]
    MalformedDataUri { detail: String },

    /// The raster codec could not read the bytes.
    #[error("Failed to decode {format} image: {detail}")]
    ImageDecodeFailed { format: String, detail: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// usvg/resvg rejected the markup or the canvas could not be created.
    #[error("SVG rendering failed: {detail}")]
    SvgRenderFailed { detail: String },

    /// Rendering succeeded but produced zero bytes.
    #[error("SVG conversion produced empty PNG data")]
    EmptyRender,

    // ── Recognition errors ────────────────────────────────────────────────
    /// The engine returned an error (or panicked) during classification.
    #[error("OCR engine '{engine}' failed: {detail}")]
    RecognitionFailed { engine: String, detail: String },

    /// The vision provider could not be built (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config / plumbing ─────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OcrError::EmptyInput => ErrorKind::Input,
            OcrError::DownloadFailed { .. }
            | OcrError::DownloadTimeout { .. }
            | OcrError::HttpStatus { .. } => ErrorKind::Network,
            OcrError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            OcrError::InvalidBase64 { .. }
            | OcrError::MalformedDataUri { .. }
            | OcrError::ImageDecodeFailed { .. } => ErrorKind::Decode,
            OcrError::SvgRenderFailed { .. } | OcrError::EmptyRender => ErrorKind::Render,
            OcrError::RecognitionFailed { .. } | OcrError::ProviderNotConfigured { .. } => {
                ErrorKind::Recognition
            }
            OcrError::InvalidConfig(_) | OcrError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display() {
        let e = OcrError::HttpStatus {
            url: "https://example.com/a.png".into(),
            status: 404,
        };
        let msg = e.to_string();
        assert!(msg.contains("404"), "got: {msg}");
        assert!(msg.contains("example.com"));
        assert_eq!(e.kind(), ErrorKind::Network);
    }

    #[test]
    fn timeout_display() {
        let e = OcrError::DownloadTimeout {
            url: "https://example.com/a.png".into(),
            secs: 10,
        };
        assert!(e.to_string().contains("10s"));
        assert_eq!(e.kind(), ErrorKind::Network);
    }

    #[test]
    fn unsupported_format_display() {
        let e = OcrError::UnsupportedFormat {
            format: "gif".into(),
        };
        assert!(e.to_string().contains("'gif'"));
        assert_eq!(e.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn decode_and_render_kinds_are_distinct() {
        let decode = OcrError::ImageDecodeFailed {
            format: "png".into(),
            detail: "truncated".into(),
        };
        assert_eq!(decode.kind(), ErrorKind::Decode);
        assert_eq!(OcrError::EmptyRender.kind(), ErrorKind::Render);
        assert_ne!(decode.kind(), OcrError::EmptyRender.kind());
    }

    #[test]
    fn recognition_kind() {
        let e = OcrError::RecognitionFailed {
            engine: "stub".into(),
            detail: "boom".into(),
        };
        assert!(e.to_string().contains("stub"));
        assert!(e.to_string().contains("boom"));
        assert_eq!(e.kind(), ErrorKind::Recognition);
    }

    #[test]
    fn empty_input_is_input_kind() {
        assert_eq!(OcrError::EmptyInput.kind(), ErrorKind::Input);
        assert!(OcrError::EmptyInput.to_string().contains("Usage"));
    }
}
