//! Format sniffing: decide what the payload really is.
//!
//! Precedence, each step short-circuiting:
//!
//! 1. HTTP `Content-Type` (remote only), substring match.
//! 2. URL file extension (remote only). Anything outside png/jpeg/jpg/svg
//!    is rejected here; a remote source never reaches the byte inspection.
//! 3. Data-URI subtype (inline only). A subtype outside png/jpeg/svg is
//!    only a label; the bytes go on to step 4.
//! 4. Magic numbers in the decoded bytes.
//! 5. Vector fallback: unrecognised inline bytes are treated as SVG.
//!
//! Step 5 is lenient on purpose. Many CAPTCHA endpoints emit SVG markup with
//! leading whitespace, a BOM or a comment before `<svg`, none of which a
//! prefix check recognises. If the bytes are not SVG after all, the
//! rasterizer reports it as a render error.

use crate::error::OcrError;
use crate::pipeline::fetch::{FormatHint, RawPayload};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

const PNG_MAGIC: &[u8] = b"\x89PNG";
const JPEG_MAGIC: &[u8] = b"\xff\xd8";

/// Concrete image encoding of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Png,
    Jpeg,
    /// SVG markup; `svg` and `svg+xml` both land here.
    Svg,
}

impl ImageFormat {
    pub fn is_vector(self) -> bool {
        matches!(self, ImageFormat::Svg)
    }

    /// Map a format token (extension or MIME subtype) to a format.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
            "svg" | "svg+xml" => Some(ImageFormat::Svg),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Png => f.write_str("png"),
            ImageFormat::Jpeg => f.write_str("jpeg"),
            ImageFormat::Svg => f.write_str("svg"),
        }
    }
}

/// Determine the format of a payload.
///
/// Only remote URLs with an unknown content type and extension produce an
/// error. Inline payloads always resolve to some format.
pub fn sniff(payload: &RawPayload) -> Result<ImageFormat, OcrError> {
    match &payload.hint {
        FormatHint::Remote { url, content_type } => {
            if let Some(format) = content_type.as_deref().and_then(from_content_type) {
                debug!("Format {} from Content-Type", format);
                return Ok(format);
            }
            let ext = url_extension(url);
            ImageFormat::from_token(&ext)
                .inspect(|format| debug!("Format {} from URL extension", format))
                .ok_or(OcrError::UnsupportedFormat { format: ext })
        }
        FormatHint::DataUri { subtype } => match ImageFormat::from_token(subtype) {
            Some(format) => {
                debug!("Format {} from data-URI subtype", format);
                Ok(format)
            }
            None => {
                debug!("Data-URI subtype '{}' not handled; inspecting bytes", subtype);
                Ok(from_magic(&payload.bytes))
            }
        },
        FormatHint::None => Ok(from_magic(&payload.bytes)),
    }
}

/// Substring match on a lower-cased `Content-Type` value.
///
/// `svg` wins over `png`, so `image/svg+xml` never matches as anything else.
pub fn from_content_type(content_type: &str) -> Option<ImageFormat> {
    let ct = content_type.to_lowercase();
    if ct.contains("svg") {
        Some(ImageFormat::Svg)
    } else if ct.contains("png") {
        Some(ImageFormat::Png)
    } else if ct.contains("jpeg") || ct.contains("jpg") {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Inspect leading bytes; falls back to SVG.
pub fn from_magic(bytes: &[u8]) -> ImageFormat {
    debug!(
        "Decoded data starts with: {}",
        hex::encode(&bytes[..bytes.len().min(10)])
    );

    if bytes.starts_with(PNG_MAGIC) {
        ImageFormat::Png
    } else if bytes.starts_with(JPEG_MAGIC) {
        ImageFormat::Jpeg
    } else if bytes.starts_with(b"<?xml") || bytes.starts_with(b"<svg") {
        ImageFormat::Svg
    } else {
        warn!("Decoded data does not match a known image signature; assuming SVG");
        ImageFormat::Svg
    }
}

/// Lower-cased extension of the URL's last path segment, or `""`.
///
/// Query string and fragment are ignored, so `a.png?v=2` is `png`.
fn url_extension(url: &str) -> String {
    let path = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    path.rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(url: &str, content_type: Option<&str>) -> RawPayload {
        RawPayload {
            bytes: b"irrelevant".to_vec(),
            hint: FormatHint::Remote {
                url: url.into(),
                content_type: content_type.map(Into::into),
            },
        }
    }

    fn inline(bytes: &[u8]) -> RawPayload {
        RawPayload {
            bytes: bytes.to_vec(),
            hint: FormatHint::None,
        }
    }

    #[test]
    fn content_type_wins_over_extension() {
        let p = remote("https://example.com/a.png", Some("image/svg+xml"));
        assert_eq!(sniff(&p).unwrap(), ImageFormat::Svg);
        let p = remote("https://example.com/a.svg", Some("image/jpeg; charset=binary"));
        assert_eq!(sniff(&p).unwrap(), ImageFormat::Jpeg);
        let p = remote("https://example.com/captcha", Some("image/jpg"));
        assert_eq!(sniff(&p).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn extension_fallback() {
        let p = remote("https://example.com/img/a.PNG?v=2", None);
        assert_eq!(sniff(&p).unwrap(), ImageFormat::Png);
        let p = remote("https://example.com/a.jpg", Some("application/octet-stream"));
        assert_eq!(sniff(&p).unwrap(), ImageFormat::Jpeg);
        let p = remote("https://example.com/a.svg#frag", None);
        assert_eq!(sniff(&p).unwrap(), ImageFormat::Svg);
    }

    #[test]
    fn unsupported_remote_format() {
        let p = remote("https://example.com/anim.gif", Some("image/gif"));
        match sniff(&p).unwrap_err() {
            OcrError::UnsupportedFormat { format } => assert_eq!(format, "gif"),
            other => panic!("unexpected {other:?}"),
        }
        let p = remote("https://example.com/captcha", None);
        assert!(matches!(
            sniff(&p).unwrap_err(),
            OcrError::UnsupportedFormat { .. }
        ));
    }

    #[test]
    fn data_uri_subtypes() {
        for (subtype, expected) in [
            ("png", ImageFormat::Png),
            ("jpeg", ImageFormat::Jpeg),
            ("jpg", ImageFormat::Jpeg),
            ("svg+xml", ImageFormat::Svg),
            ("svg", ImageFormat::Svg),
        ] {
            let p = RawPayload {
                bytes: vec![],
                hint: FormatHint::DataUri {
                    subtype: subtype.into(),
                },
            };
            assert_eq!(sniff(&p).unwrap(), expected, "subtype {subtype}");
        }
    }

    #[test]
    fn unknown_data_uri_subtype_inspects_bytes() {
        let labelled = |subtype: &str, bytes: &[u8]| RawPayload {
            bytes: bytes.to_vec(),
            hint: FormatHint::DataUri {
                subtype: subtype.into(),
            },
        };
        for subtype in ["gif", "webp", "bmp"] {
            let p = labelled(subtype, b"\x89PNG\r\n\x1a\n\0\0");
            assert_eq!(sniff(&p).unwrap(), ImageFormat::Png, "subtype {subtype}");
        }
        assert_eq!(
            sniff(&labelled("gif", b"\xff\xd8\xff\xe0")).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(sniff(&labelled("gif", b"GIF89a")).unwrap(), ImageFormat::Svg);
    }

    #[test]
    fn magic_numbers() {
        assert_eq!(
            sniff(&inline(b"\x89PNG\r\n\x1a\n\0\0")).unwrap(),
            ImageFormat::Png
        );
        assert_eq!(sniff(&inline(b"\xff\xd8\xff\xe0")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(
            sniff(&inline(b"<?xml version=\"1.0\"?><svg/>")).unwrap(),
            ImageFormat::Svg
        );
        assert_eq!(sniff(&inline(b"<svg></svg>")).unwrap(), ImageFormat::Svg);
    }

    #[test]
    fn unknown_bytes_fall_back_to_svg() {
        assert_eq!(sniff(&inline(b"GIF89a")).unwrap(), ImageFormat::Svg);
        assert_eq!(sniff(&inline(b"")).unwrap(), ImageFormat::Svg);
        assert_eq!(sniff(&inline(b"  <svg/>")).unwrap(), ImageFormat::Svg);
    }

    #[test]
    fn extension_parsing() {
        assert_eq!(url_extension("https://example.com/a/b.JPEG"), "jpeg");
        assert_eq!(url_extension("https://example.com/"), "");
        assert_eq!(url_extension("https://example.com/dir.v2/file"), "");
    }
}
