//! Pipeline stages for image-to-text recognition.
//!
//! Each submodule implements exactly one transformation step and returns a
//! `Result`; [`crate::ocr::ImageOcr`] sequences them.
//!
//! ## Data Flow
//!
//! ```text
//! classify ──▶ fetch ──▶ sniff ──▶ rasterize ──▶ recognize
//! (URL?)       (bytes)   (format)  (pixels)      (text)
//! ```
//!
//! 1. [`classify`] : structural URL test, no network
//! 2. [`fetch`]    : one bounded GET, or percent/data-URI/base64 decoding
//! 3. [`sniff`]    : content type, extension, data-URI subtype, magic bytes
//! 4. [`rasterize`]: resvg for SVG, `image` for PNG/JPEG
//! 5. [`recognize`]: the engine seam; [`llm`] and [`encode`] implement the
//!    default vision-LLM engine behind it

pub mod classify;
pub mod encode;
pub mod fetch;
pub mod llm;
pub mod rasterize;
pub mod recognize;
pub mod sniff;
