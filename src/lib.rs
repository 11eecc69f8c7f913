//! # img2text
//!
//! Read the text in a single image, typically a CAPTCHA, given either a
//! URL or the image itself as an inline base64 string.
//!
//! ## Pipeline Overview
//!
//! ```text
//! argument
//!  │
//!  ├─ 1. Classify   URL-shaped? (pattern match, no network)
//!  ├─ 2. Fetch      one GET with timeout  │  percent-decode → data URI → base64
//!  ├─ 3. Sniff      Content-Type → extension │ data-URI subtype → magic bytes → SVG
//!  ├─ 4. Rasterize  SVG via resvg, PNG/JPEG via image
//!  └─ 5. Recognize  pluggable engine (default: vision LLM)
//! ```
//!
//! Every stage fails fast with an [`OcrError`]; nothing is retried.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2text::{recognize_input, OcrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = OcrConfig::default();
//!     let prediction = recognize_input("data:image/png;base64,iVBORw0KGgo...", &config).await?;
//!     println!("{}", prediction.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Bringing your own engine
//!
//! Implement [`Recognizer`] and pass it to [`ImageOcr::new`]; the pipeline
//! never reaches for a global engine.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2text` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrConfig, OcrConfigBuilder, RasterConfig};
pub use error::{ErrorKind, OcrError};
pub use ocr::{recognize_input, recognize_sync, ImageOcr, Stage};
pub use output::{Prediction, PredictionStats};
pub use pipeline::classify::SourceKind;
pub use pipeline::fetch::{FormatHint, RawPayload};
pub use pipeline::llm::VisionRecognizer;
pub use pipeline::recognize::{EngineError, Recognizer};
pub use pipeline::sniff::ImageFormat;
