//! Pipeline orchestration: argument in, prediction out.
//!
//! ```text
//! Start ─▶ Classified ─▶ Fetched ─▶ FormatKnown ─▶ Rasterized ─▶ Predicted
//!   │          │            │            │              │
//!   └──────────┴────────────┴────────────┴──────────────┴──▶ Failed (Err)
//! ```
//!
//! Strictly linear: each stage consumes the previous stage's output and
//! nothing is revisited. A failing stage returns its [`OcrError`] and the
//! run stops there. Terminating the process is the binary's job, not ours.

use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::output::{Prediction, PredictionStats};
use crate::pipeline::classify::{classify, SourceKind};
use crate::pipeline::fetch::{self, preview, RawPayload};
use crate::pipeline::llm::VisionRecognizer;
use crate::pipeline::rasterize::rasterize;
use crate::pipeline::recognize::{recognize, Recognizer};
use crate::pipeline::sniff::sniff;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Progress marker of a run; logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Classified,
    Fetched,
    FormatKnown,
    Rasterized,
    Predicted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Start => "start",
            Stage::Classified => "classified",
            Stage::Fetched => "fetched",
            Stage::FormatKnown => "format-known",
            Stage::Rasterized => "rasterized",
            Stage::Predicted => "predicted",
        };
        f.write_str(s)
    }
}

/// Image-to-text pipeline bound to one recognition engine.
///
/// # Example
/// ```rust,no_run
/// use img2text::{ImageOcr, OcrConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let ocr = ImageOcr::from_config(OcrConfig::default())?;
/// let prediction = ocr.run("https://example.com/captcha.svg").await?;
/// println!("{}", prediction.text);
/// # Ok(())
/// # }
/// ```
pub struct ImageOcr {
    recognizer: Arc<dyn Recognizer>,
    config: OcrConfig,
}

impl ImageOcr {
    /// Bind the pipeline to an explicit engine.
    pub fn new(recognizer: Arc<dyn Recognizer>, config: OcrConfig) -> Self {
        Self { recognizer, config }
    }

    /// Build the default vision engine from `config` and the environment.
    pub fn from_config(config: OcrConfig) -> Result<Self, OcrError> {
        let recognizer = VisionRecognizer::from_config(&config)?;
        Ok(Self::new(Arc::new(recognizer), config))
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Run the whole pipeline on one argument.
    ///
    /// # Errors
    /// - [`OcrError::EmptyInput`] for an empty or whitespace-only argument,
    ///   before any network or decode work.
    /// - Network, format, decode, render and recognition errors from the
    ///   stage that failed. No later stage runs after a failure.
    pub async fn run(&self, input: &str) -> Result<Prediction, OcrError> {
        let total_start = Instant::now();
        let input = input.trim();
        debug!("Input length: {}", input.len());
        if input.is_empty() {
            return Err(OcrError::EmptyInput);
        }
        debug!("Input (first 50 chars): {}", preview(input));
        advance(Stage::Start);

        // ── Step 1: Classify ─────────────────────────────────────────────
        let source = classify(input);
        info!("Processing as {}", source);
        advance(Stage::Classified);

        // ── Step 2: Fetch / decode ───────────────────────────────────────
        let fetch_start = Instant::now();
        let payload: RawPayload = match source {
            SourceKind::Remote => {
                fetch::fetch_remote(input, self.config.download_timeout_secs).await?
            }
            SourceKind::Inline => fetch::decode_inline(input)?,
        };
        let fetch_ms = fetch_start.elapsed().as_millis() as u64;
        let payload_bytes = payload.bytes.len();
        advance(Stage::Fetched);

        // ── Step 3: Sniff format ─────────────────────────────────────────
        let format = sniff(&payload)?;
        info!("Image format: {}", format);
        advance(Stage::FormatKnown);

        // ── Step 4: Rasterise ────────────────────────────────────────────
        let raster_start = Instant::now();
        let image = rasterize(&payload.bytes, format, &self.config.raster)?;
        drop(payload);
        let raster_ms = raster_start.elapsed().as_millis() as u64;
        let (width, height) = (image.width(), image.height());
        advance(Stage::Rasterized);

        // ── Step 5: Recognise ────────────────────────────────────────────
        let recognize_start = Instant::now();
        let text = recognize(self.recognizer.as_ref(), &image).await?;
        drop(image);
        let recognize_ms = recognize_start.elapsed().as_millis() as u64;
        advance(Stage::Predicted);

        let stats = PredictionStats {
            payload_bytes,
            fetch_ms,
            raster_ms,
            recognize_ms,
            total_ms: total_start.elapsed().as_millis() as u64,
        };
        info!("Prediction complete in {}ms", stats.total_ms);

        Ok(Prediction {
            text,
            source,
            format,
            width,
            height,
            stats,
        })
    }

    /// Synchronous wrapper around [`ImageOcr::run`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from within
    /// an async context.
    pub fn run_sync(&self, input: &str) -> Result<Prediction, OcrError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| OcrError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.run(input))
    }
}

/// Read the text of one image with the default vision engine.
///
/// Convenience for `ImageOcr::from_config(config.clone())?.run(input)`.
pub async fn recognize_input(
    input: impl AsRef<str>,
    config: &OcrConfig,
) -> Result<Prediction, OcrError> {
    ImageOcr::from_config(config.clone())?
        .run(input.as_ref())
        .await
}

/// Blocking variant of [`recognize_input`].
pub fn recognize_sync(
    input: impl AsRef<str>,
    config: &OcrConfig,
) -> Result<Prediction, OcrError> {
    ImageOcr::from_config(config.clone())?.run_sync(input.as_ref())
}

fn advance(stage: Stage) {
    debug!(stage = %stage, "pipeline stage reached");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pipeline::recognize::EngineError;
    use async_trait::async_trait;
    use image::DynamicImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and echoes the image size.
    #[derive(Default)]
    struct Probe {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Recognizer for Probe {
        async fn recognize(&self, image: &DynamicImage) -> Result<String, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}x{}", image.width(), image.height()))
        }
        fn name(&self) -> &str {
            "probe"
        }
    }

    fn pipeline() -> (Arc<Probe>, ImageOcr) {
        let probe = Arc::new(Probe::default());
        let config = OcrConfig::builder().load_system_fonts(false).build().unwrap();
        (probe.clone(), ImageOcr::new(probe, config))
    }

    #[tokio::test]
    async fn empty_input_fails_before_any_stage() {
        let (probe, ocr) = pipeline();
        for input in ["", "   ", "\n\t"] {
            let err = ocr.run(input).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Input);
        }
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bad_base64_stops_before_ocr() {
        let (probe, ocr) = pipeline();
        let err = ocr.run("aGVsbG8").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn svg_data_uri_reaches_predicted() {
        let (probe, ocr) = pipeline();
        // <svg xmlns="http://www.w3.org/2000/svg" width="30" height="10"/>
        let b64 = "PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHdpZHRoPSIzMCIgaGVpZ2h0PSIxMCIvPg==";
        let p = ocr
            .run(&format!("data:image/svg+xml;base64,{b64}"))
            .await
            .unwrap();
        assert_eq!(p.text, "30x10");
        assert_eq!(p.source, SourceKind::Inline);
        assert_eq!((p.width, p.height), (30, 10));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn run_sync_works_outside_runtime() {
        let (_probe, ocr) = pipeline();
        let err = ocr.run_sync("").unwrap_err();
        assert!(matches!(err, OcrError::EmptyInput));
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::FormatKnown.to_string(), "format-known");
        assert_eq!(Stage::Predicted.to_string(), "predicted");
    }
}
