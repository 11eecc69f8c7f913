//! OCR invocation: hand the pixel grid to the recognition engine.
//!
//! The engine is a black box behind the [`Recognizer`] trait. The pipeline
//! calls it exactly once per image and takes whatever string it returns;
//! there is no retry and no confidence threshold. An error *or a panic*
//! inside the engine surfaces as [`OcrError::RecognitionFailed`], so a buggy
//! engine cannot take the process down without the usual diagnostic line.

use crate::error::OcrError;
use async_trait::async_trait;
use futures::FutureExt;
use image::DynamicImage;
use std::panic::AssertUnwindSafe;
use tracing::{debug, info};

/// Error type engines return. Anything displayable will do.
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

/// A text-recognition engine.
///
/// Implementations: [`crate::pipeline::llm::VisionRecognizer`] (vision LLM),
/// or any test stub.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Read the text in `image`.
    async fn recognize(&self, image: &DynamicImage) -> Result<String, EngineError>;

    /// Short engine name for logs and error messages.
    fn name(&self) -> &str;
}

/// Run the engine once on `image`.
pub async fn recognize(engine: &dyn Recognizer, image: &DynamicImage) -> Result<String, OcrError> {
    info!(
        "Running OCR engine '{}' on {}x{} image",
        engine.name(),
        image.width(),
        image.height()
    );

    let outcome = AssertUnwindSafe(engine.recognize(image))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(text)) => {
            debug!("Engine '{}' returned {} chars", engine.name(), text.len());
            Ok(text)
        }
        Ok(Err(e)) => Err(OcrError::RecognitionFailed {
            engine: engine.name().to_string(),
            detail: e.to_string(),
        }),
        Err(panic) => Err(OcrError::RecognitionFailed {
            engine: engine.name().to_string(),
            detail: panic_message(panic.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("engine panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("engine panicked: {s}")
    } else {
        "engine panicked".to_string()
    }
}
