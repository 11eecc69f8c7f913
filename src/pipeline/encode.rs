//! Image encoding: `DynamicImage` → base64 PNG wrapped in `ImageData`.
//!
//! Only the vision recognizer needs this; VLM APIs take images as base64
//! data embedded in the JSON request body. PNG keeps glyph edges lossless,
//! which matters more than size for a handful of distorted characters.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::imageops::FilterType;
use image::DynamicImage;
use std::borrow::Cow;
use std::io::Cursor;
use tracing::debug;

/// Shortest side, in pixels, an image is sent to the model at.
///
/// A 120x40 CAPTCHA is smaller than one provider tile; strokes a pixel or
/// two wide get lost when the provider resamples it.
pub const MIN_SHORT_SIDE: u32 = 128;

/// Largest integer factor applied when upscaling.
const MAX_UPSCALE: u32 = 8;

/// Encode a rasterised image as a base64 PNG for the vision call.
///
/// Images whose short side is under [`MIN_SHORT_SIDE`] are enlarged by an
/// integer factor with nearest-neighbour sampling, so every source pixel
/// becomes a solid block and no new colours appear.
pub fn encode_image(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let img = upscale_small(img);

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} bytes PNG",
        img.width(),
        img.height(),
        png.len()
    );

    Ok(ImageData::new(STANDARD.encode(&png), "image/png").with_detail("high"))
}

fn upscale_small(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    let short = img.width().min(img.height());
    if short == 0 || short >= MIN_SHORT_SIDE {
        return Cow::Borrowed(img);
    }
    let factor = MIN_SHORT_SIDE.div_ceil(short).min(MAX_UPSCALE);
    Cow::Owned(img.resize_exact(
        img.width() * factor,
        img.height() * factor,
        FilterType::Nearest,
    ))
}
