//! Rasterisation: turn payload bytes into a `DynamicImage`.
//!
//! Raster payloads (PNG, JPEG) go straight to the `image` decoder. SVG is
//! rendered with resvg into a PNG byte stream first and that stream is then
//! decoded like any other PNG, so both branches hand the recognizer the same
//! kind of pixel grid.
//!
//! Render failures and decode failures stay distinct errors: a render error
//! means the markup was bad, a decode error after a successful render means
//! the renderer's own output could not be read back.

use crate::config::RasterConfig;
use crate::error::OcrError;
use crate::pipeline::sniff::ImageFormat;
use image::DynamicImage;
use resvg::{tiny_skia, usvg};
use tracing::{debug, info};

/// Largest canvas an SVG may render to, in pixels (64 Mpx, 256 MiB RGBA).
pub const MAX_RENDER_PIXELS: u64 = 64 * 1024 * 1024;

/// Decode (and for SVG, render) payload bytes into a pixel grid.
pub fn rasterize(
    bytes: &[u8],
    format: ImageFormat,
    config: &RasterConfig,
) -> Result<DynamicImage, OcrError> {
    if bytes.is_empty() {
        return Err(OcrError::ImageDecodeFailed {
            format: format.to_string(),
            detail: "no image data provided".into(),
        });
    }

    let image = match format {
        ImageFormat::Svg => {
            let png = render_svg(bytes, config)?;
            decode_raster(&png, ImageFormat::Png)?
        }
        ImageFormat::Png | ImageFormat::Jpeg => decode_raster(bytes, format)?,
    };

    info!(
        "Rasterised {} image → {}x{} px",
        format,
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Render SVG markup to PNG bytes.
pub fn render_svg(svg: &[u8], config: &RasterConfig) -> Result<Vec<u8>, OcrError> {
    let mut options = usvg::Options::default();
    if config.load_system_fonts {
        options.fontdb_mut().load_system_fonts();
    }

    let tree = usvg::Tree::from_data(svg, &options).map_err(|e| OcrError::SvgRenderFailed {
        detail: e.to_string(),
    })?;

    let size = tree.size();
    let (width, height) = canvas_size(size.width(), size.height(), config.svg_scale)?;
    debug!(
        "SVG intrinsic size {}x{}, rendering at {}x{}",
        size.width(),
        size.height(),
        width,
        height
    );

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or_else(|| OcrError::SvgRenderFailed {
            detail: format!("cannot allocate a {width}x{height} canvas"),
        })?;

    if let Some([r, g, b]) = config.svg_background {
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));
    }

    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let png = pixmap.encode_png().map_err(|e| OcrError::SvgRenderFailed {
        detail: e.to_string(),
    })?;
    if png.is_empty() {
        return Err(OcrError::EmptyRender);
    }

    debug!("Rendered SVG → {} bytes PNG", png.len());
    Ok(png)
}

/// Scaled canvas dimensions, refused above [`MAX_RENDER_PIXELS`].
fn canvas_size(width: f32, height: f32, scale: f32) -> Result<(u32, u32), OcrError> {
    let w = (f64::from(width) * f64::from(scale)).ceil();
    let h = (f64::from(height) * f64::from(scale)).ceil();
    if !(w >= 1.0 && h >= 1.0) || w * h > MAX_RENDER_PIXELS as f64 {
        return Err(OcrError::SvgRenderFailed {
            detail: format!(
                "canvas of {w}x{h} px is outside the render budget of {MAX_RENDER_PIXELS} px"
            ),
        });
    }
    Ok((w as u32, h as u32))
}

/// Decode raster bytes. The decoder trusts the bytes, not the label.
fn decode_raster(bytes: &[u8], format: ImageFormat) -> Result<DynamicImage, OcrError> {
    image::load_from_memory(bytes).map_err(|e| OcrError::ImageDecodeFailed {
        format: format.to_string(),
        detail: e.to_string(),
    })
}
