//! Raster normalisation: rotate, cap the width, encode the full-size page.
//!
//! The width cap applies to the post-rotation width and only ever shrinks:
//! a portrait photo shot sideways is measured as it will be displayed, and a
//! small image keeps its natural size.

use crate::config::Quality;
use crate::error::SourceError;
use crate::pipeline::orientation::Rotation;
use crate::pipeline::surface::{DrawTransform, ImageSurface, OutputFormat, RasterSurface};
use image::DynamicImage;
use tracing::debug;

/// Encoded full-size page plus the dimensions of what was encoded.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Post-rotation output size for a `width × height` bitmap.
pub fn compute_normalized_dimensions(
    width: u32,
    height: u32,
    rotation: Rotation,
    max_width: u32,
) -> (u32, u32) {
    let (eff_w, eff_h) = if rotation.swaps_axes() {
        (height, width)
    } else {
        (width, height)
    };
    if eff_w == 0 || eff_h == 0 {
        return (eff_w.max(1), eff_h.max(1));
    }

    let scale = (max_width as f64 / eff_w as f64).min(1.0);
    let out_w = (eff_w as f64 * scale).round().max(1.0) as u32;
    let out_h = (eff_h as f64 * scale).round().max(1.0) as u32;
    (out_w, out_h)
}

/// Draw `image` rotated and width-capped onto a fresh surface and encode it.
pub fn normalize_raster(
    name: &str,
    image: &DynamicImage,
    rotation: Rotation,
    max_width: u32,
    quality: Quality,
) -> Result<EncodedPage, SourceError> {
    let (width, height) =
        compute_normalized_dimensions(image.width(), image.height(), rotation, max_width);
    debug!(
        name,
        natural = %format!("{}x{}", image.width(), image.height()),
        rotation = rotation.degrees(),
        out = %format!("{width}x{height}"),
        "Normalising raster"
    );

    encode_page(name, image, DrawTransform::rotated(rotation), width, height, quality)
}

/// Draw onto a `width × height` surface and encode as JPEG.
pub(crate) fn encode_page(
    name: &str,
    image: &DynamicImage,
    transform: DrawTransform,
    width: u32,
    height: u32,
    quality: Quality,
) -> Result<EncodedPage, SourceError> {
    let mut surface = ImageSurface::create(width, height);
    surface.draw_image(image, transform);
    let bytes = surface
        .encode(OutputFormat::Jpeg, quality)
        .map_err(|e| SourceError::encode(name, e))?;
    let (width, height) = surface.dimensions();
    Ok(EncodedPage {
        bytes,
        width,
        height,
    })
}
