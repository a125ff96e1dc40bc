//! Thumbnail generation from an encoded full-size page.

use crate::config::Quality;
use crate::error::SourceError;
use crate::pipeline::normalize::{encode_page, EncodedPage};
use crate::pipeline::surface::DrawTransform;
use tracing::debug;

/// Proportional preview size, never wider than `max_width` and never larger
/// than the page itself.
pub fn thumbnail_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    let scale = if width == 0 {
        1.0
    } else {
        (max_width as f64 / width as f64).min(1.0)
    };
    let w = (width as f64 * scale).round().max(1.0) as u32;
    let h = (height as f64 * scale).round().max(1.0) as u32;
    (w, h)
}

/// Decode `full` and redraw it as a thumbnail JPEG.
///
/// `width` and `height` are the full page's dimensions, which the caller
/// already knows from normalisation.
pub fn generate_thumbnail(
    name: &str,
    full: &[u8],
    width: u32,
    height: u32,
    max_width: u32,
    quality: Quality,
) -> Result<EncodedPage, SourceError> {
    let image = image::load_from_memory(full).map_err(|e| SourceError::decode(name, e))?;
    let (tw, th) = thumbnail_dimensions(width, height, max_width);
    debug!(name, thumb = %format!("{tw}x{th}"), "Generating thumbnail");
    encode_page(name, &image, DrawTransform::default(), tw, th, quality)
}
