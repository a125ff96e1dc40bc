//! Raster surfaces: the drawing target every artifact is produced on.
//!
//! A surface is created at its final pixel size, has one bitmap drawn into
//! it (rotated and scaled to fill it exactly), and is then encoded. The
//! background is opaque white so transparent PNG/WebP regions flatten the
//! way a browser canvas exported to JPEG would.

use crate::config::Quality;
use crate::pipeline::orientation::Rotation;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, Rgba, RgbaImage};
use std::borrow::Cow;

/// Encodings a surface can be exported as. Pages are always JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
        }
    }
}

/// How a bitmap is placed on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawTransform {
    /// Applied about the bitmap's centre before it is scaled to fill the
    /// surface.
    pub rotation: Rotation,
}

impl DrawTransform {
    pub fn rotated(rotation: Rotation) -> Self {
        Self { rotation }
    }
}

/// A fixed-size 2D drawing target.
pub trait RasterSurface: Sized {
    fn create(width: u32, height: u32) -> Self;

    fn dimensions(&self) -> (u32, u32);

    /// Draw `src` rotated by `transform` and scaled to cover the surface.
    fn draw_image(&mut self, src: &DynamicImage, transform: DrawTransform);

    fn encode(&self, format: OutputFormat, quality: Quality) -> Result<Vec<u8>, ImageError>;
}

/// [`RasterSurface`] backed by an in-memory RGBA buffer from the `image` crate.
pub struct ImageSurface {
    canvas: RgbaImage,
}

impl RasterSurface for ImageSurface {
    fn create(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([255, 255, 255, 255])),
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn draw_image(&mut self, src: &DynamicImage, transform: DrawTransform) {
        let rotated: Cow<'_, DynamicImage> = match transform.rotation {
            Rotation::None => Cow::Borrowed(src),
            Rotation::Clockwise => Cow::Owned(src.rotate90()),
            Rotation::CounterClockwise => Cow::Owned(src.rotate270()),
            Rotation::Half => Cow::Owned(src.rotate180()),
        };

        let (w, h) = self.canvas.dimensions();
        let layer = if rotated.width() == w && rotated.height() == h {
            rotated.to_rgba8()
        } else {
            rotated.resize_exact(w, h, FilterType::Lanczos3).to_rgba8()
        };
        imageops::overlay(&mut self.canvas, &layer, 0, 0);
    }

    fn encode(&self, format: OutputFormat, quality: Quality) -> Result<Vec<u8>, ImageError> {
        let mut buf = Vec::new();
        match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel; the canvas is already opaque.
                let rgb = DynamicImage::ImageRgba8(self.canvas.clone()).to_rgb8();
                rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.value()))?;
            }
        }
        Ok(buf)
    }
}
