//! HEIC transcoding to baseline JPEG.
//!
//! With the `heic` feature the system libheif decodes the primary image.
//! libheif applies the container's rotation and mirror boxes while decoding,
//! so the JPEG it produces is already upright and carries no orientation
//! tag. Without the feature every HEIC source fails with a decode error and
//! the rest of the run is unaffected.

use crate::error::SourceError;
use crate::pipeline::decode::HeicTranscoder;
use std::sync::Arc;

/// The transcoder a default [`crate::pipeline::decode::Decoders`] uses.
pub fn default_transcoder() -> Arc<dyn HeicTranscoder> {
    #[cfg(feature = "heic")]
    {
        Arc::new(LibheifTranscoder)
    }
    #[cfg(not(feature = "heic"))]
    {
        Arc::new(UnavailableHeicTranscoder)
    }
}

/// Stand-in used when the crate is built without libheif.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableHeicTranscoder;

impl HeicTranscoder for UnavailableHeicTranscoder {
    fn transcode(&self, name: &str, _bytes: &[u8], _quality: u8) -> Result<Vec<u8>, SourceError> {
        Err(SourceError::decode(
            name,
            "HEIC support is not compiled in (enable the `heic` feature)",
        ))
    }
}

#[cfg(feature = "heic")]
pub use libheif_impl::LibheifTranscoder;

#[cfg(feature = "heic")]
mod libheif_impl {
    use crate::error::SourceError;
    use crate::pipeline::decode::HeicTranscoder;
    use image::codecs::jpeg::JpegEncoder;
    use image::RgbImage;
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};
    use tracing::debug;

    /// libheif-backed [`HeicTranscoder`].
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LibheifTranscoder;

    impl HeicTranscoder for LibheifTranscoder {
        fn transcode(&self, name: &str, bytes: &[u8], quality: u8) -> Result<Vec<u8>, SourceError> {
            let lib = LibHeif::new();
            let ctx = HeifContext::read_from_bytes(bytes).map_err(|e| SourceError::decode(name, e))?;
            let handle = ctx
                .primary_image_handle()
                .map_err(|e| SourceError::decode(name, e))?;
            let decoded = lib
                .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
                .map_err(|e| SourceError::decode(name, e))?;

            let planes = decoded.planes();
            let plane = planes
                .interleaved
                .ok_or_else(|| SourceError::decode(name, "decoded image has no RGB plane"))?;

            let (width, height) = (plane.width, plane.height);
            let row_len = width as usize * 3;
            let mut pixels = Vec::with_capacity(row_len * height as usize);
            for row in plane.data.chunks(plane.stride).take(height as usize) {
                pixels.extend_from_slice(&row[..row_len]);
            }
            let rgb = RgbImage::from_raw(width, height, pixels)
                .ok_or_else(|| SourceError::decode(name, "RGB plane is shorter than its size"))?;

            let mut out = Vec::new();
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
                .map_err(|e| SourceError::encode(name, e))?;
            debug!(name, width, height, bytes = out.len(), "Transcoded HEIC");
            Ok(out)
        }
    }
}
