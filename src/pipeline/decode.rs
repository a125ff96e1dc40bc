//! Decoder capabilities selected by the format classifier.
//!
//! Each classified [`SourceKind`] maps to exactly one capability:
//!
//! | Kind | Capability | Production implementation |
//! |---|---|---|
//! | `Raster` | [`RasterDecoder`] | [`ImageRasterDecoder`] (`image` crate) |
//! | `Heic` | [`HeicTranscoder`] | [`crate::pipeline::heic::default_transcoder`] |
//! | `Document` | [`DocumentDecoder`] | [`crate::pipeline::render::PdfiumDocumentDecoder`] |
//!
//! The traits exist so tests (and embedders with their own codecs) can swap
//! an implementation without touching the orchestrator.

use crate::error::SourceError;
use crate::pipeline::classify::SourceKind;
use crate::pipeline::heic;
use crate::pipeline::render::PdfiumDocumentDecoder;
use image::DynamicImage;
use std::sync::Arc;

/// Decodes a baseline raster format (JPEG, PNG, WebP) into a bitmap.
pub trait RasterDecoder: Send + Sync {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<DynamicImage, SourceError>;
}

/// Converts HEIC bytes into an equivalent baseline raster encoding.
pub trait HeicTranscoder: Send + Sync {
    /// Returns JPEG bytes encoded at `quality` (1–100).
    fn transcode(&self, name: &str, bytes: &[u8], quality: u8) -> Result<Vec<u8>, SourceError>;
}

/// Natural size of a document page, in document units (PDF points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageViewport {
    pub width: f32,
    pub height: f32,
}

/// Renders every page of a paged document.
pub trait DocumentDecoder: Send + Sync {
    /// Render all pages in document order.
    ///
    /// `size_for` receives each page's natural viewport and returns the pixel
    /// size the page must be rendered at. Any failure to open or render must
    /// fail the whole call: partial page lists are never returned.
    fn render_pages(
        &self,
        name: &str,
        bytes: &[u8],
        password: Option<&str>,
        size_for: &dyn Fn(PageViewport) -> (u32, u32),
    ) -> Result<Vec<DynamicImage>, SourceError>;
}

/// The `image`-crate decoder for JPEG, PNG and WebP.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRasterDecoder;

impl RasterDecoder for ImageRasterDecoder {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<DynamicImage, SourceError> {
        image::load_from_memory(bytes).map_err(|e| SourceError::decode(name, e))
    }
}

/// The set of decoder implementations used by one run.
#[derive(Clone)]
pub struct Decoders {
    pub raster: Arc<dyn RasterDecoder>,
    pub heic: Arc<dyn HeicTranscoder>,
    pub document: Arc<dyn DocumentDecoder>,
}

impl Default for Decoders {
    fn default() -> Self {
        Self {
            raster: Arc::new(ImageRasterDecoder),
            heic: heic::default_transcoder(),
            document: Arc::new(PdfiumDocumentDecoder),
        }
    }
}

impl Decoders {
    pub fn with_raster(mut self, decoder: Arc<dyn RasterDecoder>) -> Self {
        self.raster = decoder;
        self
    }

    pub fn with_heic(mut self, transcoder: Arc<dyn HeicTranscoder>) -> Self {
        self.heic = transcoder;
        self
    }

    pub fn with_document(mut self, decoder: Arc<dyn DocumentDecoder>) -> Self {
        self.document = decoder;
        self
    }

    /// Pick the capability that handles `kind`.
    pub fn select(&self, kind: SourceKind) -> Decoder<'_> {
        match kind {
            SourceKind::Raster => Decoder::Raster(self.raster.as_ref()),
            SourceKind::Heic => Decoder::Heic(self.heic.as_ref()),
            SourceKind::Document => Decoder::Document(self.document.as_ref()),
        }
    }
}

/// A decoder capability chosen for one classified source.
pub enum Decoder<'a> {
    Raster(&'a dyn RasterDecoder),
    Heic(&'a dyn HeicTranscoder),
    Document(&'a dyn DocumentDecoder),
}
