//! Configuration types for an ingest run.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. The defaults are the output contract a
//! page-flip viewer expects: 1600 px wide JPEG pages at quality 0.9 and
//! 300 px wide JPEG thumbnails at quality 0.7. Change them only when the
//! consuming viewer changes too.
//!
//! A config is cheap to clone (decoders and callbacks are behind `Arc`), and
//! two runs with separate configs share no mutable state.

use crate::error::IngestError;
use crate::pipeline::decode::Decoders;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Full-size pages never exceed this width.
pub const DEFAULT_MAX_WIDTH: u32 = 1600;
/// Document pages are always rendered to exactly this width.
pub const DEFAULT_DOCUMENT_TARGET_WIDTH: u32 = 1600;
/// Thumbnails never exceed this width.
pub const DEFAULT_THUMB_MAX_WIDTH: u32 = 300;
/// `width >= height * ratio` classifies a page as landscape.
pub const DEFAULT_LANDSCAPE_RATIO: f64 = 1.4;

/// Quality setting for lossy JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    /// Build from a `0.0..=1.0` fraction, the way canvas encoders take it.
    pub fn from_fraction(fraction: f32) -> Self {
        Self::new((fraction * 100.0).round().max(0.0) as u32)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Where to load the pdfium shared library from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PdfiumLibrary {
    /// `PDFIUM_LIB_PATH` when set, otherwise the working directory and then
    /// the system loader path.
    #[default]
    Auto,
    /// An explicit library file.
    Path(PathBuf),
    /// Only the system loader path.
    System,
}

/// Cooperative cancellation, checked between sources only.
///
/// Cloning shares the flag, so one clone can be handed to a signal handler
/// while the run holds the other.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Configuration for one ingest run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use pageflip_ingest::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .max_width(1200)
///     .thumb_max_width(240)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_width, 1200);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Maximum post-rotation width of raster pages. Default: 1600.
    ///
    /// Raster images are only ever downscaled; anything narrower keeps its
    /// natural size.
    pub max_width: u32,

    /// Width every document page is rendered to. Default: 1600.
    ///
    /// Unlike [`Self::max_width`] this is not a cap: small pages are scaled up.
    pub document_target_width: u32,

    /// Maximum thumbnail width. Default: 300.
    pub thumb_max_width: u32,

    /// JPEG quality of full-size pages. Default: 90.
    pub full_quality: Quality,

    /// JPEG quality of thumbnails. Default: 70.
    pub thumb_quality: Quality,

    /// JPEG quality used when transcoding HEIC sources. Default: 90.
    pub heic_quality: Quality,

    /// Width/height ratio at or above which a page is landscape. Default: 1.4.
    pub landscape_ratio: f64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// pdfium library location, recorded process-wide at run setup.
    pub pdfium_library: PdfiumLibrary,

    /// Decoder implementations selected by the format classifier.
    pub decoders: Decoders,

    /// Optional progress events.
    pub progress_callback: Option<ProgressCallback>,

    /// Optional cooperative cancellation.
    pub cancel: Option<CancelToken>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            document_target_width: DEFAULT_DOCUMENT_TARGET_WIDTH,
            thumb_max_width: DEFAULT_THUMB_MAX_WIDTH,
            full_quality: Quality::new(90),
            thumb_quality: Quality::new(70),
            heic_quality: Quality::new(90),
            landscape_ratio: DEFAULT_LANDSCAPE_RATIO,
            password: None,
            pdfium_library: PdfiumLibrary::default(),
            decoders: Decoders::default(),
            progress_callback: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("max_width", &self.max_width)
            .field("document_target_width", &self.document_target_width)
            .field("thumb_max_width", &self.thumb_max_width)
            .field("full_quality", &self.full_quality)
            .field("thumb_quality", &self.thumb_quality)
            .field("heic_quality", &self.heic_quality)
            .field("landscape_ratio", &self.landscape_ratio)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library", &self.pdfium_library)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn IngestProgressCallback>"),
            )
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn max_width(mut self, px: u32) -> Self {
        self.config.max_width = px;
        self
    }

    pub fn document_target_width(mut self, px: u32) -> Self {
        self.config.document_target_width = px;
        self
    }

    pub fn thumb_max_width(mut self, px: u32) -> Self {
        self.config.thumb_max_width = px;
        self
    }

    pub fn full_quality(mut self, q: u32) -> Self {
        self.config.full_quality = Quality::new(q);
        self
    }

    pub fn thumb_quality(mut self, q: u32) -> Self {
        self.config.thumb_quality = Quality::new(q);
        self
    }

    pub fn heic_quality(mut self, q: u32) -> Self {
        self.config.heic_quality = Quality::new(q);
        self
    }

    pub fn landscape_ratio(mut self, ratio: f64) -> Self {
        self.config.landscape_ratio = ratio;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, library: PdfiumLibrary) -> Self {
        self.config.pdfium_library = library;
        self
    }

    pub fn decoders(mut self, decoders: Decoders) -> Self {
        self.config.decoders = decoders;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.config.cancel = Some(token);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, IngestError> {
        let c = &self.config;
        if c.max_width < 16 {
            return Err(IngestError::InvalidConfig(format!(
                "max width must be at least 16 px, got {}",
                c.max_width
            )));
        }
        if c.document_target_width < 16 {
            return Err(IngestError::InvalidConfig(format!(
                "document target width must be at least 16 px, got {}",
                c.document_target_width
            )));
        }
        if c.thumb_max_width == 0 || c.thumb_max_width > c.max_width {
            return Err(IngestError::InvalidConfig(format!(
                "thumbnail width must be 1–{} px, got {}",
                c.max_width, c.thumb_max_width
            )));
        }
        if !(c.landscape_ratio.is_finite() && c.landscape_ratio > 0.0) {
            return Err(IngestError::InvalidConfig(format!(
                "landscape ratio must be a positive number, got {}",
                c.landscape_ratio
            )));
        }
        Ok(self.config)
    }
}
