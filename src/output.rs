//! Output types produced by an ingest run.

use crate::error::{IngestError, SourceError, SourceErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse layout hint for the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationClass {
    Landscape,
    Portrait,
}

impl OrientationClass {
    /// `width >= height * ratio` is landscape; everything else is portrait.
    pub fn classify(width: u32, height: u32, ratio: f64) -> Self {
        if width as f64 >= height as f64 * ratio {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

impl fmt::Display for OrientationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
        })
    }
}

/// One normalised page: full-size JPEG, its thumbnail, and layout metadata.
///
/// `width` and `height` describe `full_bytes` with every rotation already
/// applied.
#[derive(Clone)]
pub struct RasterArtifact {
    pub full_bytes: Vec<u8>,
    pub thumb_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 0-based position in the run's final page sequence.
    pub index: usize,
    pub orientation_class: OrientationClass,
    /// Name of the source this page came from.
    pub source_name: String,
    /// 1-based page within a document source; `None` for single images.
    pub page_in_source: Option<usize>,
}

impl fmt::Debug for RasterArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterArtifact")
            .field("index", &self.index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("orientation_class", &self.orientation_class)
            .field("source_name", &self.source_name)
            .field("page_in_source", &self.page_in_source)
            .field("full_bytes", &format_args!("<{} bytes>", self.full_bytes.len()))
            .field("thumb_bytes", &format_args!("<{} bytes>", self.thumb_bytes.len()))
            .finish()
    }
}

/// A source that contributed nothing, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source_name: String,
    pub error: SourceError,
}

impl From<SourceError> for SourceFailure {
    fn from(error: SourceError) -> Self {
        Self {
            source_name: error.source_name().to_string(),
            error,
        }
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

/// Final state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every source produced its pages.
    Succeeded,
    /// At least one source failed, even if others produced pages.
    Failed,
    /// Cancelled between sources.
    Cancelled,
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Sources left after flattening.
    pub total_sources: usize,
    pub succeeded_sources: usize,
    pub failed_sources: usize,
    /// Sources never attempted because the run was cancelled.
    pub skipped_sources: usize,
    pub total_artifacts: usize,
    pub landscape_artifacts: usize,
    pub unsupported_failures: usize,
    pub decode_failures: usize,
    pub encode_failures: usize,
    pub processing_time_ms: u64,
    pub cancelled: bool,
}

impl RunStats {
    pub(crate) fn record_failure(&mut self, kind: SourceErrorKind) {
        self.failed_sources += 1;
        match kind {
            SourceErrorKind::UnsupportedFormat => self.unsupported_failures += 1,
            SourceErrorKind::Decode => self.decode_failures += 1,
            SourceErrorKind::Encode => self.encode_failures += 1,
        }
    }
}

/// Everything a run produced: pages in display order plus failures.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub artifacts: Vec<RasterArtifact>,
    pub failures: Vec<SourceFailure>,
    pub stats: RunStats,
}

impl RunOutput {
    pub fn status(&self) -> RunStatus {
        if self.stats.cancelled {
            RunStatus::Cancelled
        } else if self.failures.is_empty() {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == RunStatus::Succeeded
    }

    /// Treat any failed source, or cancellation, as an error.
    pub fn into_result(self) -> Result<Vec<RasterArtifact>, IngestError> {
        match self.status() {
            RunStatus::Succeeded => Ok(self.artifacts),
            RunStatus::Cancelled => Err(IngestError::Cancelled {
                completed: self.artifacts.len(),
            }),
            RunStatus::Failed => Err(IngestError::PartialFailure {
                succeeded: self.artifacts.len(),
                failed: self.failures.len(),
            }),
        }
    }
}
