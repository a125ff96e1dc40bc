//! Error types for the pageflip-ingest library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`IngestError`]: **Fatal**: the run cannot proceed at all (no inputs,
//!   unreadable input path, invalid configuration). Returned as
//!   `Err(IngestError)` from the top-level `ingest*` functions.
//!
//! * [`SourceError`]: **Non-fatal**: a single source failed (corrupt JPEG,
//!   password-protected PDF, unreadable archive) but its siblings are fine.
//!   Stored inside [`crate::output::SourceFailure`] so callers can inspect
//!   partial success rather than losing the whole album to one bad file.
//!
//! A run with any `SourceError` still returns `Ok(RunOutput)`; its status is
//! [`crate::output::RunStatus::Failed`] and
//! [`crate::output::RunOutput::into_result`] turns that into
//! [`IngestError::PartialFailure`] for callers with zero tolerance.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pageflip-ingest library.
///
/// Source-level failures use [`SourceError`] and are collected in
/// [`crate::output::RunOutput::failures`] rather than propagated here.
#[derive(Debug, Error)]
pub enum IngestError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The run was started with an empty input list.
    #[error("No input files were supplied")]
    NoInputs,

    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An explicit pdfium library path was configured but does not exist.
    #[error(
        "PDF engine library not found at '{path}'\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or pass --pdfium-lib, or install\n\
pdfium where the system loader can find it.\n"
    )]
    EngineUnavailable { path: PathBuf },

    // ── Run outcome ───────────────────────────────────────────────────────
    /// Some sources succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::RunOutput::into_result`] when the caller
    /// wants to treat any source failure as an error.
    #[error("{failed} source(s) failed; {succeeded} page(s) were produced")]
    PartialFailure { succeeded: usize, failed: usize },

    /// The run was cancelled between sources.
    #[error("Run cancelled after {completed} page(s)")]
    Cancelled { completed: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The storage collaborator rejected a write or lookup.
    #[error(transparent)]
    Store(#[from] crate::publish::StoreError),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse taxonomy of a [`SourceError`], for tallying without matching on text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    UnsupportedFormat,
    Decode,
    Encode,
}

/// A non-fatal error for a single source.
///
/// Fatal to that source only: the orchestrator records it and moves on to
/// the next source in flattened order.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceError {
    /// Media kind could not be determined or is not in the allow-list.
    #[error("{name}: unsupported format: {detail}")]
    UnsupportedFormat { name: String, detail: String },

    /// Bytes could not be decoded, transcoded or rasterised.
    #[error("{name}: decode failed: {detail}")]
    Decode { name: String, detail: String },

    /// Surface-to-bytes encoding failed after a successful decode.
    #[error("{name}: encode failed: {detail}")]
    Encode { name: String, detail: String },
}

impl SourceError {
    pub fn unsupported(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            name: name.into(),
            detail: detail.into(),
        }
    }

    pub fn decode(name: impl Into<String>, detail: impl ToString) -> Self {
        Self::Decode {
            name: name.into(),
            detail: detail.to_string(),
        }
    }

    pub fn encode(name: impl Into<String>, detail: impl ToString) -> Self {
        Self::Encode {
            name: name.into(),
            detail: detail.to_string(),
        }
    }

    pub fn kind(&self) -> SourceErrorKind {
        match self {
            Self::UnsupportedFormat { .. } => SourceErrorKind::UnsupportedFormat,
            Self::Decode { .. } => SourceErrorKind::Decode,
            Self::Encode { .. } => SourceErrorKind::Encode,
        }
    }

    /// Name of the source this error belongs to.
    pub fn source_name(&self) -> &str {
        match self {
            Self::UnsupportedFormat { name, .. }
            | Self::Decode { name, .. }
            | Self::Encode { name, .. } => name,
        }
    }
}
