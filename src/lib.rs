//! # pageflip-ingest
//!
//! Turn a pile of photos, HEIC images, PDFs and ZIP archives into an ordered
//! sequence of page images plus thumbnails, ready for a page-flip viewer.
//!
//! ## Why this crate?
//!
//! People upload albums in whatever shape they have: phone photos shot
//! sideways, HEIC straight off an iPhone, a scanned PDF, a ZIP of all of the
//! above. A viewer wants one thing: upright JPEGs of a bounded width, in the
//! order a human would expect (`page2` before `page10`), each with a small
//! preview and a landscape/portrait hint.
//!
//! ## Pipeline Overview
//!
//! ```text
//! inputs
//!  │
//!  ├─ 1. Flatten    expand ZIPs, drop non-media entries, natural sort
//!  ├─ 2. Classify   raster / HEIC / document, by declared type then extension
//!  ├─ 3. Decode     HEIC → JPEG; PDF pages rendered via pdfium at 1600 px
//!  ├─ 4. Normalise  EXIF rotation, width cap 1600 px, JPEG q90
//!  ├─ 5. Thumbnail  300 px wide, JPEG q70
//!  └─ 6. Sequence   consecutive indices, landscape if w ≥ 1.4·h
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pageflip_ingest::{ingest_paths, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default();
//!     let output = ingest_paths(&["album.zip", "cover.heic"], &config).await?;
//!     println!("{} pages, {} failures", output.artifacts.len(), output.failures.len());
//!     let pages = output.into_result()?; // any failed source fails the run
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pageflip` binary (clap + indicatif + anyhow + tracing-subscriber) |
//! | `heic`  | off     | HEIC transcoding via the system libheif |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pageflip-ingest = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod publish;
pub mod source;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_support;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CancelToken, PdfiumLibrary, PipelineConfig, PipelineConfigBuilder, Quality};
pub use error::{IngestError, SourceError, SourceErrorKind};
pub use ingest::{ingest, ingest_paths, ingest_sync, ingest_to_dir, write_artifacts};
pub use output::{OrientationClass, RasterArtifact, RunOutput, RunStats, RunStatus, SourceFailure};
pub use pipeline::decode::{Decoders, DocumentDecoder, HeicTranscoder, PageViewport, RasterDecoder};
pub use progress::{IngestProgressCallback, NoopProgressCallback, Progress, ProgressCallback};
pub use publish::{
    deep_link, new_slug, publish_run, ArtifactStore, DisplayOptions, LocalStore, MetadataRecord,
    PageRecord, PublishOptions, StoreError,
};
pub use source::Source;
pub use stream::{ingest_stream, ArtifactStream};
