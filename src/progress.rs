//! Progress-callback trait for per-source and per-page ingest events.
//!
//! Inject an [`Arc<dyn IngestProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through the flattened source list.
//!
//! Progress is a fraction `completed / total_expected`. The denominator is
//! not known up front: it starts at the number of flattened sources (one page
//! each), grows once a document's true page count is known, and shrinks when a
//! source fails and will contribute nothing.
//!
//! # Example
//!
//! ```rust
//! use pageflip_ingest::{IngestProgressCallback, PipelineConfig, Progress};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl IngestProgressCallback for Printer {
//!     fn on_artifact_complete(&self, index: usize, progress: Progress) {
//!         eprintln!("page {index} done ({:.0}%)", progress.percent());
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use serde::Serialize;
use std::sync::Arc;

/// Snapshot of run progress after an artifact completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total_expected: usize,
}

impl Progress {
    /// Completed share in `[0, 1]`. An empty run counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total_expected == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total_expected as f64).min(1.0)
    }

    /// Rounded percentage, matching what a progress bar would display.
    pub fn percent(&self) -> f64 {
        (self.fraction() * 100.0).round()
    }
}

/// Running completed/expected counters owned by one orchestrator run.
#[derive(Debug, Clone)]
pub(crate) struct ProgressTracker {
    completed: usize,
    total_expected: usize,
}

impl ProgressTracker {
    /// Every source is assumed to yield one page until proven otherwise.
    pub(crate) fn new(source_count: usize) -> Self {
        Self {
            completed: 0,
            total_expected: source_count,
        }
    }

    /// A source turned out to produce `pages` artifacts instead of one.
    pub(crate) fn source_expanded(&mut self, pages: usize) {
        self.total_expected = (self.total_expected + pages).saturating_sub(1);
    }

    /// A source failed and will contribute nothing.
    pub(crate) fn source_failed(&mut self) {
        self.total_expected = self.total_expected.saturating_sub(1);
    }

    pub(crate) fn artifact_completed(&mut self) -> Progress {
        self.completed += 1;
        self.snapshot()
    }

    pub(crate) fn snapshot(&self) -> Progress {
        Progress {
            completed: self.completed,
            total_expected: self.total_expected.max(self.completed),
        }
    }
}

/// Called by the orchestrator as it processes each source.
///
/// Sources are processed one at a time, so events arrive strictly in order.
/// Implementations must still be `Send + Sync`: the streaming API runs the
/// orchestrator on a spawned task. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait IngestProgressCallback: Send + Sync {
    /// Called once after flattening, before any source is decoded.
    fn on_run_start(&self, total_sources: usize) {
        let _ = total_sources;
    }

    /// Called before a source is classified and decoded.
    ///
    /// # Arguments
    /// * `position`: 1-based position in the flattened source list
    /// * `total_sources`: flattened source count
    /// * `name`: the source name
    fn on_source_start(&self, position: usize, total_sources: usize, name: &str) {
        let _ = (position, total_sources, name);
    }

    /// Called after each artifact is committed to the output sequence.
    ///
    /// # Arguments
    /// * `index`: 0-based index of the artifact in the final sequence
    /// * `progress`: completed / expected counts after this artifact
    fn on_artifact_complete(&self, index: usize, progress: Progress) {
        let _ = (index, progress);
    }

    /// Called when a source fails. The run continues with the next source.
    fn on_source_error(&self, name: &str, error: &str) {
        let _ = (name, error);
    }

    /// Called once after all sources have been attempted.
    fn on_run_complete(&self, artifact_count: usize, failure_count: usize) {
        let _ = (artifact_count, failure_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl IngestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn IngestProgressCallback>;
