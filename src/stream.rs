//! Streaming ingest: emit pages as they complete.
//!
//! Large albums take a while. The stream lets a caller upload or display
//! page 0 while page 40 is still decoding. Items arrive in final index
//! order, with each failure at the position its source held in the
//! flattened list.
//!
//! Dropping the stream stops the run before its next source.

use crate::config::PipelineConfig;
use crate::error::IngestError;
use crate::ingest::{drive, Event};
use crate::output::{RasterArtifact, SourceFailure};
use crate::source::Source;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::{info, warn};

/// A boxed stream of per-page results.
pub type ArtifactStream =
    Pin<Box<dyn Stream<Item = Result<RasterArtifact, SourceFailure>> + Send>>;

/// Ingest sources, yielding each page as soon as it is encoded.
///
/// # Errors
/// Fatal setup errors (empty input, missing pdfium library) are returned
/// immediately rather than through the stream.
///
/// # Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use pageflip_ingest::{ingest_stream, PipelineConfig, Source};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sources = vec![Source::new("album.zip", std::fs::read("album.zip")?)];
/// let mut pages = ingest_stream(sources, &PipelineConfig::default())?;
/// while let Some(item) = pages.next().await {
///     match item {
///         Ok(page) => println!("page {} ready", page.index),
///         Err(failure) => eprintln!("{failure}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn ingest_stream(
    sources: Vec<Source>,
    config: &PipelineConfig,
) -> Result<ArtifactStream, IngestError> {
    if sources.is_empty() {
        return Err(IngestError::NoInputs);
    }
    crate::engine::configure(&config.pdfium_library)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let config = config.clone();

    tokio::spawn(async move {
        let result = drive(sources, &config, |event| {
            let item = match event {
                Event::Artifact(a) => Ok(a),
                Event::Failure(f) => Err(f),
            };
            tx.send(item).is_ok()
        })
        .await;

        match result {
            Ok(stats) => info!(
                artifacts = stats.total_artifacts,
                failed = stats.failed_sources,
                "Streaming ingest finished"
            ),
            Err(e) => warn!(error = %e, "Streaming ingest stopped"),
        }
    });

    Ok(Box::pin(UnboundedReceiverStream::new(rx)))
}
