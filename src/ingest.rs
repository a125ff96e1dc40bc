//! The ingest orchestrator and its eager entry points.
//!
//! Sources are processed strictly one at a time in flattened order: page
//! indices and the progress denominator depend on every earlier source
//! having finished. Each source's CPU-bound work runs in a single
//! `spawn_blocking` call because pdfium is not async-safe and large photos
//! would otherwise stall the runtime's worker threads.
//!
//! Use [`crate::stream::ingest_stream`] instead to receive pages as they
//! complete rather than after the whole run.

use crate::config::PipelineConfig;
use crate::engine;
use crate::error::{IngestError, SourceError};
use crate::output::{OrientationClass, RasterArtifact, RunOutput, RunStats, SourceFailure};
use crate::pipeline::classify::{classify, SourceKind};
use crate::pipeline::decode::{Decoder, RasterDecoder};
use crate::pipeline::flatten::{flatten, Flattened};
use crate::pipeline::input;
use crate::pipeline::normalize::{normalize_raster, EncodedPage};
use crate::pipeline::orientation::resolve_orientation;
use crate::pipeline::render::rasterize_document;
use crate::pipeline::surface::OutputFormat;
use crate::pipeline::thumbnail::generate_thumbnail;
use crate::progress::ProgressTracker;
use crate::source::Source;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Something the orchestrator produced, in final sequence order.
pub(crate) enum Event {
    Artifact(RasterArtifact),
    Failure(SourceFailure),
}

/// A page before the orchestrator has placed it in the sequence.
struct ProcessedPage {
    full: EncodedPage,
    thumb: EncodedPage,
    page_in_source: Option<usize>,
}

/// Ingest in-memory sources into an ordered page sequence.
///
/// # Returns
/// `Ok(RunOutput)` once every source has been attempted, even if some
/// failed: check [`RunOutput::status`] or call [`RunOutput::into_result`].
///
/// # Errors
/// Only for problems that stop the run before any source is touched:
/// an empty input list or an explicit pdfium path that does not exist.
///
/// # Example
/// ```rust,no_run
/// use pageflip_ingest::{ingest, PipelineConfig, Source};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sources = vec![Source::new("p1.jpg", std::fs::read("p1.jpg")?)];
/// let output = ingest(sources, &PipelineConfig::default()).await?;
/// for page in &output.artifacts {
///     println!("{} {}x{} {}", page.index, page.width, page.height, page.orientation_class);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn ingest(
    sources: Vec<Source>,
    config: &PipelineConfig,
) -> Result<RunOutput, IngestError> {
    let mut artifacts = Vec::new();
    let mut failures = Vec::new();
    let stats = drive(sources, config, |event| {
        match event {
            Event::Artifact(a) => artifacts.push(a),
            Event::Failure(f) => failures.push(f),
        }
        true
    })
    .await?;

    Ok(RunOutput {
        artifacts,
        failures,
        stats,
    })
}

/// Read files (or the files directly inside directories) and ingest them.
pub async fn ingest_paths<P: AsRef<Path>>(
    paths: &[P],
    config: &PipelineConfig,
) -> Result<RunOutput, IngestError> {
    if paths.is_empty() {
        return Err(IngestError::NoInputs);
    }
    let sources = input::read_paths(paths).await?;
    ingest(sources, config).await
}

/// Synchronous wrapper around [`ingest`].
///
/// Creates a temporary tokio runtime internally; do not call it from inside
/// an async context.
pub fn ingest_sync(sources: Vec<Source>, config: &PipelineConfig) -> Result<RunOutput, IngestError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| IngestError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(ingest(sources, config))
}

/// Ingest and write every page to `out_dir/pages/NNNN.jpg` and its thumbnail
/// to `out_dir/thumbs/NNNN.jpg`.
///
/// Pages are written even when the run failed; the returned output says
/// whether it did.
pub async fn ingest_to_dir(
    sources: Vec<Source>,
    out_dir: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<RunOutput, IngestError> {
    let output = ingest(sources, config).await?;
    write_artifacts(&output, out_dir).await?;
    Ok(output)
}

/// Write a finished run's pages and thumbnails under `out_dir`.
///
/// Each file is written atomically (temp file + rename), so a crash never
/// leaves a truncated JPEG behind.
pub async fn write_artifacts(output: &RunOutput, out_dir: impl AsRef<Path>) -> Result<(), IngestError> {
    let out_dir = out_dir.as_ref();
    for artifact in &output.artifacts {
        let file = artifact_file_name(artifact.index);
        for (dir, bytes) in [("pages", &artifact.full_bytes), ("thumbs", &artifact.thumb_bytes)] {
            let path = out_dir.join(dir).join(&file);
            write_atomic(&path, bytes)
                .await
                .map_err(|source| IngestError::OutputWriteFailed {
                    path: path.clone(),
                    source,
                })?;
        }
    }
    info!(
        dir = %out_dir.display(),
        pages = output.artifacts.len(),
        "Wrote pages and thumbnails"
    );
    Ok(())
}

/// `0007.jpg` for index 7.
pub fn artifact_file_name(index: usize) -> String {
    format!("{index:04}.{}", OutputFormat::Jpeg.extension())
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

/// Run the pipeline, handing each artifact and failure to `emit` in final
/// order. `emit` returns `false` when nobody is listening any more, which
/// stops the run like a cancellation.
pub(crate) async fn drive<F>(
    sources: Vec<Source>,
    config: &PipelineConfig,
    mut emit: F,
) -> Result<RunStats, IngestError>
where
    F: FnMut(Event) -> bool + Send,
{
    let started = Instant::now();
    if sources.is_empty() {
        return Err(IngestError::NoInputs);
    }
    engine::configure(&config.pdfium_library)?;

    let input_count = sources.len();
    let Flattened {
        sources,
        failures: archive_failures,
    } = tokio::task::spawn_blocking(move || flatten(sources))
        .await
        .map_err(|e| IngestError::Internal(format!("Flatten task panicked: {e}")))?;

    let total = sources.len();
    info!(
        inputs = input_count,
        sources = total,
        unreadable_archives = archive_failures.len(),
        "Starting ingest run"
    );

    let cb = config.progress_callback.as_ref();
    let mut stats = RunStats {
        total_sources: total + archive_failures.len(),
        ..Default::default()
    };
    let mut tracker = ProgressTracker::new(total);
    let mut next_index = 0usize;
    let mut listening = true;

    if let Some(cb) = cb {
        cb.on_run_start(total);
    }

    for error in archive_failures {
        stats.record_failure(error.kind());
        if let Some(cb) = cb {
            cb.on_source_error(error.source_name(), &error.to_string());
        }
        listening = emit(Event::Failure(error.into())) && listening;
    }

    let mut remaining = sources.into_iter().enumerate();
    while let Some((i, source)) = remaining.next() {
        if !listening || config.is_cancelled() {
            stats.skipped_sources = remaining.len() + 1;
            stats.cancelled = true;
            info!(skipped = stats.skipped_sources, "Run cancelled between sources");
            break;
        }

        let name = source.name.clone();
        if let Some(cb) = cb {
            cb.on_source_start(i + 1, total, &name);
        }
        debug!(name = %name, position = i + 1, total, "Processing source");

        let result = match classify(&source) {
            Ok(kind) => {
                let cfg = config.clone();
                tokio::task::spawn_blocking(move || process_source(source, kind, &cfg))
                    .await
                    .unwrap_or_else(|e| Err(SourceError::decode(&name, format!("decoder panicked: {e}"))))
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(pages) => {
                if pages.len() != 1 {
                    tracker.source_expanded(pages.len());
                }
                stats.succeeded_sources += 1;
                for page in pages {
                    let artifact = place(page, next_index, &name, config.landscape_ratio);
                    next_index += 1;
                    if artifact.orientation_class == OrientationClass::Landscape {
                        stats.landscape_artifacts += 1;
                    }
                    stats.total_artifacts += 1;

                    let progress = tracker.artifact_completed();
                    if let Some(cb) = cb {
                        cb.on_artifact_complete(artifact.index, progress);
                    }
                    listening = emit(Event::Artifact(artifact)) && listening;
                }
            }
            Err(error) => {
                warn!(name = %name, error = %error, "Source failed");
                tracker.source_failed();
                stats.record_failure(error.kind());
                if let Some(cb) = cb {
                    cb.on_source_error(&name, &error.to_string());
                }
                listening = emit(Event::Failure(SourceFailure {
                    source_name: name,
                    error,
                })) && listening;
            }
        }
    }

    stats.processing_time_ms = started.elapsed().as_millis() as u64;
    info!(
        artifacts = stats.total_artifacts,
        failed = stats.failed_sources,
        ms = stats.processing_time_ms,
        "Ingest run complete"
    );
    if let Some(cb) = cb {
        cb.on_run_complete(stats.total_artifacts, stats.failed_sources);
    }
    Ok(stats)
}

fn place(page: ProcessedPage, index: usize, source_name: &str, ratio: f64) -> RasterArtifact {
    RasterArtifact {
        orientation_class: OrientationClass::classify(page.full.width, page.full.height, ratio),
        width: page.full.width,
        height: page.full.height,
        full_bytes: page.full.bytes,
        thumb_bytes: page.thumb.bytes,
        index,
        source_name: source_name.to_string(),
        page_in_source: page.page_in_source,
    }
}

/// Decode, normalise and thumbnail one source. Blocking.
fn process_source(
    source: Source,
    kind: SourceKind,
    config: &PipelineConfig,
) -> Result<Vec<ProcessedPage>, SourceError> {
    let name = source.name.as_str();
    let full_pages = match config.decoders.select(kind) {
        Decoder::Raster(decoder) => {
            vec![(normalize_bytes(name, &source.bytes, decoder, config)?, None)]
        }
        Decoder::Heic(transcoder) => {
            let jpeg = transcoder.transcode(name, &source.bytes, config.heic_quality.value())?;
            debug!(name, bytes = jpeg.len(), "HEIC transcoded");
            let decoder = config.decoders.raster.as_ref();
            vec![(normalize_bytes(name, &jpeg, decoder, config)?, None)]
        }
        Decoder::Document(decoder) => rasterize_document(
            name,
            &source.bytes,
            decoder,
            config.password.as_deref(),
            config.document_target_width,
            config.full_quality,
        )?
        .into_iter()
        .enumerate()
        .map(|(i, page)| (page, Some(i + 1)))
        .collect(),
    };

    full_pages
        .into_iter()
        .map(|(full, page_in_source)| {
            let thumb = generate_thumbnail(
                name,
                &full.bytes,
                full.width,
                full.height,
                config.thumb_max_width,
                config.thumb_quality,
            )?;
            Ok(ProcessedPage {
                full,
                thumb,
                page_in_source,
            })
        })
        .collect()
}

/// Orientation lookup plus normalisation for baseline raster bytes.
fn normalize_bytes(
    name: &str,
    bytes: &[u8],
    decoder: &dyn RasterDecoder,
    config: &PipelineConfig,
) -> Result<EncodedPage, SourceError> {
    let image = decoder.decode(name, bytes)?;
    let rotation = resolve_orientation(bytes);
    normalize_raster(name, &image, rotation, config.max_width, config.full_quality)
}
