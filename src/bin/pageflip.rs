//! CLI binary for pageflip-ingest.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, runs the pipeline, and writes or publishes the pages.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pageflip_ingest::{
    deep_link, ingest_paths, publish_run, write_artifacts, CancelToken, DisplayOptions,
    IngestProgressCallback, LocalStore, OrientationClass, PdfiumLibrary, PipelineConfig,
    Progress, ProgressCallback, PublishOptions, RunStats, RunStatus, SourceFailure,
};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar. The bar length follows `total_expected`, which grows
/// when a PDF turns out to have several pages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Ingesting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl IngestProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_sources: usize) {
        self.bar.set_length(total_sources as u64);
    }

    fn on_source_start(&self, position: usize, total_sources: usize, name: &str) {
        self.bar
            .set_message(dim(&format!("{position}/{total_sources} {name}")));
    }

    fn on_artifact_complete(&self, _index: usize, progress: Progress) {
        self.bar.set_length(progress.total_expected as u64);
        self.bar.set_position(progress.completed as u64);
    }

    fn on_source_error(&self, name: &str, error: &str) {
        self.bar.println(format!("  {} {}  {}", red("✗"), name, red(error)));
    }

    fn on_run_complete(&self, artifact_count: usize, failure_count: usize) {
        self.bar.finish_and_clear();
        if failure_count == 0 {
            eprintln!("{} {} pages ready", green("✔"), bold(&artifact_count.to_string()));
        } else {
            eprintln!(
                "{} {} pages ready, {} source(s) failed",
                red("✘"),
                bold(&artifact_count.to_string()),
                red(&failure_count.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Check an album without writing anything
  pageflip album.zip cover.heic

  # Write pages/NNNN.jpg and thumbs/NNNN.jpg
  pageflip scans/*.jpg brochure.pdf --out-dir ./out

  # Publish to a local store and print the viewer link
  pageflip album.zip --publish ./public --base-url https://cdn.example.com \
      --origin https://flip.example.com

  # Machine-readable summary
  pageflip album.zip --json > summary.json

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to an existing libpdfium
  RUST_LOG          Overrides the log filter (e.g. pageflip_ingest=debug)
"#;

/// Normalise photos, HEIC images, PDFs and ZIP archives into page images.
#[derive(Parser, Debug)]
#[command(
    name = "pageflip",
    version,
    about = "Normalise photos, HEIC, PDFs and ZIPs into page images for a flip-book viewer",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files or directories (jpg, jpeg, png, webp, heic, pdf, zip).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write pages and thumbnails under this directory.
    #[arg(short, long, env = "PAGEFLIP_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Publish into a local store rooted at this directory.
    #[arg(long, env = "PAGEFLIP_PUBLISH", conflicts_with = "out_dir")]
    publish: Option<PathBuf>,

    /// URL prefix for published objects. Defaults to the store root.
    #[arg(long, env = "PAGEFLIP_BASE_URL", requires = "publish")]
    base_url: Option<String>,

    /// Viewer origin used to print the deep link.
    #[arg(long, env = "PAGEFLIP_ORIGIN", requires = "publish")]
    origin: Option<String>,

    /// Album slug. Generated when omitted.
    #[arg(long, env = "PAGEFLIP_SLUG", requires = "publish")]
    slug: Option<String>,

    /// Album title. Defaults to "Album <slug>".
    #[arg(long, env = "PAGEFLIP_TITLE", requires = "publish")]
    title: Option<String>,

    /// Show single pages instead of spreads.
    #[arg(long, env = "PAGEFLIP_NO_SPREAD")]
    no_spread: bool,

    /// Right-to-left page order.
    #[arg(long, env = "PAGEFLIP_RTL")]
    rtl: bool,

    /// Maximum width of photo pages.
    #[arg(long, env = "PAGEFLIP_MAX_WIDTH", default_value_t = 1600)]
    max_width: u32,

    /// Width PDF pages are rendered to.
    #[arg(long, env = "PAGEFLIP_DOCUMENT_WIDTH", default_value_t = 1600)]
    document_width: u32,

    /// Maximum thumbnail width.
    #[arg(long, env = "PAGEFLIP_THUMB_WIDTH", default_value_t = 300)]
    thumb_width: u32,

    /// JPEG quality of full pages (1–100).
    #[arg(long, env = "PAGEFLIP_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: u32,

    /// JPEG quality of thumbnails (1–100).
    #[arg(long, env = "PAGEFLIP_THUMB_QUALITY", default_value_t = 70,
          value_parser = clap::value_parser!(u32).range(1..=100))]
    thumb_quality: u32,

    /// Password for encrypted PDFs.
    #[arg(long, env = "PAGEFLIP_PASSWORD")]
    password: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print a JSON summary on stdout.
    #[arg(long, env = "PAGEFLIP_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PAGEFLIP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGEFLIP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAGEFLIP_QUIET")]
    quiet: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageSummary<'a> {
    index: usize,
    width: u32,
    height: u32,
    orientation_class: OrientationClass,
    source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    status: RunStatus,
    pages: Vec<PageSummary<'a>>,
    failures: &'a [SourceFailure],
    stats: &'a RunStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; -v always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Cancellation on Ctrl-C ───────────────────────────────────────────
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Cancelling after the current source…");
                cancel.cancel();
            }
        });
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn IngestProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb, cancel)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = ingest_paths(&cli.inputs, &config)
        .await
        .context("Ingest failed")?;

    if let Some(ref dir) = cli.out_dir {
        write_artifacts(&output, dir)
            .await
            .context("Failed to write pages")?;
    }

    let mut slug = None;
    let mut link = None;
    if let Some(ref root) = cli.publish {
        if output.status() == RunStatus::Succeeded {
            let base_url = cli
                .base_url
                .clone()
                .unwrap_or_else(|| format!("file://{}", root.display()));
            let store = LocalStore::new(root, base_url);
            let record = publish_run(
                &store,
                &output,
                PublishOptions {
                    slug: cli.slug.clone(),
                    title: cli.title.clone(),
                    display: DisplayOptions {
                        spread: !cli.no_spread,
                        rtl: cli.rtl,
                    },
                },
            )
            .await
            .context("Publishing failed")?;
            link = cli.origin.as_deref().map(|o| deep_link(o, &record.slug));
            slug = Some(record.slug);
        } else if !cli.quiet {
            eprintln!("{}", red("Not publishing: the run did not succeed"));
        }
    }

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let summary = Summary {
            status: output.status(),
            pages: output
                .artifacts
                .iter()
                .map(|a| PageSummary {
                    index: a.index,
                    width: a.width,
                    height: a.height,
                    orientation_class: a.orientation_class,
                    source: &a.source_name,
                    page: a.page_in_source,
                })
                .collect(),
            failures: &output.failures,
            stats: &output.stats,
            slug,
            link,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        if !show_progress {
            eprintln!(
                "{} pages from {} source(s) in {}ms",
                output.stats.total_artifacts,
                output.stats.total_sources,
                output.stats.processing_time_ms
            );
            for failure in &output.failures {
                eprintln!("  {} {failure}", red("✗"));
            }
        }
        if let Some(ref slug) = slug {
            eprintln!("Published album {}", bold(slug));
        }
        if let Some(ref link) = link {
            println!("{link}");
        }
    }

    Ok(match output.status() {
        RunStatus::Succeeded => ExitCode::SUCCESS,
        RunStatus::Failed | RunStatus::Cancelled => ExitCode::FAILURE,
    })
}

/// Map CLI args to `PipelineConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    cancel: CancelToken,
) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .max_width(cli.max_width)
        .document_target_width(cli.document_width)
        .thumb_max_width(cli.thumb_width)
        .full_quality(cli.quality)
        .thumb_quality(cli.thumb_quality)
        .cancel_token(cancel);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(PdfiumLibrary::Path(lib.clone()));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
