//! Publishing a finished run: upload pages and the metadata record.
//!
//! Storage sits behind [`ArtifactStore`], a put/get contract that does not
//! care whether bytes end up on local disk or in an object store. The
//! layout under a store is fixed:
//!
//! ```text
//! books/{slug}/pages/0000.jpg
//! books/{slug}/thumbs/0000.jpg
//! books/{slug}/meta.json
//! ```
//!
//! The order of `pages` in `meta.json` is the display order.

use crate::error::IngestError;
use crate::ingest::{artifact_file_name, write_atomic};
use crate::output::{OrientationClass, RunOutput, RunStatus};
use crate::pipeline::surface::OutputFormat;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const META_CONTENT_TYPE: &str = "application/json";

/// Errors raised by an [`ArtifactStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Pathname is empty, absolute, or climbs out of the store with `..`.
    #[error("Invalid storage path '{0}'")]
    InvalidPath(String),

    #[error("Storage I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Metadata record is not valid JSON: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Put/get storage contract used by [`publish_run`].
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under `pathname` and return a publicly resolvable URL.
    fn put(
        &self,
        pathname: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Look up a previously stored metadata record.
    fn find_meta(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<MetadataRecord>, StoreError>> + Send;
}

/// Reject pathnames that could escape the store root.
pub fn validate_pathname(pathname: &str) -> Result<(), StoreError> {
    let path = Path::new(pathname);
    let ok = !pathname.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidPath(pathname.to_string()))
    }
}

fn meta_pathname(slug: &str) -> String {
    format!("books/{slug}/meta.json")
}

/// [`ArtifactStore`] writing under a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    base_url: String,
}

impl LocalStore {
    /// `base_url` is prefixed to every stored pathname to form its URL.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for LocalStore {
    async fn put(
        &self,
        pathname: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        validate_pathname(pathname)?;
        let path = self.root.join(pathname);
        write_atomic(&path, &bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(pathname, content_type, bytes = bytes.len(), "Stored object");
        Ok(format!("{}/{pathname}", self.base_url))
    }

    async fn find_meta(&self, slug: &str) -> Result<Option<MetadataRecord>, StoreError> {
        let pathname = meta_pathname(slug);
        validate_pathname(&pathname)?;
        let path = self.root.join(&pathname);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

/// One published page as the viewer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub url: String,
    pub thumb_url: String,
    pub width: u32,
    pub height: u32,
    #[serde(alias = "orientation")]
    pub orientation_class: OrientationClass,
}

/// Viewer display hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// Show facing pages side by side.
    pub spread: bool,
    /// Right-to-left page order.
    pub rtl: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            spread: true,
            rtl: false,
        }
    }
}

/// The JSON document stored as `books/{slug}/meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub slug: String,
    pub title: String,
    pub created_at: String,
    pub page_count: usize,
    pub pages: Vec<PageRecord>,
    pub display: DisplayOptions,
}

/// Options for [`publish_run`].
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Generated with [`new_slug`] when `None`.
    pub slug: Option<String>,
    /// Defaults to `Album {slug}`.
    pub title: Option<String>,
    pub display: DisplayOptions,
}

/// Eight lowercase hex characters.
pub fn new_slug() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// `{origin}/b/{slug}`, the link a QR code points at.
pub fn deep_link(origin: &str, slug: &str) -> String {
    format!("{}/b/{slug}", origin.trim_end_matches('/'))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Upload every page and thumbnail of a successful run, then its metadata.
///
/// # Errors
/// A failed or cancelled run is refused before anything is uploaded; any
/// storage error stops publishing at that point.
pub async fn publish_run<S: ArtifactStore>(
    store: &S,
    output: &RunOutput,
    options: PublishOptions,
) -> Result<MetadataRecord, IngestError> {
    match output.status() {
        RunStatus::Succeeded => {}
        RunStatus::Failed => {
            return Err(IngestError::PartialFailure {
                succeeded: output.artifacts.len(),
                failed: output.failures.len(),
            })
        }
        RunStatus::Cancelled => {
            return Err(IngestError::Cancelled {
                completed: output.artifacts.len(),
            })
        }
    }

    let slug = options.slug.unwrap_or_else(new_slug);
    let content_type = OutputFormat::Jpeg.content_type();
    let mut pages = Vec::with_capacity(output.artifacts.len());

    for artifact in &output.artifacts {
        let file = artifact_file_name(artifact.index);
        let url = store
            .put(
                &format!("books/{slug}/pages/{file}"),
                artifact.full_bytes.clone(),
                content_type,
            )
            .await?;
        let thumb_url = store
            .put(
                &format!("books/{slug}/thumbs/{file}"),
                artifact.thumb_bytes.clone(),
                content_type,
            )
            .await?;
        pages.push(PageRecord {
            url,
            thumb_url,
            width: artifact.width,
            height: artifact.height,
            orientation_class: artifact.orientation_class,
        });
    }

    let record = MetadataRecord {
        title: options.title.unwrap_or_else(|| format!("Album {slug}")),
        created_at: timestamp(Utc::now()),
        page_count: pages.len(),
        pages,
        display: options.display,
        slug,
    };

    let json = serde_json::to_vec_pretty(&record).map_err(StoreError::from)?;
    store
        .put(&meta_pathname(&record.slug), json, META_CONTENT_TYPE)
        .await?;
    info!(slug = %record.slug, pages = record.page_count, "Published album");
    Ok(record)
}
