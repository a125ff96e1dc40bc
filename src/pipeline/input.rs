//! Input reading: turn user-supplied paths into owned [`Source`]s.
//!
//! Each file is read whole into memory and its handle closed before the
//! pipeline sees it, so no file descriptor outlives a decode failure. A
//! directory contributes its immediate regular files that carry a media or
//! archive extension; anything else there (`.DS_Store`, `Thumbs.db`, notes)
//! is skipped, and subdirectories are not walked. Paths named explicitly are
//! always read.

use crate::error::IngestError;
use crate::source::{extension_of, Source, ARCHIVE_EXTENSIONS, MEDIA_EXTENSIONS};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn io_error(path: &Path, err: std::io::Error) -> IngestError {
    match err.kind() {
        ErrorKind::NotFound => IngestError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => IngestError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => IngestError::Internal(format!("reading '{}': {err}", path.display())),
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read one file into a [`Source`] named after its file name.
pub async fn read_file(path: &Path) -> Result<Source, IngestError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read input file");
    Ok(Source::new(source_name(path), bytes))
}

fn is_ingestible(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| {
        MEDIA_EXTENSIONS.contains(&ext.as_str()) || ARCHIVE_EXTENSIONS.contains(&ext.as_str())
    })
}

async fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| io_error(dir, e))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(dir, e))? {
        let file_type = entry.file_type().await.map_err(|e| io_error(&entry.path(), e))?;
        if !file_type.is_file() {
            continue;
        }
        let path = entry.path();
        if is_ingestible(&source_name(&path)) {
            files.push(path);
        } else {
            debug!(path = %path.display(), "Skipping non-media file in input directory");
        }
    }
    Ok(files)
}

/// Read every path. Any unreadable path fails the whole call before a run
/// starts.
pub async fn read_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Source>, IngestError> {
    let mut sources = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path).await.map_err(|e| io_error(path, e))?;
        if meta.is_dir() {
            let files = list_dir(path).await?;
            info!(dir = %path.display(), files = files.len(), "Reading input directory");
            for file in files {
                sources.push(read_file(&file).await?);
            }
        } else {
            sources.push(read_file(path).await?);
        }
    }
    Ok(sources)
}
