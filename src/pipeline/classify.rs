//! Format classification: route each source to the decoder that can read it.
//!
//! Resolution order:
//! 1. the declared content type, when present and recognised;
//! 2. the file-name extension;
//! 3. otherwise [`SourceError::UnsupportedFormat`].
//!
//! HEIC gets its own kind because it has to be transcoded before any raster
//! operation (orientation lookup included) can run.

use crate::error::SourceError;
use crate::source::Source;
use tracing::debug;

/// What a source decodes as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// JPEG, PNG or WebP.
    Raster,
    /// HEIC/HEIF, transcoded to JPEG first.
    Heic,
    /// Paged document (PDF).
    Document,
}

fn kind_for_content_type(content_type: &str) -> Option<SourceKind> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/heic" | "image/heif" | "image/heic-sequence" | "image/heif-sequence" => {
            Some(SourceKind::Heic)
        }
        "image/jpeg" | "image/jpg" | "image/pjpeg" | "image/png" | "image/webp" => {
            Some(SourceKind::Raster)
        }
        "application/pdf" => Some(SourceKind::Document),
        _ => None,
    }
}

fn kind_for_extension(ext: &str) -> Option<SourceKind> {
    match ext {
        "jpg" | "jpeg" | "png" | "webp" => Some(SourceKind::Raster),
        "heic" => Some(SourceKind::Heic),
        "pdf" => Some(SourceKind::Document),
        _ => None,
    }
}

/// Classify a source, or explain why it cannot be handled.
pub fn classify(source: &Source) -> Result<SourceKind, SourceError> {
    if let Some(kind) = source.content_type.as_deref().and_then(kind_for_content_type) {
        debug!(name = %source.name, ?kind, "Classified by declared content type");
        return Ok(kind);
    }

    match source.extension() {
        Some(ext) => match kind_for_extension(&ext) {
            Some(kind) => {
                debug!(name = %source.name, ?kind, "Classified by extension");
                Ok(kind)
            }
            None => Err(SourceError::unsupported(
                &source.name,
                format!("extension '{ext}' is not a supported image or document type"),
            )),
        },
        None => Err(SourceError::unsupported(
            &source.name,
            match source.content_type.as_deref() {
                Some(ct) => format!("unrecognised content type '{ct}' and no file extension"),
                None => "no content type and no file extension".to_string(),
            },
        )),
    }
}
