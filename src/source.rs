//! Input units: named byte blobs with an optional declared media type.
//!
//! A [`Source`] owns its bytes outright. It is created by reading user input
//! or expanding an archive, handed to exactly one pipeline stage at a time,
//! and dropped once its artifacts exist.

use std::fmt;

/// Media kinds the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// JPEG, PNG, WebP or HEIC.
    RasterImage,
    /// PDF.
    Document,
    /// ZIP container, flattened before classification.
    Archive,
}

/// Extensions accepted anywhere (loose files and archive entries).
pub const MEDIA_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "pdf", "webp"];

/// Extensions that mark a file as an archive to flatten.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip"];

/// A named binary blob plus an optional declared content type.
#[derive(Clone)]
pub struct Source {
    /// Used for ordering and extension sniffing. Archive entries keep their
    /// full in-archive path (`chapter1/p01.jpg`).
    pub name: String,
    pub bytes: Vec<u8>,
    /// MIME type declared by whoever supplied the file, if any.
    pub content_type: Option<String>,
}

impl Source {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lower-cased extension after the last `.`, if the name has one.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    /// Whether this source should be expanded by the container flattener.
    pub fn is_archive(&self) -> bool {
        let declared = self
            .content_type
            .as_deref()
            .map(|ct| media_kind_for_content_type(ct) == Some(MediaKind::Archive))
            .unwrap_or(false);
        declared
            || self
                .extension()
                .is_some_and(|ext| ARCHIVE_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Lower-cased extension of a file name. `None` for names without a dot or
/// with a trailing dot.
pub fn extension_of(name: &str) -> Option<String> {
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Map a declared MIME type to a media kind. Parameters (`; charset=…`) are
/// ignored. Unknown types return `None` so the caller can fall back to the
/// extension.
pub fn media_kind_for_content_type(content_type: &str) -> Option<MediaKind> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" | "image/png" | "image/webp" | "image/heic"
        | "image/heif" => Some(MediaKind::RasterImage),
        "application/pdf" => Some(MediaKind::Document),
        "application/zip" | "application/x-zip-compressed" => Some(MediaKind::Archive),
        _ => None,
    }
}

/// Content type for an allow-listed extension, used when labelling archive
/// entries.
pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "pdf" => Some("application/pdf"),
        "zip" => Some("application/zip"),
        _ => None,
    }
}
