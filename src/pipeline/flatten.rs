//! Container flattening and natural ordering.
//!
//! ZIP inputs are expanded one level: directory entries are skipped and
//! entries outside the media allow-list (`jpg jpeg png heic pdf webp`) are
//! dropped silently. Loose files pass through untouched. The merged list is
//! then sorted by name in natural order, so `page2` precedes `page10`
//! whatever order the files were uploaded in.
//!
//! A ZIP that cannot be opened or read is not skipped: it becomes a
//! [`SourceError::Decode`] for the archive as a whole. So does an entry
//! whose declared size exceeds [`MAX_ENTRY_BYTES`] or disagrees with what
//! it actually inflates to.

use crate::error::SourceError;
use crate::source::{content_type_for_extension, extension_of, Source, MEDIA_EXTENSIONS};
use std::cmp::Ordering;
use std::io::{Cursor, Read};
use tracing::{debug, info, warn};

/// Largest entry an archive may contribute (256 MiB).
pub const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

/// Result of flattening: ordered sources plus archives that failed to open.
#[derive(Debug, Default)]
pub struct Flattened {
    pub sources: Vec<Source>,
    pub failures: Vec<SourceError>,
}

/// Expand archives and sort everything by natural name order.
pub fn flatten(inputs: Vec<Source>) -> Flattened {
    let mut out = Flattened::default();

    for input in inputs {
        if input.is_archive() {
            match expand_archive(&input) {
                Ok(entries) => {
                    info!(archive = %input.name, entries = entries.len(), "Expanded archive");
                    out.sources.extend(entries);
                }
                Err(e) => {
                    warn!(archive = %input.name, error = %e, "Archive could not be read");
                    out.failures.push(e);
                }
            }
        } else {
            out.sources.push(input);
        }
    }

    sort_sources(&mut out.sources);
    out
}

/// Open a ZIP and return its allow-listed file entries.
pub fn expand_archive(archive: &Source) -> Result<Vec<Source>, SourceError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes.as_slice()))
        .map_err(|e| SourceError::decode(&archive.name, e))?;

    let mut sources = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| SourceError::decode(&archive.name, e))?;

        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let Some(ext) = extension_of(&name).filter(|e| MEDIA_EXTENSIONS.contains(&e.as_str()))
        else {
            debug!(archive = %archive.name, entry = %name, "Skipping entry outside allow-list");
            continue;
        };

        let declared = entry.size();
        if declared > MAX_ENTRY_BYTES {
            return Err(SourceError::decode(
                &archive.name,
                format!("entry '{name}' declares {declared} bytes, limit is {MAX_ENTRY_BYTES}"),
            ));
        }

        // The header is untrusted: never reserve more than the archive itself.
        let hint = declared.min(archive.bytes.len() as u64) as usize;
        let mut bytes = Vec::with_capacity(hint);
        (&mut entry)
            .take(MAX_ENTRY_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| SourceError::decode(&archive.name, format!("entry '{name}': {e}")))?;
        if bytes.len() as u64 != declared {
            return Err(SourceError::decode(
                &archive.name,
                format!("entry '{name}' declares {declared} bytes but holds {}", bytes.len()),
            ));
        }

        let mut source = Source::new(name, bytes);
        if let Some(ct) = content_type_for_extension(&ext) {
            source = source.with_content_type(ct);
        }
        sources.push(source);
    }

    Ok(sources)
}

/// Sort sources by natural name order. Identical names fall back to byte
/// content so the result never depends on input order.
pub fn sort_sources(sources: &mut [Source]) {
    sources.sort_by(|a, b| {
        natural_cmp(&a.name, &b.name)
            .then_with(|| a.bytes.len().cmp(&b.bytes.len()))
            .then_with(|| a.bytes.cmp(&b.bytes))
    });
}

enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> impl Iterator<Item = Chunk<'_>> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let is_digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != is_digit)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(if is_digit {
            Chunk::Digits(head)
        } else {
            Chunk::Text(head)
        })
    })
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        // Equal values: fewer leading zeros first.
        .then_with(|| a.len().cmp(&b.len()))
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Numeric-aware, case-insensitive comparison of two names.
///
/// Digit runs compare by value and text runs compare case-folded; a text run
/// sorts after a digit run at the same position. Ties are broken by the raw
/// string so distinct names never compare equal.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);
    let mut tie = Ordering::Equal;

    loop {
        let ord = match (left.next(), right.next()) {
            (None, None) => return tie.then_with(|| a.cmp(b)),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Chunk::Digits(x)), Some(Chunk::Digits(y))) => {
                let value = cmp_digits(x.trim_start_matches('0'), y.trim_start_matches('0'));
                if value == Ordering::Equal && tie == Ordering::Equal {
                    tie = cmp_digits(x, y);
                }
                value
            }
            (Some(Chunk::Text(x)), Some(Chunk::Text(y))) => {
                let folded = x
                    .chars()
                    .flat_map(char::to_lowercase)
                    .cmp(y.chars().flat_map(char::to_lowercase));
                if folded == Ordering::Equal && tie == Ordering::Equal {
                    tie = cmp_text(x, y);
                }
                folded
            }
            (Some(Chunk::Digits(_)), Some(Chunk::Text(_))) => Ordering::Less,
            (Some(Chunk::Text(_)), Some(Chunk::Digits(_))) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}
