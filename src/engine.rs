//! Process-wide location of the pdfium shared library.
//!
//! The location is recorded once, at the setup of the first run that asks
//! for it, and never changes afterwards. Each document render binds a fresh
//! [`Pdfium`] handle from it inside the blocking task that uses it.

use crate::config::PdfiumLibrary;
use crate::error::IngestError;
use pdfium_render::prelude::Pdfium;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

static LIBRARY: OnceLock<PdfiumLibrary> = OnceLock::new();

/// Record where pdfium lives for the rest of the process.
///
/// An explicit path must exist. Later calls with a different location keep
/// the first one and log a warning.
pub fn configure(library: &PdfiumLibrary) -> Result<(), IngestError> {
    if let PdfiumLibrary::Path(path) = library {
        if !path.exists() {
            return Err(IngestError::EngineUnavailable { path: path.clone() });
        }
    }

    let current = LIBRARY.get_or_init(|| {
        info!(?library, "PDF engine location configured");
        library.clone()
    });
    if current != library {
        warn!(
            requested = ?library,
            active = ?current,
            "PDF engine location is already set for this process; keeping the first"
        );
    }
    Ok(())
}

/// The configured location, or [`PdfiumLibrary::Auto`] if no run set one.
pub fn configured() -> PdfiumLibrary {
    LIBRARY.get().cloned().unwrap_or_default()
}

fn env_library_path() -> Option<PathBuf> {
    std::env::var_os("PDFIUM_LIB_PATH")
        .map(PathBuf::from)
        .filter(|p| p.exists())
}

/// Bind pdfium from the configured location.
pub fn bind() -> Result<Pdfium, String> {
    let bindings = match configured() {
        PdfiumLibrary::Path(path) => {
            debug!(path = %path.display(), "Binding pdfium");
            Pdfium::bind_to_library(&path)
        }
        PdfiumLibrary::System => Pdfium::bind_to_system_library(),
        PdfiumLibrary::Auto => match env_library_path() {
            Some(path) => {
                debug!(path = %path.display(), "Binding pdfium from PDFIUM_LIB_PATH");
                Pdfium::bind_to_library(&path)
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        },
    };

    bindings
        .map(Pdfium::new)
        .map_err(|e| format!("PDF engine unavailable: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_explicit_path_is_rejected() {
        let missing = PdfiumLibrary::Path(PathBuf::from("/definitely/not/here/libpdfium.so"));
        let err = configure(&missing).unwrap_err();
        assert!(matches!(err, IngestError::EngineUnavailable { .. }));
    }

    #[test]
    fn auto_configuration_always_succeeds() {
        assert!(configure(&PdfiumLibrary::Auto).is_ok());
        // Whatever won the race, a location is now recorded.
        assert!(LIBRARY.get().is_some());
    }
}
