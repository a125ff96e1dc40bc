//! Document rasterisation: every page of a PDF becomes one full-size JPEG.
//!
//! ## Why no upscale clamp?
//!
//! Unlike photos, document pages are always rendered to exactly the target
//! width. A US-letter page is 612 pt wide, so the clamp used for rasters
//! would leave every document page at a blurry 612 px.
//!
//! ## Threading
//!
//! pdfium keeps thread-local state and is not async-safe. Everything here
//! is blocking and runs inside the orchestrator's `spawn_blocking` task.

use crate::config::Quality;
use crate::engine;
use crate::error::SourceError;
use crate::pipeline::decode::{DocumentDecoder, PageViewport};
use crate::pipeline::normalize::{encode_page, EncodedPage};
use crate::pipeline::surface::DrawTransform;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Rounding noise from `target / vw * vw` must not add a pixel column.
const CEIL_EPSILON: f64 = 1e-6;

fn ceil_px(value: f64) -> u32 {
    (value - CEIL_EPSILON).ceil().max(1.0) as u32
}

/// Pixel size of a page rendered to `target_width`.
pub fn document_page_dimensions(viewport: PageViewport, target_width: u32) -> (u32, u32) {
    let vw = viewport.width as f64;
    let vh = viewport.height as f64;
    if vw <= 0.0 || vh <= 0.0 {
        return (target_width.max(1), 1);
    }
    let scale = target_width as f64 / vw;
    (ceil_px(vw * scale), ceil_px(vh * scale))
}

/// Render and encode every page of a document, in page order.
///
/// Any failure loses the whole document; no partial page list is returned.
pub fn rasterize_document(
    name: &str,
    bytes: &[u8],
    decoder: &dyn DocumentDecoder,
    password: Option<&str>,
    target_width: u32,
    quality: Quality,
) -> Result<Vec<EncodedPage>, SourceError> {
    let size_for = |vp: PageViewport| document_page_dimensions(vp, target_width);
    let rendered = decoder.render_pages(name, bytes, password, &size_for)?;
    info!(name, pages = rendered.len(), "Document rendered");

    rendered
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let page = encode_page(
                name,
                page,
                DrawTransform::default(),
                page.width(),
                page.height(),
                quality,
            )?;
            debug!(name, page = i + 1, size = %format!("{}x{}", page.width, page.height), "Encoded page");
            Ok(page)
        })
        .collect()
}

/// [`DocumentDecoder`] backed by pdfium.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumDocumentDecoder;

impl DocumentDecoder for PdfiumDocumentDecoder {
    fn render_pages(
        &self,
        name: &str,
        bytes: &[u8],
        password: Option<&str>,
        size_for: &dyn Fn(PageViewport) -> (u32, u32),
    ) -> Result<Vec<DynamicImage>, SourceError> {
        let pdfium = engine::bind().map_err(|e| SourceError::decode(name, e))?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| SourceError::decode(name, describe_load_error(&e, password.is_some())))?;

        let pages = document.pages();
        debug!(name, pages = pages.len(), "PDF loaded");

        let mut images = Vec::with_capacity(pages.len() as usize);
        for (i, page) in pages.iter().enumerate() {
            let viewport = PageViewport {
                width: page.width().value,
                height: page.height().value,
            };
            let (w, h) = size_for(viewport);
            let config = PdfRenderConfig::new().set_target_size(w as i32, h as i32);

            let bitmap = page.render_with_config(&config).map_err(|e| {
                SourceError::decode(name, format!("page {}: {e:?}", i + 1))
            })?;
            images.push(bitmap.as_image());
        }

        Ok(images)
    }
}

fn describe_load_error(err: &PdfiumError, had_password: bool) -> String {
    let detail = format!("{err:?}");
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            "wrong document password".to_string()
        } else {
            "document is password protected".to_string()
        }
    } else {
        format!("could not open document: {detail}")
    }
}
