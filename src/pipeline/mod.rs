//! Pipeline stages for album ingestion.
//!
//! Each submodule implements exactly one transformation step, so each can
//! be tested alone and a backend (pdfium, libheif) can be swapped without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ flatten ──▶ classify ──▶ heic ──▶ orientation ──▶ normalize ──▶ thumbnail
//! (paths)   (zip, sort)  (kind)       │                                       ▲
//!                           └────────▶ render (pdfium, one raster per page) ──┘
//! ```
//!
//! 1. [`input`]       read user-supplied paths into owned sources
//! 2. [`flatten`]     expand ZIP archives and sort everything naturally
//! 3. [`classify`]    route each source to a [`decode::Decoder`]
//! 4. [`heic`]        transcode HEIC to JPEG before any raster work
//! 5. [`orientation`] EXIF orientation tag to a rotation
//! 6. [`normalize`]   rotate, cap width, encode the full-size page
//! 7. [`render`]      rasterise every document page at the target width
//! 8. [`thumbnail`]   derive the preview from the full-size page
//!
//! [`surface`] is the drawing target shared by 6–8.

pub mod classify;
pub mod decode;
pub mod flatten;
pub mod heic;
pub mod input;
pub mod normalize;
pub mod orientation;
pub mod render;
pub mod surface;
pub mod thumbnail;
