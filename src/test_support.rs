//! Fixture builders shared by unit tests.
//!
//! `tests/common/mod.rs` carries the same builders, under the same names, for
//! the integration tests. Change both together.

use crate::error::SourceError;
use crate::pipeline::decode::{DocumentDecoder, HeicTranscoder, PageViewport};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Write};

/// A left-to-right gradient so rotations are observable in pixel data.
pub(crate) fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / width.max(1)) as u8;
        Rgb([v, 64, 255 - v])
    })
}

pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Splice a minimal EXIF APP1 segment carrying only the orientation tag
/// right after the JPEG SOI marker.
pub(crate) fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II\x2a\x00\x08\x00\x00\x00");
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut app1 = Vec::new();
    app1.extend_from_slice(&[0xFF, 0xE1]);
    app1.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(&tiff);

    let mut out = Vec::with_capacity(jpeg.len() + app1.len());
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Build a ZIP in memory. `None` contents add a directory entry.
pub(crate) fn zip_bytes(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, contents) in entries {
        match contents {
            Some(bytes) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(bytes).unwrap();
            }
            None => writer.add_directory(*name, options).unwrap(),
        }
    }
    writer.finish().unwrap().into_inner()
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}

/// A stored single-entry ZIP64 archive whose headers claim
/// `declared_size` uncompressed bytes regardless of `data`.
pub(crate) fn zip64_bytes(name: &str, data: &[u8], declared_size: u64) -> Vec<u8> {
    let crc = crc32(data);
    let mut extra = Vec::new();
    extra.extend_from_slice(&0x0001u16.to_le_bytes());
    extra.extend_from_slice(&16u16.to_le_bytes());
    extra.extend_from_slice(&declared_size.to_le_bytes());
    extra.extend_from_slice(&(data.len() as u64).to_le_bytes());

    let mut out = Vec::new();
    out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes()); // version needed
    out.extend_from_slice(&[0, 0, 0, 0]); // flags, stored
    out.extend_from_slice(&[0, 0, 0x21, 0]); // time, date
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&extra);
    out.extend_from_slice(data);

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes()); // made by
    out.extend_from_slice(&45u16.to_le_bytes()); // needed
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.extend_from_slice(&[0, 0, 0x21, 0]);
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    out.extend_from_slice(&[0; 6]); // comment len, disk, internal attrs
    out.extend_from_slice(&[0; 4]); // external attrs
    out.extend_from_slice(&0u32.to_le_bytes()); // local header offset
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&extra);
    let cd_size = out.len() as u32 - cd_offset;

    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

/// Document decoder that paints page `i` a flat [`Self::shade`] grey.
/// Bytes starting with `corrupt` fail to open.
pub(crate) struct MockDocumentDecoder {
    pub pages: Vec<PageViewport>,
}

impl MockDocumentDecoder {
    pub(crate) fn letter(pages: usize) -> Self {
        Self {
            pages: vec![
                PageViewport {
                    width: 612.0,
                    height: 792.0,
                };
                pages
            ],
        }
    }

    /// Grey level page `i` (0-based) is painted with.
    pub(crate) fn shade(i: usize) -> u8 {
        (i * 60 % 256) as u8
    }
}

impl DocumentDecoder for MockDocumentDecoder {
    fn render_pages(
        &self,
        name: &str,
        bytes: &[u8],
        _password: Option<&str>,
        size_for: &dyn Fn(PageViewport) -> (u32, u32),
    ) -> Result<Vec<DynamicImage>, SourceError> {
        if bytes.starts_with(b"corrupt") {
            return Err(SourceError::decode(name, "xref table is damaged"));
        }
        Ok(self
            .pages
            .iter()
            .enumerate()
            .map(|(i, vp)| {
                let (w, h) = size_for(*vp);
                let s = Self::shade(i);
                DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([s, s, s])))
            })
            .collect())
    }
}

/// HEIC transcoder that treats the payload as an already-encoded JPEG.
pub(crate) struct PassthroughHeic;

impl HeicTranscoder for PassthroughHeic {
    fn transcode(&self, name: &str, bytes: &[u8], _quality: u8) -> Result<Vec<u8>, SourceError> {
        if bytes.starts_with(&[0xFF, 0xD8]) {
            Ok(bytes.to_vec())
        } else {
            Err(SourceError::decode(name, "no ftyp box"))
        }
    }
}
