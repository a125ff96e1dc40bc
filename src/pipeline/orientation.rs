//! EXIF orientation lookup.
//!
//! Best effort: anything other than a readable orientation tag of 3, 6 or 8
//! resolves to [`Rotation::None`]. Mirrored orientations (2, 4, 5, 7) are
//! treated as upright.

use std::io::Cursor;
use tracing::debug;

/// Rotation applied to a raster before it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    None,
    /// 90° clockwise.
    Clockwise,
    /// 90° counter-clockwise.
    CounterClockwise,
    Half,
}

impl Rotation {
    /// Signed angle in degrees: 0, 90, -90 or 180.
    pub fn degrees(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Clockwise => 90,
            Self::CounterClockwise => -90,
            Self::Half => 180,
        }
    }

    /// Whether width and height trade places once the rotation is applied.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Clockwise | Self::CounterClockwise)
    }

    /// Map a raw EXIF orientation value.
    pub fn from_exif(tag: u32) -> Self {
        match tag {
            6 => Self::Clockwise,
            8 => Self::CounterClockwise,
            3 => Self::Half,
            _ => Self::None,
        }
    }
}

/// Read the orientation tag from encoded raster bytes.
pub fn resolve_orientation(bytes: &[u8]) -> Rotation {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No readable EXIF block: {e}");
            return Rotation::None;
        }
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(Rotation::from_exif)
        .unwrap_or_default()
}
