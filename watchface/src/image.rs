//! The canonical in-memory RGB565 image buffer.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Identifier found at the start of every RLE-encoded payload
/// (bytes 0x08, 0x21 on disk).
pub const RLE_IDENTIFIER: u16 = 0x2108;

/// How an [`Image`]'s payload is encoded.
///
/// `TryRle` is only meaningful when creating new packages: it asks the
/// encoder to compress when that shrinks the payload and fall back to
/// uncompressed otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    RleLine,
    RleBasic,
    TryRle,
}

impl Compression {
    pub fn as_str(self) -> &'static str {
        match self {
            Compression::None => "NONE",
            Compression::RleLine => "RLE_LINE",
            Compression::RleBasic => "RLE_BASIC",
            Compression::TryRle => "TRY_RLE",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "NONE" => Ok(Compression::None),
            "RLE_LINE" => Ok(Compression::RleLine),
            "RLE_BASIC" => Ok(Compression::RleBasic),
            "TRY_RLE" => Ok(Compression::TryRle),
            _ => Err(()),
        }
    }
}

/// An RGB565 image.
///
/// With `Compression::None` the payload holds `2 * width * height` bytes of
/// row-major little-endian RGB565 pixels. With an RLE compression it holds
/// the encoded stream, starting with [`RLE_IDENTIFIER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub compression: Compression,
    pub data: Vec<u8>,
}

impl Image {
    /// Wrap an uncompressed pixel buffer, validating its length.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::BadDimensions { width, height });
        }
        let need = 2 * width as usize * height as usize;
        if data.len() != need {
            return Err(Error::TooShort {
                what: "RGB565 pixel buffer",
                need,
                len: data.len(),
            });
        }
        Ok(Image {
            width,
            height,
            compression: Compression::None,
            data,
        })
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Fetch one pixel. Only meaningful for uncompressed images; used by
    /// the compositing path and tests.
    pub fn pixel(&self, x: u32, y: u32) -> Result<u16, Error> {
        debug_assert_eq!(self.compression, Compression::None);
        crate::bytes::get_u16(&self.data, 2 * (y as usize * self.width as usize + x as usize))
    }
}

/// Swap the byte order of every 16-bit pixel in place.
///
/// Raw package payloads store pixels byte-swapped relative to the canonical
/// buffer; this converts between the two.
pub fn swap_pixel_bytes(data: &mut [u8]) {
    for pair in data.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
}
