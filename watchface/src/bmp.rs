//! Reader and writer for "BM"-signature bitmap files.
//!
//! Writing always emits a BITMAPV4HEADER (108-byte DIB) with a negative
//! height so the rows are stored top-down, matching the canonical image
//! buffer. Reading accepts the classic 40-byte header as well as the 108
//! and 124 byte variants, at 16, 24 or 32 bits per pixel.

use crate::bytes;
use crate::error::Error;
use crate::image::{Compression, Image};

const SIGNATURE: u16 = 0x4D42;
const FILE_HEADER_SIZE: usize = 14;
const V4_DIB_SIZE: usize = 108;
const V4_DATA_OFFSET: usize = FILE_HEADER_SIZE + V4_DIB_SIZE;

/// 72 dpi in pixels per metre.
const RESOLUTION: u32 = 2835;

const MASK_R: u32 = 0xF800;
const MASK_G: u32 = 0x07E0;
const MASK_B: u32 = 0x001F;

pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Expand RGB565 to RGB888, replicating the top bits into the low bits so
/// white stays white.
pub fn rgb565_to_rgb888(pixel: u16) -> (u8, u8, u8) {
    let r5 = (pixel >> 11) as u8;
    let g6 = ((pixel >> 5) & 0x3F) as u8;
    let b5 = (pixel & 0x1F) as u8;
    ((r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2))
}

/// Rows are padded to a multiple of four bytes.
fn row_stride(width: u32, bpp: u16) -> usize {
    ((width as usize * (bpp as usize / 8)) + 3) & !3
}

/// Serialize an uncompressed image as a bitmap file at 16 or 24 bpp.
pub fn write_bmp(image: &Image, bpp: u16) -> Result<Vec<u8>, Error> {
    if image.compression != Compression::None {
        return Err(Error::Unsupported("writing a compressed image as a bitmap"));
    }
    if bpp != 16 && bpp != 24 {
        return Err(Error::UnsupportedBitDepth(bpp));
    }

    let stride = row_stride(image.width, bpp);
    let data_size = stride * image.height as usize;
    let mut out = vec![0u8; V4_DATA_OFFSET + data_size];

    bytes::put_u16(&mut out, 0, SIGNATURE)?;
    bytes::put_u32(&mut out, 2, (V4_DATA_OFFSET + data_size) as u32)?;
    bytes::put_u32(&mut out, 10, V4_DATA_OFFSET as u32)?;
    bytes::put_u32(&mut out, 14, V4_DIB_SIZE as u32)?;
    bytes::put_u32(&mut out, 18, image.width)?;
    bytes::put_u32(&mut out, 22, (-(image.height as i32)) as u32)?;
    bytes::put_u16(&mut out, 26, 1)?; // planes
    bytes::put_u16(&mut out, 28, bpp)?;
    if bpp == 16 {
        bytes::put_u32(&mut out, 30, 3)?; // BI_BITFIELDS
        bytes::put_u32(&mut out, 54, MASK_R)?;
        bytes::put_u32(&mut out, 58, MASK_G)?;
        bytes::put_u32(&mut out, 62, MASK_B)?;
    }
    bytes::put_u32(&mut out, 34, data_size as u32)?;
    bytes::put_u32(&mut out, 38, RESOLUTION)?;
    bytes::put_u32(&mut out, 42, RESOLUTION)?;

    let w = image.width as usize;
    for y in 0..image.height as usize {
        let src = &image.data[2 * w * y..2 * w * (y + 1)];
        let dst = V4_DATA_OFFSET + y * stride;
        if bpp == 16 {
            out[dst..dst + 2 * w].copy_from_slice(src);
        } else {
            for x in 0..w {
                let pixel = u16::from_le_bytes([src[2 * x], src[2 * x + 1]]);
                let (r, g, b) = rgb565_to_rgb888(pixel);
                out[dst + 3 * x] = b;
                out[dst + 3 * x + 1] = g;
                out[dst + 3 * x + 2] = r;
            }
        }
    }

    Ok(out)
}

/// A background to composite translucent 32-bpp pixels against, anchored at
/// `(x, y)` within the background image.
#[derive(Debug, Clone, Copy)]
pub struct Background<'a> {
    pub image: &'a Image,
    pub x: u32,
    pub y: u32,
}

/// Parse a bitmap file into the canonical RGB565 buffer.
///
/// 24-bpp input keeps the top 5/6/5 bits of each channel. 32-bpp input
/// without a background discards alpha; with a background each pixel is
/// alpha-composited before quantisation. The output is always top-down.
pub fn read_bmp(data: &[u8], background: Option<Background<'_>>) -> Result<Image, Error> {
    if data.len() < FILE_HEADER_SIZE + 40 {
        return Err(Error::TooShort {
            what: "bitmap file",
            need: FILE_HEADER_SIZE + 40,
            len: data.len(),
        });
    }

    let signature = bytes::get_u16(data, 0)?;
    if signature != SIGNATURE {
        return Err(Error::BadSignature(signature));
    }
    if bytes::get_u16(data, 6)? != 0 || bytes::get_u16(data, 8)? != 0 {
        return Err(Error::MalformedBitmap("reserved fields are not zero"));
    }
    let data_offset = bytes::get_u32(data, 10)? as usize;

    let dib_size = bytes::get_u32(data, 14)?;
    if dib_size != 40 && dib_size != 108 && dib_size != 124 {
        return Err(Error::MalformedBitmap("unrecognised DIB header size"));
    }

    let width = bytes::get_u32(data, 18)? as i32;
    let raw_height = bytes::get_u32(data, 22)? as i32;
    let top_down = raw_height < 0;
    let height = raw_height.unsigned_abs();
    if width <= 0 || height == 0 {
        return Err(Error::BadDimensions {
            width: width.max(0) as u32,
            height,
        });
    }
    let width = width as u32;

    if bytes::get_u16(data, 26)? != 1 {
        return Err(Error::MalformedBitmap("plane count is not 1"));
    }
    let bpp = bytes::get_u16(data, 28)?;
    if bpp != 16 && bpp != 24 && bpp != 32 {
        return Err(Error::UnsupportedBitDepth(bpp));
    }
    let compression = bytes::get_u32(data, 30)?;

    if bpp == 16 {
        if compression != 3 {
            return Err(Error::MalformedBitmap("16 bpp requires bit-field masks"));
        }
        let (r, g, b) = (
            bytes::get_u32(data, 54)?,
            bytes::get_u32(data, 58)?,
            bytes::get_u32(data, 62)?,
        );
        if (r, g, b) != (MASK_R, MASK_G, MASK_B) {
            return Err(Error::BadChannelMasks { r, g, b });
        }
    } else if compression != 0 {
        return Err(Error::MalformedBitmap("compressed pixel data"));
    }

    let stride = row_stride(width, bpp);
    let declared_size = bytes::get_u32(data, 34)?;
    if declared_size != 0 {
        let declared_row = declared_size / height;
        if declared_row < width * (bpp as u32 / 8) {
            return Err(Error::BadRowSize {
                row: declared_row,
                width,
            });
        }
    }

    let need = data_offset + stride * height as usize;
    if need > data.len() {
        return Err(Error::DataPastEof {
            need,
            len: data.len(),
        });
    }

    if let Some(bg) = background {
        if bg.image.compression != Compression::None {
            return Err(Error::Unsupported("compressed background image"));
        }
        if bg.x + width > bg.image.width || bg.y + height > bg.image.height {
            return Err(Error::BackgroundTooSmall);
        }
    }

    let w = width as usize;
    let mut out = Vec::with_capacity(2 * w * height as usize);
    for y in 0..height {
        let src_row = if top_down { y } else { height - 1 - y };
        let row = data_offset + src_row as usize * stride;
        match bpp {
            16 => out.extend_from_slice(&data[row..row + 2 * w]),
            24 => {
                for x in 0..w {
                    let b = data[row + 3 * x];
                    let g = data[row + 3 * x + 1];
                    let r = data[row + 3 * x + 2];
                    out.extend_from_slice(&rgb888_to_rgb565(r, g, b).to_le_bytes());
                }
            }
            _ => {
                for x in 0..w {
                    let b = data[row + 4 * x];
                    let g = data[row + 4 * x + 1];
                    let r = data[row + 4 * x + 2];
                    let a = data[row + 4 * x + 3];
                    let pixel = match background {
                        Some(bg) => {
                            let behind = bg.image.pixel(bg.x + x as u32, bg.y + y)?;
                            let (br, bgc, bb) = rgb565_to_rgb888(behind);
                            rgb888_to_rgb565(
                                composite(a, r, br),
                                composite(a, g, bgc),
                                composite(a, b, bb),
                            )
                        }
                        None => rgb888_to_rgb565(r, g, b),
                    };
                    out.extend_from_slice(&pixel.to_le_bytes());
                }
            }
        }
    }

    Image::from_raw(width, height, out)
}

/// 8-bit alpha blend of one channel: `((255-a)*bg + a*fg + 127) / 255`.
fn composite(alpha: u8, fg: u8, bg: u8) -> u8 {
    let a = alpha as u32;
    (((255 - a) * bg as u32 + a * fg as u32 + 127) / 255) as u8
}
