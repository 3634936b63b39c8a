//! Run-length codecs for package payloads.
//!
//! Both encodings start with the identifier bytes 0x08, 0x21 and store runs
//! as three bytes: `pixel_lo, pixel_hi, count`. The line-indexed form
//! prefixes the runs with one 16-bit end-of-line offset per row; the basic
//! form has no index and lets runs spill across row boundaries.

use crate::bytes;
use crate::error::{warn, Error, Warning};
use crate::image::{Compression, Image, RLE_IDENTIFIER};

const RUN_BYTES: usize = 3;
const MAX_RUN: usize = 255;

fn check_identifier(payload: &[u8]) -> Result<(), Error> {
    if bytes::get_u16(payload, 0)? != RLE_IDENTIFIER {
        return Err(Error::Rle("missing RLE identifier"));
    }
    Ok(())
}

/// Expand a line-indexed RLE payload into an uncompressed image.
///
/// Each row decodes to exactly `width` pixels: runs overflowing the row are
/// clamped (with a diagnostic), short rows are padded with zero pixels.
pub fn decode_line(
    payload: &[u8],
    width: u32,
    height: u32,
    warnings: &mut Vec<Warning>,
) -> Result<Image, Error> {
    check_identifier(payload)?;
    if width == 0 || height == 0 {
        return Err(Error::BadDimensions { width, height });
    }
    let w = width as usize;
    let h = height as usize;

    let mut end_of_line = Vec::with_capacity(h);
    for y in 0..h {
        let end = bytes::get_u16(payload, 2 + 2 * y)? as usize;
        if end > payload.len() {
            return Err(Error::Rle("line index points past the end of the payload"));
        }
        end_of_line.push(end);
    }

    let mut out = vec![0u8; 2 * w * h];
    let mut src = 2 + 2 * h;
    for y in 0..h {
        let end = end_of_line[y];
        if end < src {
            return Err(Error::Rle("line index is not non-decreasing"));
        }

        let mut x = 0usize;
        let mut clamped = false;
        while src < end {
            if src + RUN_BYTES > end {
                return Err(Error::Rle("truncated run at end of line"));
            }
            let lo = payload[src];
            let hi = payload[src + 1];
            let count = payload[src + 2] as usize;
            src += RUN_BYTES;

            for _ in 0..count {
                if x >= w {
                    clamped = true;
                    break;
                }
                out[2 * (y * w + x)] = lo;
                out[2 * (y * w + x) + 1] = hi;
                x += 1;
            }
        }
        if clamped {
            warn(
                warnings,
                format!("RLE line {y} holds more than {width} pixels, clamping"),
            );
        }
    }

    Image::from_raw(width, height, out)
}

/// Expand a basic (un-indexed) RLE payload into an uncompressed image.
///
/// Runs continue across row boundaries until `width * height` pixels have
/// been produced. A truncated stream is an error; a zero-length run is a
/// no-op.
pub fn decode_basic(payload: &[u8], width: u32, height: u32) -> Result<Image, Error> {
    check_identifier(payload)?;
    if width == 0 || height == 0 {
        return Err(Error::BadDimensions { width, height });
    }
    let total = width as usize * height as usize;

    let mut out = vec![0u8; 2 * total];
    let mut src = 2usize;
    let mut filled = 0usize;
    let (mut lo, mut hi) = (0u8, 0u8);
    let mut remaining = 0usize;
    while filled < total {
        if remaining == 0 {
            if src + RUN_BYTES > payload.len() {
                return Err(Error::Rle("insufficient data for basic RLE image"));
            }
            lo = payload[src];
            hi = payload[src + 1];
            remaining = payload[src + 2] as usize;
            src += RUN_BYTES;
            continue;
        }
        out[2 * filled] = lo;
        out[2 * filled + 1] = hi;
        filled += 1;
        remaining -= 1;
    }

    Image::from_raw(width, height, out)
}

/// Compress an uncompressed image with line-indexed RLE.
///
/// Returns `None` when compression does not pay off: the encoded payload
/// would not be strictly smaller than the input, or an end-of-line offset
/// would not fit in 16 bits.
pub fn encode_line(image: &Image) -> Result<Option<Image>, Error> {
    if image.compression != Compression::None {
        return Err(Error::Rle("encoder input must be uncompressed"));
    }
    let w = image.width as usize;
    let h = image.height as usize;
    let raw_size = 2 * w * h;

    // Cheapest conceivable encoding: one maximal run per 255 pixels.
    let floor = 2 + 2 * h + RUN_BYTES * w.div_ceil(MAX_RUN) * h;
    if floor >= raw_size || floor > u16::MAX as usize {
        return Ok(None);
    }

    let mut out = vec![0u8; 2 + 2 * h];
    out[..2].copy_from_slice(&RLE_IDENTIFIER.to_le_bytes());

    for y in 0..h {
        let row = &image.data[2 * w * y..2 * w * (y + 1)];
        let mut x = 0usize;
        while x < w {
            let lo = row[2 * x];
            let hi = row[2 * x + 1];
            let mut count = 1usize;
            while count < MAX_RUN
                && x + count < w
                && row[2 * (x + count)] == lo
                && row[2 * (x + count) + 1] == hi
            {
                count += 1;
            }
            out.extend_from_slice(&[lo, hi, count as u8]);
            x += count;
        }

        let end = out.len();
        if end > u16::MAX as usize || end >= raw_size {
            return Ok(None);
        }
        bytes::put_u16(&mut out, 2 + 2 * y, end as u16)?;
    }

    Ok(Some(Image {
        width: image.width,
        height: image.height,
        compression: Compression::RleLine,
        data: out,
    }))
}
