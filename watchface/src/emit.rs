//! Package emitter. Only the variant C layout is written; A is legacy and the
//! B payload compression scheme is unknown.

use crate::bytes;
use crate::descriptor::Descriptor;
use crate::error::{Error, Warning};
use crate::image::{swap_pixel_bytes, Compression, Image};
use crate::package::{Variant, TABLE_SLOTS};
use crate::rle;

/// Source bytes for one payload slot, in offset-table order.
pub enum PayloadSource {
    /// A decoded bitmap. Stored RLE-compressed when the descriptor asks for
    /// it and compression actually shrinks the payload.
    Bitmap(Image),
    /// Pre-encoded bytes appended to the package untouched.
    Raw(Vec<u8>),
}

/// Assemble a complete package file from a descriptor and its payloads.
///
/// Payloads are packed back to back after the header; the offset table is
/// filled with their running offsets relative to the end of the header.
pub fn build(
    descriptor: &Descriptor,
    payloads: Vec<PayloadSource>,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<u8>, Error> {
    match descriptor.variant {
        Variant::C => {}
        Variant::A => return Err(Error::Unsupported("emitting variant A packages")),
        Variant::B => return Err(Error::Unsupported("emitting variant B packages")),
    }
    if payloads.len() != descriptor.blob_count as usize {
        return Err(Error::PayloadCount {
            expected: descriptor.blob_count as usize,
            actual: payloads.len(),
        });
    }
    if payloads.len() > TABLE_SLOTS {
        return Err(Error::TooManyEntries {
            count: payloads.len(),
            max: TABLE_SLOTS,
        });
    }
    if descriptor.entries.len() > descriptor.variant.entry_slots() {
        return Err(Error::TooManyEntries {
            count: descriptor.entries.len(),
            max: descriptor.variant.entry_slots(),
        });
    }

    let header_len = descriptor.variant.header_len();
    let mut out = vec![0u8; header_len];
    let mut offsets = Vec::with_capacity(payloads.len());

    for (index, payload) in payloads.into_iter().enumerate() {
        offsets.push((out.len() - header_len) as u32);
        match payload {
            PayloadSource::Bitmap(image) => {
                let requested = descriptor.compression_for(index);
                if requested == Compression::RleBasic {
                    crate::error::warn(
                        warnings,
                        format!("blob {index}: RLE_BASIC is not written, trying RLE_LINE"),
                    );
                }
                let encoded = if requested == Compression::None {
                    None
                } else {
                    rle::encode_line(&image)?
                };
                match encoded {
                    Some(compressed) => {
                        log::debug!(
                            "blob {index}: RLE_LINE {} -> {} bytes",
                            image.size(),
                            compressed.size()
                        );
                        out.extend_from_slice(&compressed.data);
                    }
                    None => {
                        if requested != Compression::None {
                            log::debug!("blob {index}: not compressed");
                        }
                        // Uncompressed payloads are stored in watch byte
                        // order, opposite to the canonical buffer.
                        let mut data = image.data;
                        swap_pixel_bytes(&mut data);
                        out.extend_from_slice(&data);
                    }
                }
            }
            PayloadSource::Raw(data) => out.extend_from_slice(&data),
        }
    }

    write_header(&mut out, descriptor, &offsets)?;
    Ok(out)
}

fn write_header(out: &mut [u8], descriptor: &Descriptor, offsets: &[u32]) -> Result<(), Error> {
    bytes::put_u8(out, 0, descriptor.file_id)?;
    bytes::put_u8(out, 1, descriptor.data_count())?;
    bytes::put_u8(out, 2, descriptor.blob_count)?;
    bytes::put_u16(out, 3, descriptor.face_number)?;

    let mut at = 5;
    for entry in &descriptor.entries {
        bytes::put_u8(out, at, entry.kind)?;
        bytes::put_u8(out, at + 1, entry.index)?;
        bytes::put_u16(out, at + 2, entry.x)?;
        bytes::put_u16(out, at + 4, entry.y)?;
        bytes::put_u16(out, at + 6, entry.width)?;
        bytes::put_u16(out, at + 8, entry.height)?;
        at += descriptor.variant.entry_len();
    }

    let offsets_at = descriptor.variant.offsets_at();
    for (i, &offset) in offsets.iter().enumerate() {
        bytes::put_u32(out, offsets_at + 4 * i, offset)?;
    }

    // The animation frame count claims size slot 0, so no per-blob size
    // hints are written.
    let sizes_at = descriptor.variant.sizes_at();
    bytes::put_u16(
        out,
        sizes_at + 2 * descriptor.variant.animation_slot(),
        descriptor.animation_frames,
    )?;
    Ok(())
}
