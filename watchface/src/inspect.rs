//! Turn a parsed package back into things a person can edit: descriptor text
//! and per-payload bitmaps.

use crate::bmp;
use crate::descriptor::{BlobNote, Descriptor};
use crate::error::{warn, Error, Warning};
use crate::image::{swap_pixel_bytes, Compression, Image, RLE_IDENTIFIER};
use crate::package::{Package, Variant};
use crate::rle;

/// Faces for 240x280 screens carry a selection thumbnail as their final,
/// unreferenced payload.
pub const PREVIEW_WIDTH: u32 = 140;
pub const PREVIEW_HEIGHT: u32 = 163;

/// Everything extracted for one payload.
pub struct BlobDump {
    pub index: usize,
    /// A complete 16 bpp bitmap file, when the payload could be decoded.
    pub bmp: Option<Vec<u8>>,
    /// The payload bytes exactly as stored, when requested.
    pub raw: Option<Vec<u8>>,
}

/// Compression of a stored payload, detected from its identifier bytes.
/// The legacy layout used the unindexed encoding.
pub fn detect_compression(payload: &[u8], variant: Variant) -> Compression {
    let has_identifier = payload.len() >= 2
        && u16::from_le_bytes([payload[0], payload[1]]) == RLE_IDENTIFIER;
    if !has_identifier {
        Compression::None
    } else if variant == Variant::A {
        Compression::RleBasic
    } else {
        Compression::RleLine
    }
}

/// Produce the descriptor text for a package, with observed compression,
/// offset and size noted per payload.
pub fn describe(package: &Package, warnings: &mut Vec<Warning>) -> String {
    let header = &package.header;
    let mut descriptor = Descriptor::from_header(header);

    if header.variant == Variant::B {
        // Payloads are sealed inside one compressed blob; nothing to note.
        return descriptor.serialize();
    }

    let mut notes = Vec::new();
    for index in 0..header.observed_blob_count() {
        let Ok(payload) = package.blob(index) else {
            continue;
        };
        let compression = detect_compression(payload, header.variant);
        descriptor.compression.push((index, compression));
        notes.push(BlobNote {
            index,
            compression,
            offset: header.offsets[index],
            size: payload.len(),
        });
        let hint = header.sizes[index] as usize;
        if hint != 0 && hint != payload.len() && index != header.variant.animation_slot() {
            warn(
                warnings,
                format!(
                    "blob {index}: size table says {hint} bytes but the offsets give {}",
                    payload.len()
                ),
            );
        }
    }
    descriptor.serialize_with_notes(&notes)
}

/// Width and height for a payload, from the layout entry that claims it.
fn blob_dimensions(
    package: &Package,
    index: usize,
    warnings: &mut Vec<Warning>,
) -> Option<(u32, u32)> {
    let header = &package.header;
    if let Some(entry) = header.entry_for_blob(index) {
        let (mut width, mut height) = (entry.width as u32, entry.height as u32);
        if header.variant == Variant::A && entry.kind == 0x00 && (width, height) != (240, 24) {
            // The firmware renders these strips at 240x24 no matter what the
            // entry claims.
            warn(
                warnings,
                format!("blob {index}: overriding {width}x{height} with 240x24 for background strips"),
            );
            width = 240;
            height = 24;
        }
        if width == 0 || height == 0 {
            warn(warnings, format!("blob {index}: entry has a zero dimension"));
            return None;
        }
        Some((width, height))
    } else if index + 1 == header.observed_blob_count() {
        Some((PREVIEW_WIDTH, PREVIEW_HEIGHT))
    } else {
        warn(
            warnings,
            format!("blob {index}: no layout entry claims it, not decoding"),
        );
        None
    }
}

/// Decode one payload to a canonical image.
pub fn decode_blob(
    package: &Package,
    index: usize,
    warnings: &mut Vec<Warning>,
) -> Result<Option<Image>, Error> {
    let Some((width, height)) = blob_dimensions(package, index, warnings) else {
        return Ok(None);
    };
    let payload = package.blob(index)?;
    match detect_compression(payload, package.header.variant) {
        Compression::RleLine => rle::decode_line(payload, width, height, warnings).map(Some),
        Compression::RleBasic => rle::decode_basic(payload, width, height).map(Some),
        _ => {
            let need = 2 * width as usize * height as usize;
            if payload.len() < need {
                return Err(Error::TooShort {
                    what: "uncompressed payload",
                    need,
                    len: payload.len(),
                });
            }
            if payload.len() > need {
                warn(
                    warnings,
                    format!(
                        "blob {index}: {} bytes but {width}x{height} needs {need}",
                        payload.len()
                    ),
                );
            }
            // Stored in watch byte order.
            let mut data = payload[..need].to_vec();
            swap_pixel_bytes(&mut data);
            Ok(Some(Image::from_raw(width, height, data)?))
        }
    }
}

/// Extract every payload of a package. A payload that fails to decode is
/// reported as a warning and skipped; only structural problems abort.
pub fn dump_blobs(
    package: &Package,
    include_raw: bool,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<BlobDump>, Error> {
    if package.header.variant == Variant::B {
        return Err(Error::Unsupported("dumping variant B payloads"));
    }

    let mut dumps = Vec::new();
    for index in 0..package.header.observed_blob_count() {
        let raw = if include_raw {
            Some(package.blob(index)?.to_vec())
        } else {
            None
        };
        let bmp = match decode_blob(package, index, warnings) {
            Ok(Some(image)) => Some(bmp::write_bmp(&image, 16)?),
            Ok(None) => None,
            Err(error) => {
                warn(warnings, format!("blob {index}: {error}"));
                None
            }
        };
        dumps.push(BlobDump { index, bmp, raw });
    }
    Ok(dumps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes;
    use crate::descriptor::Descriptor;
    use crate::emit::{self, PayloadSource};
    use crate::package::LayoutEntry;

    fn solid(width: u32, height: u32, pixel: u16) -> Image {
        let mut data = Vec::new();
        for _ in 0..width * height {
            data.extend_from_slice(&pixel.to_le_bytes());
        }
        Image::from_raw(width, height, data).unwrap()
    }

    fn two_blob_package(compression: Compression) -> Package {
        let descriptor = Descriptor {
            variant: Variant::C,
            file_id: 0x81,
            face_number: 7,
            blob_count: 2,
            animation_frames: 0,
            entries: vec![LayoutEntry {
                kind: 0x01,
                index: 0,
                x: 0,
                y: 0,
                width: 24,
                height: 16,
            }],
            compression: vec![(0, compression)],
        };
        let background = solid(24, 16, 0x1234);
        let preview = solid(PREVIEW_WIDTH, PREVIEW_HEIGHT, 0x3C5A);
        let mut swapped = preview.data.clone();
        swap_pixel_bytes(&mut swapped);
        let mut warnings = Vec::new();
        let file = emit::build(
            &descriptor,
            vec![PayloadSource::Bitmap(background), PayloadSource::Raw(swapped)],
            &mut warnings,
        )
        .unwrap();
        Package::parse(file, None, &mut warnings).unwrap()
    }

    #[test]
    fn describe_notes_each_payload() {
        let package = two_blob_package(Compression::TryRle);
        let mut warnings = Vec::new();
        let text = describe(&package, &mut warnings);
        assert!(text.contains("fileType        C"), "{text}");
        // The solid background compresses, the preview does not.
        assert!(text.contains("blobCompression 0000 RLE_LINE"), "{text}");
        assert!(text.contains("blobCompression 0001 NONE"), "{text}");
        // Round-trip loadable.
        let parsed = Descriptor::parse(&text, &mut warnings).unwrap();
        assert_eq!(parsed.compression_for(0), Compression::RleLine);
    }

    #[test]
    fn dump_decodes_rle_and_raw_payloads() {
        let package = two_blob_package(Compression::TryRle);
        let mut warnings = Vec::new();
        let dumps = dump_blobs(&package, true, &mut warnings).unwrap();
        assert_eq!(dumps.len(), 2);
        assert!(dumps.iter().all(|d| d.bmp.is_some() && d.raw.is_some()));

        // Blob 0 was stored RLE; decoding it recovers the solid colour.
        let image = decode_blob(&package, 0, &mut warnings).unwrap().unwrap();
        assert_eq!(image.pixel(5, 5).unwrap(), 0x1234);

        // Blob 1 has no entry but is last, so it decodes as the preview.
        let preview = decode_blob(&package, 1, &mut warnings).unwrap().unwrap();
        assert_eq!((preview.width, preview.height), (PREVIEW_WIDTH, PREVIEW_HEIGHT));
        assert_eq!(preview.pixel(0, 0).unwrap(), 0x3C5A);
    }

    #[test]
    fn uncompressed_payloads_round_trip_through_dump() {
        let package = two_blob_package(Compression::None);
        let mut warnings = Vec::new();
        let image = decode_blob(&package, 0, &mut warnings).unwrap().unwrap();
        assert_eq!(image.pixel(0, 0).unwrap(), 0x1234);
        assert_eq!(image.compression, Compression::None);
    }

    #[test]
    fn variant_b_dumps_are_refused() {
        let mut data = vec![0u8; 1900 + 16];
        data[0] = 0x04;
        data[2] = 2;
        bytes::put_u32(&mut data, 404, 900_000).unwrap();
        let mut warnings = Vec::new();
        let package = Package::parse(data, None, &mut warnings).unwrap();
        assert_eq!(package.header.variant, Variant::B);
        assert!(matches!(
            dump_blobs(&package, false, &mut warnings),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn legacy_background_strips_are_forced_to_240x24() {
        // A narrow-layout package: one type 0x00 entry claiming 10 payloads
        // with a bogus size.
        let mut data = vec![0u8; 1700];
        data[0] = 0x04;
        data[1] = 1;
        data[2] = 10;
        // entry 0: type 0x00, x 0, y 0, w 100, h 50, index 0
        data[5] = 0x00;
        data[8] = 100;
        data[9] = 50;
        for i in 1..10usize {
            bytes::put_u32(&mut data, 200 + 4 * i, (i * 240 * 24 * 2) as u32).unwrap();
        }
        data.extend_from_slice(&vec![0u8; 240 * 24 * 2 * 10]);

        let mut warnings = Vec::new();
        let package = Package::parse(data, Some(Variant::A), &mut warnings).unwrap();
        let image = decode_blob(&package, 0, &mut warnings).unwrap().unwrap();
        assert_eq!((image.width, image.height), (240, 24));
        assert!(warnings.iter().any(|w| w.0.contains("240x24")), "{warnings:?}");
    }
}
