//! Watch face package container: variant classification and header parsing.

use crate::bytes;
use crate::error::{warn, Error, Warning};
use crate::layout;

/// Both offset and size tables hold this many slots regardless of variant.
pub const TABLE_SLOTS: usize = 250;

/// The three on-disk package layouts.
///
/// A uses a compact 6-byte layout entry with 8-bit coordinates. B and C share
/// the wide 10-byte entry; B additionally compresses the payload region as one
/// opaque blob, so its offsets address data this tool never sees decompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    A,
    B,
    C,
}

impl Variant {
    pub fn header_len(self) -> usize {
        match self {
            Variant::A => 1700,
            Variant::B | Variant::C => 1900,
        }
    }

    /// Number of layout entry slots in the header.
    pub fn entry_slots(self) -> usize {
        match self {
            Variant::A => 32,
            Variant::B | Variant::C => 39,
        }
    }

    pub fn entry_len(self) -> usize {
        match self {
            Variant::A => 6,
            Variant::B | Variant::C => 10,
        }
    }

    pub fn padding_len(self) -> usize {
        match self {
            Variant::A => 3,
            Variant::B | Variant::C => 5,
        }
    }

    /// Byte offset of the offset table within the header.
    pub fn offsets_at(self) -> usize {
        match self {
            Variant::A => 200,
            Variant::B | Variant::C => 400,
        }
    }

    /// Byte offset of the size table within the header.
    pub fn sizes_at(self) -> usize {
        match self {
            Variant::A => 1600,
            Variant::B | Variant::C => 1400,
        }
    }

    /// Size-table slot that actually holds the animation frame count.
    pub fn animation_slot(self) -> usize {
        match self {
            Variant::A => 200,
            Variant::B | Variant::C => 0,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Variant::A => 'A',
            Variant::B => 'B',
            Variant::C => 'C',
        }
    }

    pub fn from_char(c: char) -> Option<Variant> {
        match c.to_ascii_uppercase() {
            'A' => Some(Variant::A),
            'B' => Some(Variant::B),
            'C' => Some(Variant::C),
            _ => None,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One visual element of the face: a type code, the offset-table index of its
/// first payload, and its rectangle on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEntry {
    pub kind: u8,
    pub index: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// The decoded fixed-size package header.
#[derive(Debug, Clone)]
pub struct Header {
    pub variant: Variant,
    pub file_id: u8,
    pub data_count: u8,
    pub blob_count: u8,
    pub face_number: u16,
    /// Occupied layout entries in slot order. Slot 0 is always kept since
    /// some faces use type 0x00 there for the background strips.
    pub entries: Vec<LayoutEntry>,
    pub offsets: Vec<u32>,
    pub sizes: Vec<u16>,
    pub animation_frames: u16,
}

impl Header {
    /// Number of payloads implied by the offset table: slot 0 plus every
    /// non-zero offset up to the first zero entry, which terminates the
    /// table. Non-zero slots after the terminator are garbage, not payloads.
    pub fn observed_blob_count(&self) -> usize {
        1 + self.offsets[1..].iter().take_while(|&&o| o != 0).count()
    }

    /// The layout entry whose payload range covers `offset_index`, if any.
    ///
    /// An entry at index i with a frame count of n claims payloads i..i+n,
    /// so a digit strip matches all ten of its digits.
    pub fn entry_for_blob(&self, offset_index: usize) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| {
            let first = e.index as usize;
            let count = layout::frame_count(e.kind, self.animation_frames) as usize;
            offset_index >= first && offset_index < first + count
        })
    }
}

/// A package file together with its parsed header.
#[derive(Debug, Clone)]
pub struct Package {
    pub header: Header,
    data: Vec<u8>,
}

/// Occupied layout-entry slots under `variant`'s interpretation, counted the
/// same way the parser keeps them.
fn plausible_entry_count(data: &[u8], variant: Variant) -> usize {
    (0..variant.entry_slots())
        .filter(|&slot| {
            slot == 0
                || bytes::get_u8(data, 5 + slot * variant.entry_len()).unwrap_or(0) != 0
        })
        .count()
}

/// Classify a package buffer as variant A, B or C.
///
/// The blob count declared at byte 2 is compared against the number of
/// offsets found at each candidate table origin. When the wide interpretation
/// wins, B and C are told apart by whether the last offset (plus the header)
/// lands beyond the end of the file, which means the offsets address
/// decompressed data. Small faces can match both table origins (with one blob
/// there are no non-zero offsets at all); those ties are broken by whichever
/// entry interpretation agrees with the declared dataCount.
pub fn detect_variant(data: &[u8], warnings: &mut Vec<Warning>) -> Variant {
    let blob_count = data.get(2).copied().unwrap_or(0) as usize;

    let mut narrow_count = 1;
    let mut wide_count = 1;
    let mut wide_last = 0u32;
    let mut narrow_running = true;
    let mut wide_running = true;
    for i in 1..TABLE_SLOTS {
        if narrow_running {
            match bytes::get_u32(data, 200 + 4 * i) {
                Ok(0) | Err(_) => narrow_running = false,
                Ok(_) => narrow_count += 1,
            }
        }
        if wide_running {
            match bytes::get_u32(data, 400 + 4 * i) {
                Ok(0) | Err(_) => wide_running = false,
                Ok(offset) => {
                    wide_count += 1;
                    wide_last = offset;
                }
            }
        }
    }

    let wide_variant = |data: &[u8]| {
        if wide_last as usize + Variant::B.header_len() > data.len() {
            log::debug!("autodetected variant B");
            Variant::B
        } else {
            log::debug!("autodetected variant C");
            Variant::C
        }
    };

    if narrow_count == blob_count && wide_count == blob_count {
        let data_count = data.get(1).copied().unwrap_or(0) as usize;
        let narrow_entries = plausible_entry_count(data, Variant::A);
        let wide_entries = plausible_entry_count(data, Variant::C);
        if wide_entries == data_count && narrow_entries != data_count {
            wide_variant(data)
        } else {
            log::debug!("autodetected variant A");
            Variant::A
        }
    } else if narrow_count == blob_count {
        log::debug!("autodetected variant A");
        Variant::A
    } else if wide_count == blob_count {
        wide_variant(data)
    } else {
        warn(
            warnings,
            "unable to autodetect the package variant, defaulting to A".to_string(),
        );
        Variant::A
    }
}

fn parse_entries(
    data: &[u8],
    variant: Variant,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<LayoutEntry>, Error> {
    let mut entries = Vec::new();
    let mut at = 5;
    for slot in 0..variant.entry_slots() {
        let entry = match variant {
            Variant::A => LayoutEntry {
                kind: bytes::get_u8(data, at)?,
                x: bytes::get_u8(data, at + 1)? as u16,
                y: bytes::get_u8(data, at + 2)? as u16,
                width: bytes::get_u8(data, at + 3)? as u16,
                height: bytes::get_u8(data, at + 4)? as u16,
                index: bytes::get_u8(data, at + 5)?,
            },
            Variant::B | Variant::C => LayoutEntry {
                kind: bytes::get_u8(data, at)?,
                index: bytes::get_u8(data, at + 1)?,
                x: bytes::get_u16(data, at + 2)?,
                y: bytes::get_u16(data, at + 4)?,
                width: bytes::get_u16(data, at + 6)?,
                height: bytes::get_u16(data, at + 8)?,
            },
        };
        at += variant.entry_len();
        // Some faces use type 0x00 in slot 0 for the background strips, so
        // only later all-zero slots count as empty.
        if entry.kind != 0 || slot == 0 {
            entries.push(entry);
        }
    }
    let padding = &data[at..at + variant.padding_len()];
    if padding.iter().any(|&b| b != 0) {
        warn(warnings, "header padding bytes are not zero".to_string());
    }
    Ok(entries)
}

impl Package {
    /// Parse a package file. With `variant` of `None` the variant is
    /// autodetected.
    ///
    /// Hard errors are reserved for structure that cannot be worked around:
    /// a file shorter than its header, or offsets addressing bytes past the
    /// end of the file (variant B exempt). Everything else irregular is a
    /// warning.
    pub fn parse(
        data: Vec<u8>,
        variant: Option<Variant>,
        warnings: &mut Vec<Warning>,
    ) -> Result<Package, Error> {
        let file_id = bytes::get_u8(&data, 0)?;
        if !matches!(file_id, 0x04 | 0x81 | 0x84) {
            warn(warnings, format!("unknown fileID {:#04x}", file_id));
        }

        let variant = variant.unwrap_or_else(|| detect_variant(&data, warnings));
        if data.len() < variant.header_len() {
            return Err(Error::TooShort {
                what: "package header",
                need: variant.header_len(),
                len: data.len(),
            });
        }

        let data_count = bytes::get_u8(&data, 1)?;
        let blob_count = bytes::get_u8(&data, 2)?;
        let face_number = bytes::get_u16(&data, 3)?;
        let entries = parse_entries(&data, variant, warnings)?;

        let mut offsets = Vec::with_capacity(TABLE_SLOTS);
        for i in 0..TABLE_SLOTS {
            offsets.push(bytes::get_u32(&data, variant.offsets_at() + 4 * i)?);
        }
        let mut sizes = Vec::with_capacity(TABLE_SLOTS);
        for i in 0..TABLE_SLOTS {
            sizes.push(bytes::get_u16(&data, variant.sizes_at() + 2 * i)?);
        }
        let animation_frames = sizes[variant.animation_slot()];

        if offsets[0] != 0 {
            warn(
                warnings,
                format!("offsets[0] is {} instead of 0", offsets[0]),
            );
        }
        let mut previous = 0u32;
        for (i, &offset) in offsets.iter().enumerate().skip(1) {
            if offset == 0 {
                break;
            }
            if offset <= previous {
                warn(
                    warnings,
                    format!("offset table is not strictly increasing at index {i}"),
                );
            }
            if variant != Variant::B {
                let end = variant.header_len() + offset as usize;
                if end > data.len() {
                    return Err(Error::OffsetPastEof {
                        index: i,
                        offset,
                        len: data.len(),
                    });
                }
            }
            previous = offset;
        }

        let header = Header {
            variant,
            file_id,
            data_count,
            blob_count,
            face_number,
            entries,
            offsets,
            sizes,
            animation_frames,
        };

        if !header.entries.iter().any(|e| matches!(e.kind, 0x00 | 0x01)) {
            warn(warnings, "no background entry found".to_string());
        }
        if header.entries.len() != data_count as usize {
            warn(
                warnings,
                format!(
                    "dataCount is {} but {} layout entries are present",
                    data_count,
                    header.entries.len()
                ),
            );
        }
        let observed = header.observed_blob_count();
        if observed != blob_count as usize {
            warn(
                warnings,
                format!("blobCount is {} but {} offsets are present", blob_count, observed),
            );
        }

        Ok(Package { header, data })
    }

    pub fn file_len(&self) -> usize {
        self.data.len()
    }

    /// Byte range of blob `index` within the payload region, relative to the
    /// end of the header.
    pub fn blob_range(&self, index: usize) -> Result<(usize, usize), Error> {
        if self.header.variant == Variant::B {
            return Err(Error::Unsupported("variant B payloads are compressed as one opaque blob"));
        }
        let count = self.header.observed_blob_count();
        if index >= count {
            return Err(Error::OutOfBounds {
                offset: index,
                need: 1,
                len: count,
            });
        }
        let payload_len = self.data.len() - self.header.variant.header_len();
        let start = self.header.offsets[index] as usize;
        let end = if index + 1 < count {
            self.header.offsets[index + 1] as usize
        } else {
            payload_len
        };
        // A non-monotonic offset table parses with a warning; the blobs it
        // corrupts still have to fail cleanly here.
        if start > end || end > payload_len {
            return Err(Error::BlobExtent { index, start, end });
        }
        Ok((start, end))
    }

    /// The raw bytes of blob `index`, exactly as stored in the file.
    pub fn blob(&self, index: usize) -> Result<&[u8], Error> {
        let (start, end) = self.blob_range(index)?;
        let base = self.header.variant.header_len();
        Ok(&self.data[base + start..base + end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_header(file_id: u8, blob_count: u8, payload: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; 1900];
        data[0] = file_id;
        data[2] = blob_count;
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn detects_variant_c() {
        // One layout entry, one blob, all offsets zero past slot 0.
        let mut data = wide_header(0x81, 1, &[0u8; 240 * 280 * 2]);
        data[1] = 1; // dataCount
        data[5] = 0x01; // background entry
        bytes::put_u16(&mut data, 5 + 6, 240).unwrap();
        bytes::put_u16(&mut data, 5 + 8, 280).unwrap();

        let mut warnings = Vec::new();
        let package = Package::parse(data, None, &mut warnings).unwrap();
        assert_eq!(package.header.variant, Variant::C);
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(package.header.entries.len(), 1);
        assert_eq!(package.blob(0).unwrap().len(), 240 * 280 * 2);
    }

    #[test]
    fn detects_variant_b_when_offsets_pass_the_file_end() {
        let mut data = wide_header(0x04, 2, &[0u8; 64]);
        // Second offset far beyond the file: decompressed addressing.
        bytes::put_u32(&mut data, 400 + 4, 500_000).unwrap();
        let mut warnings = Vec::new();
        assert_eq!(detect_variant(&data, &mut warnings), Variant::B);

        let package = Package::parse(data, None, &mut warnings).unwrap();
        assert_eq!(package.header.variant, Variant::B);
        assert!(matches!(package.blob(0), Err(Error::Unsupported(_))));
    }

    #[test]
    fn detects_variant_a_and_reads_its_animation_slot() {
        let mut data = vec![0u8; 1700];
        data[0] = 0x04;
        data[2] = 5; // blobCount
        data[1] = 1;
        data[5] = 0xF7; // animation entry in slot 0
        // Four more offsets after the implicit zero at slot 0.
        for i in 1..5u32 {
            bytes::put_u32(&mut data, 200 + 4 * i as usize, i * 32).unwrap();
        }
        // Animation frame count lives at size slot 200 for this layout.
        bytes::put_u16(&mut data, 1600 + 2 * 200, 5).unwrap();
        data.extend_from_slice(&[0u8; 160]);

        let mut warnings = Vec::new();
        let package = Package::parse(data, None, &mut warnings).unwrap();
        assert_eq!(package.header.variant, Variant::A);
        assert_eq!(package.header.animation_frames, 5);
        assert_eq!(package.header.observed_blob_count(), 5);
        // The animation entry claims all five payloads.
        assert_eq!(package.header.entry_for_blob(4).unwrap().kind, 0xF7);
    }

    #[test]
    fn short_file_is_an_error() {
        let data = vec![0x81u8; 1000];
        let mut warnings = Vec::new();
        assert!(matches!(
            Package::parse(data, Some(Variant::C), &mut warnings),
            Err(Error::TooShort { .. })
        ));
    }

    #[test]
    fn offset_past_the_file_end_is_an_error() {
        let mut data = wide_header(0x81, 2, &[0u8; 32]);
        data[1] = 1;
        data[5] = 0x01;
        bytes::put_u32(&mut data, 400 + 4, 1_000_000).unwrap();
        let mut warnings = Vec::new();
        assert!(matches!(
            Package::parse(data, Some(Variant::C), &mut warnings),
            Err(Error::OffsetPastEof { .. })
        ));
    }

    #[test]
    fn odd_file_id_and_count_mismatches_warn_but_parse() {
        let mut data = wide_header(0x22, 7, &[0u8; 16]);
        data[1] = 3;
        data[5] = 0x01;
        let mut warnings = Vec::new();
        let package = Package::parse(data, Some(Variant::C), &mut warnings).unwrap();
        assert_eq!(package.header.file_id, 0x22);
        let text = warnings.iter().map(|w| w.0.as_str()).collect::<Vec<_>>().join("\n");
        assert!(text.contains("fileID"), "{text}");
        assert!(text.contains("dataCount"), "{text}");
        assert!(text.contains("blobCount"), "{text}");
    }

    #[test]
    fn non_monotonic_offsets_fail_blob_extraction_cleanly() {
        let mut data = wide_header(0x81, 3, &[0u8; 100]);
        data[1] = 1;
        data[5] = 0x01;
        bytes::put_u32(&mut data, 400 + 4, 100).unwrap();
        bytes::put_u32(&mut data, 400 + 8, 50).unwrap();

        let mut warnings = Vec::new();
        let package = Package::parse(data, Some(Variant::C), &mut warnings).unwrap();
        assert!(
            warnings.iter().any(|w| w.0.contains("strictly increasing")),
            "{warnings:?}"
        );
        assert_eq!(package.blob(0).unwrap().len(), 100);
        assert!(matches!(
            package.blob(1),
            Err(Error::BlobExtent { index: 1, start: 100, end: 50 })
        ));
    }

    #[test]
    fn offset_table_ends_at_the_first_zero_entry() {
        let mut data = wide_header(0x81, 2, &[0u8; 120]);
        data[1] = 1;
        data[5] = 0x01;
        bytes::put_u32(&mut data, 400 + 4, 100).unwrap();
        // Garbage after the terminating zero slot must not become a payload.
        bytes::put_u32(&mut data, 400 + 12, 200).unwrap();

        let mut warnings = Vec::new();
        let package = Package::parse(data, Some(Variant::C), &mut warnings).unwrap();
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(package.header.observed_blob_count(), 2);
        assert_eq!(package.blob(1).unwrap().len(), 20);
        assert!(matches!(package.blob(2), Err(Error::OutOfBounds { .. })));
    }

    #[test]
    fn entry_matching_honours_frame_counts() {
        let mut data = wide_header(0x81, 21, &[0u8; 100]);
        data[1] = 2;
        // Slot 0: background at payload 0; slot 1: digit strip at payload 1.
        data[5] = 0x01;
        data[5 + 10] = 0x40;
        data[5 + 11] = 1;
        let mut warnings = Vec::new();
        let package = Package::parse(data, Some(Variant::C), &mut warnings).unwrap();
        let header = &package.header;
        assert_eq!(header.entry_for_blob(0).unwrap().kind, 0x01);
        assert_eq!(header.entry_for_blob(10).unwrap().kind, 0x40);
        assert!(header.entry_for_blob(11).is_none());
    }
}
