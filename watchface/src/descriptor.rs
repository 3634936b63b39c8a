//! The textual layout descriptor (`watchface.txt`).
//!
//! A line-oriented ASCII file describing everything needed to rebuild a
//! package: header fields, layout entries, and the requested compression per
//! payload. Lines starting with `#` and empty lines are ignored; unknown
//! keywords warn but do not abort.

use std::fmt::Write as _;

use crate::error::{warn, Error, Warning};
use crate::image::Compression;
use crate::layout;
use crate::package::{Header, LayoutEntry, Variant, TABLE_SLOTS};

/// A line is split into at most this many tokens; the rest is ignored.
pub const MAX_TOKENS: usize = 16;

/// Parsed form of a descriptor file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub variant: Variant,
    pub file_id: u8,
    pub face_number: u16,
    pub blob_count: u8,
    pub animation_frames: u16,
    pub entries: Vec<LayoutEntry>,
    /// Requested compression per blob index. Sparse; unlisted blobs are
    /// uncompressed.
    pub compression: Vec<(usize, Compression)>,
}

/// Observed placement of one blob, used to annotate serialized descriptors.
#[derive(Debug, Clone, Copy)]
pub struct BlobNote {
    pub index: usize,
    pub compression: Compression,
    pub offset: u32,
    pub size: usize,
}

impl Descriptor {
    /// dataCount is always recomputed from the entries actually present.
    pub fn data_count(&self) -> u8 {
        self.entries.len() as u8
    }

    pub fn compression_for(&self, blob: usize) -> Compression {
        self.compression
            .iter()
            .find(|(i, _)| *i == blob)
            .map_or(Compression::None, |&(_, c)| c)
    }

    /// Descriptor for an already-parsed package header. The compression list
    /// starts empty; the inspector fills it in after sniffing each payload.
    pub fn from_header(header: &Header) -> Descriptor {
        Descriptor {
            variant: header.variant,
            file_id: header.file_id,
            face_number: header.face_number,
            blob_count: header.blob_count,
            animation_frames: header.animation_frames,
            entries: header.entries.clone(),
            compression: Vec::new(),
        }
    }

    pub fn serialize(&self) -> String {
        self.serialize_with_notes(&[])
    }

    /// Serialize, taking blobCompression lines (with offset and size
    /// comments) from `notes` when provided.
    pub fn serialize_with_notes(&self, notes: &[BlobNote]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "fileType        {}", self.variant);
        let _ = writeln!(out, "fileID          {:#04x}", self.file_id);
        let _ = writeln!(out, "faceNumber      {}", self.face_number);
        let _ = writeln!(out, "blobCount       {}", self.blob_count);
        if self.animation_frames != 0 {
            let _ = writeln!(out, "animationFrames {}", self.animation_frames);
        }
        if notes.is_empty() {
            for &(index, compression) in &self.compression {
                let _ = writeln!(out, "blobCompression {index:04} {compression}");
            }
        } else {
            for note in notes {
                let _ = writeln!(
                    out,
                    "blobCompression {:04} {:9} # offset {:7} size {:7}",
                    note.index, note.compression.as_str(), note.offset, note.size
                );
            }
        }
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "faceData        {:#04x}  {:04}  {:15} {:4} {:4} {:4} {:4}",
                entry.kind,
                entry.index,
                layout::kind_name(entry.kind),
                entry.x,
                entry.y,
                entry.width,
                entry.height
            );
        }
        let _ = writeln!(out, "dataCount       {}", self.data_count());
        out
    }

    /// Parse descriptor text. Irregularities that do not prevent a rebuild
    /// are accumulated as warnings.
    pub fn parse(text: &str, warnings: &mut Vec<Warning>) -> Result<Descriptor, Error> {
        let mut variant = None;
        let mut file_id = 0u8;
        let mut face_number = 0u16;
        let mut blob_count = 0u8;
        let mut animation_frames = 0u16;
        let mut entries = Vec::new();
        let mut compression = Vec::new();

        for (number, raw_line) in text.lines().enumerate() {
            let line = number + 1;
            let tokens = split_tokens(raw_line);
            let Some(&keyword) = tokens.first() else {
                continue;
            };
            if keyword.starts_with('#') {
                continue;
            }
            match keyword {
                "fileType" => {
                    let token = required(&tokens, 1, line)?;
                    variant = Some(
                        token
                            .chars()
                            .next()
                            .and_then(Variant::from_char)
                            .filter(|_| token.len() == 1)
                            .ok_or(Error::Descriptor {
                                line,
                                reason: "fileType must be A, B or C",
                            })?,
                    );
                }
                "fileID" => file_id = parse_number(required(&tokens, 1, line)?, line)? as u8,
                "faceNumber" => {
                    face_number = parse_number(required(&tokens, 1, line)?, line)? as u16
                }
                "blobCount" => blob_count = parse_number(required(&tokens, 1, line)?, line)? as u8,
                "animationFrames" => {
                    animation_frames = parse_number(required(&tokens, 1, line)?, line)? as u16
                }
                "blobCompression" => {
                    let index = parse_number(required(&tokens, 1, line)?, line)? as usize;
                    if index >= TABLE_SLOTS {
                        return Err(Error::Descriptor {
                            line,
                            reason: "blob index out of range",
                        });
                    }
                    let mode: Compression =
                        required(&tokens, 2, line)?.parse().map_err(|()| Error::Descriptor {
                            line,
                            reason: "expected NONE, RLE_LINE, RLE_BASIC or TRY_RLE",
                        })?;
                    compression.push((index, mode));
                }
                "faceData" => {
                    // type, index, name (ignored), x, y, w, h
                    let kind = parse_number(required(&tokens, 1, line)?, line)? as u8;
                    let index = parse_number(required(&tokens, 2, line)?, line)? as u8;
                    let _name = required(&tokens, 3, line)?;
                    let x = parse_number(required(&tokens, 4, line)?, line)? as u16;
                    let y = parse_number(required(&tokens, 5, line)?, line)? as u16;
                    let width = parse_number(required(&tokens, 6, line)?, line)? as u16;
                    let height = parse_number(required(&tokens, 7, line)?, line)? as u16;
                    entries.push(LayoutEntry {
                        kind,
                        index,
                        x,
                        y,
                        width,
                        height,
                    });
                }
                "dataCount" => {
                    // Recomputed from the faceData lines.
                    let _ = required(&tokens, 1, line)?;
                }
                other => warn(warnings, format!("line {line}: unknown keyword '{other}'")),
            }
        }

        let variant = variant.ok_or(Error::Descriptor {
            line: 0,
            reason: "missing fileType line",
        })?;
        if entries.len() > variant.entry_slots() {
            return Err(Error::TooManyEntries {
                count: entries.len(),
                max: variant.entry_slots(),
            });
        }

        Ok(Descriptor {
            variant,
            file_id,
            face_number,
            blob_count,
            animation_frames,
            entries,
            compression,
        })
    }
}

/// Split on spaces and tabs into printable-ASCII tokens. Any other byte ends
/// the line.
fn split_tokens(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, b) in line.bytes().enumerate() {
        match b {
            b' ' | b'\t' => {
                if let Some(s) = start.take() {
                    tokens.push(&line[s..i]);
                    if tokens.len() == MAX_TOKENS {
                        return tokens;
                    }
                }
            }
            33..=126 => {
                if start.is_none() {
                    start = Some(i);
                }
            }
            _ => {
                if let Some(s) = start.take() {
                    tokens.push(&line[s..i]);
                }
                return tokens;
            }
        }
    }
    if let Some(s) = start {
        tokens.push(&line[s..]);
    }
    tokens
}

fn required<'a>(tokens: &[&'a str], index: usize, line: usize) -> Result<&'a str, Error> {
    tokens.get(index).copied().ok_or(Error::Descriptor {
        line,
        reason: "missing token",
    })
}

/// Decimal, or hexadecimal with a `0x` prefix. Digits stop at the first
/// non-digit byte; overflow wraps.
fn parse_number(token: &str, line: usize) -> Result<u32, Error> {
    let (digits, radix) = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(rest) => (rest, 16),
        None => (token, 10),
    };
    let mut total = 0u32;
    let mut any = false;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(radix) else {
            break;
        };
        total = total.wrapping_mul(radix).wrapping_add(digit);
        any = true;
    }
    if !any {
        return Err(Error::Descriptor {
            line,
            reason: "expected a number",
        });
    }
    Ok(total)
}
