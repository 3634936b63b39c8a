use std::fmt;

use thiserror::Error;

/// Errors surfaced by the codecs.
///
/// `Io` keeps the failing syscall's error so callers can report it; every
/// other variant is either an input-format problem or a feature this
/// implementation deliberately refuses.
#[derive(Debug, Error)]
pub enum Error {
    #[error("read of {need} bytes at offset {offset} is past the end of a {len}-byte buffer")]
    OutOfBounds {
        offset: usize,
        need: usize,
        len: usize,
    },

    #[error("{what} needs at least {need} bytes, got {len}")]
    TooShort {
        what: &'static str,
        need: usize,
        len: usize,
    },

    #[error("bad bitmap signature 0x{0:04x} (expected 0x4d42)")]
    BadSignature(u16),

    #[error("malformed bitmap header: {0}")]
    MalformedBitmap(&'static str),

    #[error("unsupported bitmap bit depth {0} (expected 16, 24 or 32)")]
    UnsupportedBitDepth(u16),

    #[error("bitmap channel masks {r:#06x}/{g:#06x}/{b:#06x} are not RGB565")]
    BadChannelMasks { r: u32, g: u32, b: u32 },

    #[error("bitmap row size {row} is implausible for width {width}")]
    BadRowSize { row: u32, width: u32 },

    #[error("declared bitmap data ({need} bytes) extends past end of file ({len} bytes)")]
    DataPastEof { need: usize, len: usize },

    #[error("background image does not cover the pasted region")]
    BackgroundTooSmall,

    #[error("image dimensions {width}x{height} are invalid")]
    BadDimensions { width: u32, height: u32 },

    #[error("bad RLE data: {0}")]
    Rle(&'static str),

    #[error("blob offset {offset} (index {index}) is past the end of the {len}-byte file")]
    OffsetPastEof {
        index: usize,
        offset: u32,
        len: usize,
    },

    #[error("blob {index} extent {start}..{end} is not a valid payload range")]
    BlobExtent {
        index: usize,
        start: usize,
        end: usize,
    },

    #[error("{count} layout entries exceed the header capacity of {max}")]
    TooManyEntries { count: usize, max: usize },

    #[error("descriptor declares {expected} blobs but {actual} payloads were supplied")]
    PayloadCount { expected: usize, actual: usize },

    #[error("descriptor line {line}: {reason}")]
    Descriptor { line: usize, reason: &'static str },

    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A recoverable irregularity. Operations keep going after recording one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning(pub String);

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record a warning and mirror it to the log.
pub(crate) fn warn(warnings: &mut Vec<Warning>, message: String) {
    log::warn!("{message}");
    warnings.push(Warning(message));
}
