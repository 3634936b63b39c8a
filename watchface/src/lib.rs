//! Codec for MO YOUNG / DA FIT binary watch face packages.
//!
//! A package bundles a fixed-size layout header with a set of RGB565
//! payloads (backgrounds, digit strips, icons, animation frames). This crate
//! parses and emits the container, decodes and encodes the two RLE payload
//! formats, converts payloads to and from standard bitmap files, and reads
//! and writes the textual `watchface.txt` descriptor used to rebuild a face.

pub mod bmp;
pub mod bytes;
pub mod descriptor;
pub mod emit;
pub mod error;
pub mod image;
pub mod inspect;
pub mod layout;
pub mod package;
pub mod rle;

pub use descriptor::Descriptor;
pub use error::{Error, Warning};
pub use image::{Compression, Image};
pub use package::{Header, LayoutEntry, Package, Variant};
