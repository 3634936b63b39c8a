//! End-to-end checks across the parser, inspector, descriptor and emitter.

use watchface::bmp;
use watchface::descriptor::Descriptor;
use watchface::emit::{self, PayloadSource};
use watchface::image::{Compression, Image};
use watchface::inspect;
use watchface::{Package, Variant};

fn solid(width: u32, height: u32, pixel: u16) -> Image {
    let mut data = Vec::with_capacity(2 * width as usize * height as usize);
    for _ in 0..width * height {
        data.extend_from_slice(&pixel.to_le_bytes());
    }
    Image::from_raw(width, height, data).unwrap()
}

fn gradient(width: u32, height: u32) -> Image {
    let mut data = Vec::with_capacity(2 * width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let pixel = ((x * 83 + y * 199) & 0xFFFF) as u16;
            data.extend_from_slice(&pixel.to_le_bytes());
        }
    }
    Image::from_raw(width, height, data).unwrap()
}

/// A hand-built variant C file with one zeroed background payload parses and
/// decodes without warnings.
#[test]
fn parses_a_minimal_type_c_face() {
    let mut data = vec![0u8; 1900];
    data[0] = 0x81;
    data[1] = 1; // dataCount
    data[2] = 1; // blobCount
    // entry 0: background, index 0, 240x280 at the origin
    data[5] = 0x01;
    data[11] = (240u16 & 0xFF) as u8;
    data[12] = (240u16 >> 8) as u8;
    data[13] = (280u16 & 0xFF) as u8;
    data[14] = (280u16 >> 8) as u8;
    data.extend_from_slice(&vec![0u8; 240 * 280 * 2]);

    let mut warnings = Vec::new();
    let package = Package::parse(data, None, &mut warnings).unwrap();
    assert_eq!(package.header.variant, Variant::C);
    assert!(warnings.is_empty(), "{warnings:?}");

    let image = inspect::decode_blob(&package, 0, &mut warnings)
        .unwrap()
        .unwrap();
    assert_eq!((image.width, image.height), (240, 280));
    assert!(image.data.iter().all(|&b| b == 0));
}

/// Building from a textual descriptor matches the header fields and offsets
/// it declares, and an incompressible payload stays uncompressed.
#[test]
fn builds_a_face_from_descriptor_text() {
    let text = "\
fileType        C
fileID          0x84
faceNumber      3163
blobCount       2
blobCompression 0001 TRY_RLE
faceData        0x01  0000  BACKGROUND       0    0   32   16
faceData        0xF0  0001  SEPERATOR       10   10    8    8
";
    let mut warnings = Vec::new();
    let descriptor = Descriptor::parse(text, &mut warnings).unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");

    let background = solid(32, 16, 0x51EA);
    let separator = gradient(8, 8); // declines RLE
    let file = emit::build(
        &descriptor,
        vec![
            PayloadSource::Bitmap(background),
            PayloadSource::Bitmap(separator),
        ],
        &mut warnings,
    )
    .unwrap();

    let package = Package::parse(file, None, &mut warnings).unwrap();
    let header = &package.header;
    assert_eq!(header.variant, Variant::C);
    assert_eq!(header.file_id, 0x84);
    assert_eq!(header.face_number, 3163);
    assert_eq!(header.blob_count, 2);
    assert_eq!(header.data_count, 2);
    assert_eq!(header.offsets[0], 0);
    assert_eq!(header.offsets[1], 2 * 32 * 16);
    // gradient payload is stored raw
    assert_eq!(package.blob(1).unwrap().len(), 2 * 8 * 8);

    let decoded = inspect::decode_blob(&package, 0, &mut warnings)
        .unwrap()
        .unwrap();
    assert_eq!(decoded.pixel(31, 15).unwrap(), 0x51EA);
}

/// Dump a package, feed everything the dump produced back through the
/// builder, and check the rebuilt face decodes identically.
#[test]
fn dump_then_create_reproduces_the_face() {
    let descriptor = Descriptor {
        variant: Variant::C,
        file_id: 0x81,
        face_number: 7736,
        blob_count: 3,
        animation_frames: 0,
        entries: vec![
            watchface::LayoutEntry {
                kind: 0x01,
                index: 0,
                x: 0,
                y: 0,
                width: 60,
                height: 40,
            },
            watchface::LayoutEntry {
                kind: 0xF0,
                index: 1,
                x: 5,
                y: 5,
                width: 12,
                height: 12,
            },
        ],
        compression: vec![(0, Compression::TryRle)],
    };
    let blobs = [
        solid(60, 40, 0xBEEF),
        gradient(12, 12),
        solid(140, 163, 0x1234), // preview thumbnail
    ];

    let mut warnings = Vec::new();
    let original = emit::build(
        &descriptor,
        blobs.iter().map(|b| PayloadSource::Bitmap(b.clone())).collect(),
        &mut warnings,
    )
    .unwrap();
    let package = Package::parse(original, None, &mut warnings).unwrap();

    // Dump: descriptor text plus one bitmap file per payload.
    let text = inspect::describe(&package, &mut warnings);
    let dumps = inspect::dump_blobs(&package, false, &mut warnings).unwrap();
    assert_eq!(dumps.len(), 3);

    // Create: parse the dumped descriptor and re-read the dumped bitmaps.
    let reparsed = Descriptor::parse(&text, &mut warnings).unwrap();
    assert_eq!(reparsed.entries, descriptor.entries);
    assert_eq!(reparsed.face_number, descriptor.face_number);
    let payloads = dumps
        .iter()
        .map(|d| {
            let image = bmp::read_bmp(d.bmp.as_ref().unwrap(), None).unwrap();
            PayloadSource::Bitmap(image)
        })
        .collect();
    let rebuilt = emit::build(&reparsed, payloads, &mut warnings).unwrap();

    // The rebuilt file decodes to the same pixels.
    let package = Package::parse(rebuilt, None, &mut warnings).unwrap();
    for (index, expected) in blobs.iter().enumerate() {
        let image = inspect::decode_blob(&package, index, &mut warnings)
            .unwrap()
            .unwrap();
        assert_eq!(image.data, expected.data, "blob {index}");
    }
}

/// A package built with compression enabled must still honour the offset
/// table invariants when parsed back.
#[test]
fn compressed_faces_keep_strictly_increasing_offsets() {
    let descriptor = Descriptor {
        variant: Variant::C,
        file_id: 0x04,
        face_number: 1,
        blob_count: 4,
        animation_frames: 0,
        entries: vec![watchface::LayoutEntry {
            kind: 0x70,
            index: 0,
            x: 0,
            y: 0,
            width: 20,
            height: 20,
        }],
        compression: (0..4).map(|i| (i, Compression::TryRle)).collect(),
    };
    let payloads = (0..4u16)
        .map(|i| PayloadSource::Bitmap(solid(20, 20, 0x1000 + i)))
        .collect();

    let mut warnings = Vec::new();
    let file = emit::build(&descriptor, payloads, &mut warnings).unwrap();
    let package = Package::parse(file, None, &mut warnings).unwrap();

    let offsets = &package.header.offsets;
    assert_eq!(offsets[0], 0);
    for i in 1..4 {
        assert!(offsets[i] > offsets[i - 1], "offsets: {:?}", &offsets[..4]);
    }
}
