//! PNG to watch face bitmap converter
//!
//! Converts a PNG image to the 16 bpp RGB565 bitmap format that wftool
//! expects in dump folders, resizing when a target size is given.

use std::env;
use std::fs;

use image::imageops::FilterType;
use image::io::Reader as ImageReader;
use watchface::bmp;
use watchface::image::Image;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: png_to_face_bmp INPUT.png OUTPUT.bmp [WIDTHxHEIGHT]");
        std::process::exit(2);
    }
    let input = &args[1];
    let output = &args[2];

    let mut img = ImageReader::open(input)?.decode()?;
    println!("Input image: {}x{}", img.width(), img.height());

    if let Some(size) = args.get(3) {
        let (w, h) = size
            .split_once('x')
            .ok_or("size must look like 240x280")?;
        let width: u32 = w.parse()?;
        let height: u32 = h.parse()?;
        img = img.resize_exact(width, height, FilterType::Lanczos3);
        println!("Resized to: {width}x{height}");
    }

    let rgb = img.to_rgb8();
    let mut data = Vec::with_capacity(2 * (rgb.width() * rgb.height()) as usize);
    for pixel in rgb.pixels() {
        let rgb565 = bmp::rgb888_to_rgb565(pixel[0], pixel[1], pixel[2]);
        data.extend_from_slice(&rgb565.to_le_bytes());
    }

    let canonical = Image::from_raw(rgb.width(), rgb.height(), data)?;
    let file = bmp::write_bmp(&canonical, 16)?;
    println!("Wrote {output} ({} bytes)", file.len());
    fs::write(output, file)?;
    Ok(())
}
