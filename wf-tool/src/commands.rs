use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

use watchface::descriptor::Descriptor;
use watchface::emit::{self, PayloadSource};
use watchface::error::Warning;
use watchface::{bmp, inspect, layout, Package, Variant};

fn read_package(path: &Path, variant: Option<Variant>) -> Result<(Package, Vec<Warning>)> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut warnings = Vec::new();
    let package = Package::parse(data, variant, &mut warnings)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok((package, warnings))
}

/// Write a file, removing it again if the write fails part way.
fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    log::debug!("writing {} ({} bytes)", path.display(), data.len());
    if let Err(error) = fs::write(path, data) {
        let _ = fs::remove_file(path);
        return Err(error).with_context(|| format!("failed to write {}", path.display()));
    }
    Ok(())
}

fn blob_progress(count: usize) -> ProgressBar {
    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap(),
    );
    pb
}

pub fn info(file: &Path, variant: Option<Variant>) -> Result<()> {
    let (package, mut warnings) = read_package(file, variant)?;
    let text = inspect::describe(&package, &mut warnings);
    print!("{text}");
    println!();
    println!(
        "variant {}, {} bytes, {} payloads",
        package.header.variant,
        package.file_len(),
        package.header.observed_blob_count()
    );
    if !warnings.is_empty() {
        println!("{} warning(s), see the log output above", warnings.len());
    }
    Ok(())
}

pub fn dump(
    file: &Path,
    folder: Option<&Path>,
    raw: bool,
    variant: Option<Variant>,
) -> Result<()> {
    let (package, mut warnings) = read_package(file, variant)?;

    let folder: PathBuf = match folder {
        Some(folder) => folder.to_path_buf(),
        None => PathBuf::from(package.header.face_number.to_string()),
    };
    fs::create_dir_all(&folder)
        .with_context(|| format!("failed to create {}", folder.display()))?;

    let text = inspect::describe(&package, &mut warnings);
    write_file(&folder.join("watchface.txt"), text.as_bytes())?;

    let dumps = inspect::dump_blobs(&package, raw, &mut warnings)?;
    let pb = blob_progress(dumps.len());
    for dump in &dumps {
        if let Some(bmp) = &dump.bmp {
            write_file(&folder.join(format!("{:04}.bmp", dump.index)), bmp)?;
        }
        if let Some(raw) = &dump.raw {
            write_file(&folder.join(format!("{:04}.raw", dump.index)), raw)?;
        }
        pb.inc(1);
    }
    pb.finish_with_message("dumped");

    println!(
        "dumped {} payloads to {} with {} warning(s)",
        dumps.len(),
        folder.display(),
        warnings.len()
    );
    Ok(())
}

/// Load payload `index` from the dump folder: `NNNN.bmp` decoded through the
/// bitmap reader, or `NNNN.raw` passed through untouched.
fn load_payload(folder: &Path, index: usize) -> Result<PayloadSource> {
    let bmp_path = folder.join(format!("{index:04}.bmp"));
    if bmp_path.exists() {
        let data = fs::read(&bmp_path)
            .with_context(|| format!("failed to read {}", bmp_path.display()))?;
        let image = bmp::read_bmp(&data, None)
            .with_context(|| format!("failed to decode {}", bmp_path.display()))?;
        return Ok(PayloadSource::Bitmap(image));
    }
    let raw_path = folder.join(format!("{index:04}.raw"));
    if raw_path.exists() {
        let data = fs::read(&raw_path)
            .with_context(|| format!("failed to read {}", raw_path.display()))?;
        return Ok(PayloadSource::Raw(data));
    }
    bail!(
        "no {} or {} in the folder",
        bmp_path.display(),
        raw_path.display()
    );
}

pub fn create(file: &Path, folder: &Path) -> Result<()> {
    let descriptor_path = folder.join("watchface.txt");
    let text = fs::read_to_string(&descriptor_path)
        .with_context(|| format!("failed to read {}", descriptor_path.display()))?;
    let mut warnings = Vec::new();
    let descriptor = Descriptor::parse(&text, &mut warnings)
        .with_context(|| format!("failed to parse {}", descriptor_path.display()))?;

    let count = descriptor.blob_count as usize;
    let pb = blob_progress(count);
    let mut payloads = Vec::with_capacity(count);
    for index in 0..count {
        payloads.push(load_payload(folder, index)?);
        pb.inc(1);
    }
    pb.finish_with_message("loaded");

    let data = emit::build(&descriptor, payloads, &mut warnings)
        .context("failed to build the package")?;
    write_file(file, &data)?;

    println!(
        "wrote {} ({} bytes, {} payloads, {} warning(s))",
        file.display(),
        data.len(),
        count,
        warnings.len()
    );
    Ok(())
}

pub fn print_types() {
    println!("Data types for binary watch face files.");
    println!("Width and height of digit strips are those of a single digit.");
    println!();
    println!("Code  Name              Count  Description");
    for kind in layout::ELEMENT_KINDS {
        println!(
            "{:#04x}  {:16}  {:2}     {}",
            kind.code, kind.name, kind.frames, kind.description
        );
    }
}
