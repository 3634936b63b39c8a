use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use watchface::Variant;

mod commands;

#[derive(Parser)]
#[command(name = "wftool")]
#[command(about = "Watch face tool for MO YOUNG / DA FIT binary watch face files")]
#[command(version = "0.1.0")]
struct Cli {
    /// Force the package variant (A, B or C) instead of autodetecting
    #[arg(short = 't', long, value_parser = parse_variant, global = true)]
    variant: Option<Variant>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a watch face file
    Info {
        /// Binary watch face file
        file: PathBuf,
    },
    /// Dump descriptor and bitmaps from a watch face file to a folder
    Dump {
        /// Binary watch face file
        file: PathBuf,
        /// Folder to dump into. Defaults to the face design number.
        #[arg(short, long)]
        folder: Option<PathBuf>,
        /// Also dump each payload's bytes as stored
        #[arg(short, long)]
        raw: bool,
    },
    /// Create a watch face file from a dumped folder
    Create {
        /// Binary watch face file to write
        file: PathBuf,
        /// Folder holding watchface.txt and the payload bitmaps
        #[arg(short, long)]
        folder: PathBuf,
    },
    /// Print the layout element type codes
    Types,
}

fn parse_variant(s: &str) -> Result<Variant, String> {
    let mut chars = s.chars();
    match (chars.next().and_then(Variant::from_char), chars.next()) {
        (Some(variant), None) => Ok(variant),
        _ => Err(format!("'{s}' is not one of A, B or C")),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Info { file } => commands::info(&file, cli.variant),
        Commands::Dump { file, folder, raw } => {
            commands::dump(&file, folder.as_deref(), raw, cli.variant)
        }
        Commands::Create { file, folder } => commands::create(&file, &folder),
        Commands::Types => {
            commands::print_types();
            Ok(())
        }
    }
}
