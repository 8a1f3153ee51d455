// Command line interface module
// Handles parsing of command line arguments

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

/// Largest accepted window dimension, keeps the shm stride within `i32`
pub const MAX_WINDOW_SIZE: u32 = 16384;

/// pixview - A minimal pan-and-zoom image viewer for Wayland
#[derive(Parser, Debug)]
#[command(name = "pixview")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the image file
    #[arg(value_name = "IMAGE")]
    pub image_path: Option<PathBuf>,

    /// Initial window width
    #[arg(short = 'W', long, default_value = "800", value_parser = clap::value_parser!(u32).range(1..=MAX_WINDOW_SIZE as i64))]
    pub width: u32,

    /// Initial window height
    #[arg(short = 'H', long, default_value = "600", value_parser = clap::value_parser!(u32).range(1..=MAX_WINDOW_SIZE as i64))]
    pub height: u32,

    /// Initial zoom factor (e.g., 0.5 for half size, 2.0 for double)
    #[arg(short, long, default_value = "1.0", value_parser = parse_scale)]
    pub scale: f64,

    /// Window title
    #[arg(short, long, default_value = "Image Viewer")]
    pub title: String,
}

/// Parsed arguments with the image path resolved
#[derive(Debug)]
pub struct ParsedArgs {
    pub image_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub title: String,
}

/// Parse scale value and ensure it's a usable zoom factor
fn parse_scale(s: &str) -> Result<f64, String> {
    let scale: f64 = s.parse().map_err(|_| "Invalid scale value")?;
    if !scale.is_finite() || scale <= 0.0 {
        return Err("Scale must be a positive number".to_string());
    }
    Ok(scale)
}

impl TryFrom<Args> for ParsedArgs {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        let Some(image_path) = args.image_path else {
            bail!("No image provided.\nUsage: pixview <IMAGE> [OPTIONS]");
        };

        Ok(Self {
            image_path,
            width: args.width,
            height: args.height,
            scale: args.scale,
            title: args.title,
        })
    }
}

/// Parse command line arguments
pub fn parse_args() -> Result<ParsedArgs> {
    ParsedArgs::try_from(Args::parse())
}
