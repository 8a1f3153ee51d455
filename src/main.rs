// pixview - A minimal pan-and-zoom image viewer for Wayland
// Draws every image pixel as a rectangle through a movable, zoomable view

mod app;
mod cli;
mod image_loader;
mod input;
mod render;
mod view;
mod wayland;

use anyhow::{Context, Result};
use app::AppState;
use log::info;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args = cli::parse_args()?;

    info!(
        "Starting pixview with image: {:?}, window: {}x{}, scale: {}",
        args.image_path, args.width, args.height, args.scale
    );

    // Load the image before any window exists, so failure has nothing to release
    let image_data = image_loader::load_image(&args.image_path)
        .context("Failed to load image")?;

    info!(
        "Image loaded: {}x{} pixels ({} channels)",
        image_data.width, image_data.height, image_data.channels
    );

    let state = AppState::new(image_data, (args.width, args.height), args.scale);
    wayland::run(state, &args.title)
}
