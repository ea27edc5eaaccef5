#![deny(clippy::all, clippy::pedantic)]
//! # Bitwise Runner
//!
//! Loads a scene file, runs the physics system headless for a number of
//! frames and reports collisions and final positions through `tracing`.
//! Set `RUST_LOG=debug` to see body lifecycle events.

mod app;
mod scene_file;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use physics::Broadphase;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bitwise", about = "Run a physics scene headless")]
pub struct Cli {
    /// Scene file (JSON). The built-in demo scene is used when omitted.
    #[arg(long)]
    pub scene: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 120)]
    pub frames: u32,

    /// Frame duration in milliseconds.
    #[arg(long, default_value_t = 16.0)]
    pub frame_ms: f32,

    /// Override the scene's broadphase (`axis-sweep` or `dbvt`).
    #[arg(long)]
    pub broadphase: Option<Broadphase>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    app::run(&cli)
}
