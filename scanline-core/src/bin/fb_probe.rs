// scanline-core/src/bin/fb_probe.rs
//! Open the framebuffer, print what was negotiated as JSON, close it.
//!
//!   fb_probe [buffering] [device]

use anyhow::{Context, Result};
use scanline_core::{BufferingMode, OpenOptions, SurfaceReport};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();

    let mut args = std::env::args().skip(1);
    let buffering: BufferingMode = match args.next() {
        Some(arg) => arg.parse().context("bad buffering mode")?,
        None => BufferingMode::Unbuffered,
    };

    let mut options = OpenOptions::new().buffering(buffering);
    if let Some(path) = args.next() {
        options = options.primary_path(path);
    }

    let surface = options.open().context("failed to open framebuffer")?;
    let report = SurfaceReport::new(&surface);
    surface.close();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
