pub mod console;
pub mod device;
pub mod error;
pub mod format;
pub mod surface;
pub mod sys;

// Re-export the main types so users can just use `scanline_core::Surface`
pub use console::ConsoleGuard;
pub use device::{DisplayDevice, FbDevice, MemoryDevice, Region};
pub use error::SurfaceError;
pub use format::{Channel, PixelFormat, Rgba};
pub use surface::{BlendMode, BufferingMode, Geometry, OpenOptions, PixelTarget, Surface};

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Everything negotiated at open time, in one serializable snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SurfaceReport {
    pub device: String,
    pub buffering: BufferingMode,
    pub exclusive: bool,
    /// Virtual console held in graphics mode while the surface is open.
    pub console: Option<PathBuf>,
    pub geometry: Geometry,
    pub format: PixelFormat,
    pub black: u32,
    pub white: u32,
}

impl SurfaceReport {
    pub fn new(surface: &Surface) -> Self {
        Self {
            device: surface.device_name(),
            buffering: surface.buffering(),
            exclusive: surface.is_exclusive(),
            console: surface.console_tty().map(Path::to_path_buf),
            geometry: *surface.geometry(),
            format: *surface.format(),
            black: surface.black(),
            white: surface.white(),
        }
    }
}
