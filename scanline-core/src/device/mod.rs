//! Display device boundary.
//!
//! - `fbdev`: the Linux `/dev/fb*` implementation (ioctl + mmap)
//! - `memory`: an in-process stand-in with the same contract, for headless
//!   rendering and tests

pub mod fbdev;
pub mod memory;

pub use fbdev::FbDevice;
pub use memory::{HeapRegion, MemoryDevice};

use crate::sys::{FixScreenInfo, VarScreenInfo};
use std::io;

/// A fixed-length byte region a surface can draw into.
///
/// Device mappings and plain heap buffers both implement this so every
/// buffering strategy reads and writes through one interface.
pub trait Region: Send {
    fn as_slice(&self) -> &[u8];
    fn as_mut_slice(&mut self) -> &mut [u8];

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Give the memory back. Called exactly once by the owning surface.
    fn release(self: Box<Self>) -> io::Result<()>;
}

/// Everything the surface needs from a framebuffer device.
pub trait DisplayDevice: Send {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    fn variable_info(&mut self) -> io::Result<VarScreenInfo>;
    fn set_variable_info(&mut self, info: &VarScreenInfo) -> io::Result<()>;
    fn fixed_info(&mut self) -> io::Result<FixScreenInfo>;

    /// Ask the device to scan out from `info.xoffset`/`info.yoffset`.
    fn pan_display(&mut self, info: &VarScreenInfo) -> io::Result<()>;

    /// Map `len` bytes of device memory, read/write and shared.
    fn map(&mut self, len: usize) -> io::Result<Box<dyn Region>>;

    fn close(self: Box<Self>) -> io::Result<()>;
}
