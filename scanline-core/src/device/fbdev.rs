// scanline-core/src/device/fbdev.rs

use super::{DisplayDevice, Region};
use crate::error::SurfaceError;
use crate::sys::{FixScreenInfo, VarScreenInfo, ioctl};
use nix::sys::mman::{MapFlags, ProtFlags, mmap, munmap};
use std::ffi::c_void;
use std::fs::{File, OpenOptions};
use std::io;
use std::mem::ManuallyDrop;
use std::num::NonZeroUsize;
use std::os::fd::{AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

pub const PRIMARY_PATH: &str = "/dev/fb0";
pub const SECONDARY_PATH: &str = "/dev/fb/0";

/// A Linux framebuffer device node opened read/write.
#[derive(Debug)]
pub struct FbDevice {
    file: File,
    path: PathBuf,
}

impl FbDevice {
    /// Open `primary`, falling back to `secondary`.
    pub fn open(primary: &Path, secondary: &Path) -> Result<Self, SurfaceError> {
        match Self::open_path(primary) {
            Ok(dev) => Ok(dev),
            Err(first) => {
                tracing::debug!("{}: {}; trying {}", primary.display(), first, secondary.display());
                Self::open_path(secondary).map_err(|source| SurfaceError::DeviceUnavailable {
                    primary: primary.to_path_buf(),
                    secondary: secondary.to_path_buf(),
                    source,
                })
            }
        }
    }

    pub fn open_default() -> Result<Self, SurfaceError> {
        Self::open(Path::new(PRIMARY_PATH), Path::new(SECONDARY_PATH))
    }

    fn open_path(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        tracing::info!("Opened framebuffer {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplayDevice for FbDevice {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn variable_info(&mut self) -> io::Result<VarScreenInfo> {
        let mut info = VarScreenInfo::default();
        unsafe { ioctl::fbioget_vscreeninfo(self.file.as_raw_fd(), &mut info) }?;
        Ok(info)
    }

    fn set_variable_info(&mut self, info: &VarScreenInfo) -> io::Result<()> {
        unsafe { ioctl::fbioput_vscreeninfo(self.file.as_raw_fd(), info) }?;
        Ok(())
    }

    fn fixed_info(&mut self) -> io::Result<FixScreenInfo> {
        let mut info = FixScreenInfo::default();
        unsafe { ioctl::fbioget_fscreeninfo(self.file.as_raw_fd(), &mut info) }?;
        Ok(info)
    }

    fn pan_display(&mut self, info: &VarScreenInfo) -> io::Result<()> {
        unsafe { ioctl::fbiopan_display(self.file.as_raw_fd(), info) }?;
        Ok(())
    }

    fn map(&mut self, len: usize) -> io::Result<Box<dyn Region>> {
        let length = NonZeroUsize::new(len)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "zero-length mapping"))?;

        let ptr = unsafe {
            mmap(
                None,
                length,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &self.file,
                0,
            )
        }?;

        Ok(Box::new(MappedRegion { ptr, len }))
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let fd = self.file.into_raw_fd();
        nix::unistd::close(fd)?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════
// Mapped region
// ════════════════════════════════════════════════════════════════════

/// Device memory mapped with `MAP_SHARED`. Unmapped on release or drop.
struct MappedRegion {
    ptr: NonNull<c_void>,
    len: usize,
}

// The mapping is owned by exactly one surface.
unsafe impl Send for MappedRegion {}

impl Region for MappedRegion {
    fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr().cast::<u8>(), self.len) }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr().cast::<u8>(), self.len) }
    }

    fn release(self: Box<Self>) -> io::Result<()> {
        let this = ManuallyDrop::new(*self);
        unsafe { munmap(this.ptr, this.len) }?;
        Ok(())
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        if let Err(e) = unsafe { munmap(self.ptr, self.len) } {
            tracing::warn!("failed to unmap {} bytes: {}", self.len, e);
        }
    }
}
