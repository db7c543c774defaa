// scanline-core/src/device/memory.rs
//! In-process display device.
//!
//! Behaves like a framebuffer driver with a fixed amount of video memory:
//! mappings larger than `smem_len` fail, pan requests move the scan-out
//! offset, and format writes are accepted (or rejected on request). Every
//! interaction is recorded in a shared [`DeviceLog`] so callers can inspect
//! it after the device has been handed to a surface.

use super::{DisplayDevice, Region};
use crate::format::Channel;
use crate::sys::{FbBitfield, FixScreenInfo, VarScreenInfo};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

// ════════════════════════════════════════════════════════════════════
// Heap region
// ════════════════════════════════════════════════════════════════════

/// A zero-initialised heap buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapRegion {
    buf: Vec<u8>,
}

impl HeapRegion {
    /// Allocate `len` bytes, reporting out-of-memory instead of aborting.
    pub fn allocate(len: usize) -> io::Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        buf.resize(len, 0);
        Ok(Self { buf })
    }
}

impl Region for HeapRegion {
    fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    fn release(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════
// Device log
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRecord {
    pub set_variable_calls: usize,
    /// `yoffset` of every pan request, accepted or not.
    pub pans: Vec<u32>,
    /// Length of every successful mapping, in order.
    pub mapped: Vec<usize>,
    /// Length of every released mapping, in order.
    pub released: Vec<usize>,
    pub closed: bool,
}

/// Shared view of what happened to a [`MemoryDevice`].
#[derive(Debug, Clone, Default)]
pub struct DeviceLog(Arc<Mutex<DeviceRecord>>);

impl DeviceLog {
    fn lock(&self) -> MutexGuard<'_, DeviceRecord> {
        // A panicking test thread must not hide the record from the others.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> DeviceRecord {
        self.lock().clone()
    }
}

/// A mapping handed out by [`MemoryDevice`]; reports its release to the log.
struct LoggedRegion {
    heap: HeapRegion,
    log: DeviceLog,
}

impl Region for LoggedRegion {
    fn as_slice(&self) -> &[u8] {
        self.heap.as_slice()
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self.heap.as_mut_slice()
    }

    fn release(self: Box<Self>) -> io::Result<()> {
        self.log.lock().released.push(self.heap.buf.len());
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════
// Memory device
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct MemoryDevice {
    var: VarScreenInfo,
    fix: FixScreenInfo,
    reject_set_variable: bool,
    reject_pan: bool,
    log: DeviceLog,
}

impl MemoryDevice {
    /// A `width`×`height` screen with a common layout for the depth:
    /// RGB565 at 16 bits, 8-bit channels red-over-green-over-blue at 24 and
    /// 32 bits. Video memory holds two screens, so panning fits.
    pub fn new(width: u32, height: u32, bits_per_pixel: u32) -> Self {
        let (red, green, blue) = match bits_per_pixel {
            16 => (bitfield(11, 5), bitfield(5, 6), bitfield(0, 5)),
            8 => (bitfield(5, 3), bitfield(2, 3), bitfield(0, 2)),
            _ => (bitfield(16, 8), bitfield(8, 8), bitfield(0, 8)),
        };

        let var = VarScreenInfo {
            xres: width,
            yres: height,
            xres_virtual: width,
            yres_virtual: height,
            bits_per_pixel,
            red,
            green,
            blue,
            ..VarScreenInfo::default()
        };

        let line_length = width * (bits_per_pixel / 8);
        let mut id = [0u8; 16];
        id[..6].copy_from_slice(b"memfb\0");
        let fix = FixScreenInfo {
            id,
            smem_len: line_length * height * 2,
            line_length,
            ypanstep: 1,
            ..FixScreenInfo::default()
        };

        Self {
            var,
            fix,
            reject_set_variable: false,
            reject_pan: false,
            log: DeviceLog::default(),
        }
    }

    pub fn with_virtual_height(mut self, yres_virtual: u32) -> Self {
        self.var.yres_virtual = yres_virtual;
        self
    }

    /// Padded scanlines, as many drivers use.
    pub fn with_line_length(mut self, line_length: u32) -> Self {
        self.fix.line_length = line_length;
        self
    }

    pub fn with_video_memory(mut self, smem_len: u32) -> Self {
        self.fix.smem_len = smem_len;
        self
    }

    pub fn with_offsets(mut self, xoffset: u32, yoffset: u32) -> Self {
        self.var.xoffset = xoffset;
        self.var.yoffset = yoffset;
        self
    }

    pub fn with_channels(mut self, red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
        self.var.red = bitfield(red.offset, red.length);
        self.var.green = bitfield(green.offset, green.length);
        self.var.blue = bitfield(blue.offset, blue.length);
        self.var.transp = bitfield(alpha.offset, alpha.length);
        self
    }

    pub fn with_grayscale(mut self) -> Self {
        self.var.grayscale = 1;
        self
    }

    /// Fail every `set_variable_info`, like drivers with a fixed mode.
    pub fn rejecting_set_variable_info(mut self) -> Self {
        self.reject_set_variable = true;
        self
    }

    pub fn rejecting_pan(mut self) -> Self {
        self.reject_pan = true;
        self
    }

    pub fn log(&self) -> DeviceLog {
        self.log.clone()
    }
}

fn bitfield(offset: u32, length: u32) -> FbBitfield {
    FbBitfield {
        offset,
        length,
        msb_right: 0,
    }
}

impl DisplayDevice for MemoryDevice {
    fn describe(&self) -> String {
        format!("memory:{}x{}@{}", self.var.xres, self.var.yres, self.var.bits_per_pixel)
    }

    fn variable_info(&mut self) -> io::Result<VarScreenInfo> {
        Ok(self.var)
    }

    fn set_variable_info(&mut self, info: &VarScreenInfo) -> io::Result<()> {
        self.log.lock().set_variable_calls += 1;
        if self.reject_set_variable {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        self.var = *info;
        Ok(())
    }

    fn fixed_info(&mut self) -> io::Result<FixScreenInfo> {
        Ok(self.fix)
    }

    fn pan_display(&mut self, info: &VarScreenInfo) -> io::Result<()> {
        self.log.lock().pans.push(info.yoffset);
        if self.reject_pan {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        self.var.xoffset = info.xoffset;
        self.var.yoffset = info.yoffset;
        Ok(())
    }

    fn map(&mut self, len: usize) -> io::Result<Box<dyn Region>> {
        if len == 0 || len > self.fix.smem_len as usize {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        let heap = HeapRegion::allocate(len)?;
        self.log.lock().mapped.push(len);
        Ok(Box::new(LoggedRegion {
            heap,
            log: self.log.clone(),
        }))
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        self.log.lock().closed = true;
        Ok(())
    }
}
