// scanline-core/src/surface.rs
//! The drawable surface.
//!
//! A surface owns one display device, the negotiated pixel format and one of
//! three buffering strategies:
//!
//! - `Unbuffered`: draw straight into the mapped device memory.
//! - `Shadow`: draw into a heap buffer, `present` copies it to the device.
//! - `DoublePan`: map two buffers of device memory and `present` pans the
//!   display to the one just drawn. No copy.
//!
//! Only opening can fail. Everything after that (pan requests, console mode,
//! teardown) logs and carries on: a frame already on its way to the screen
//! is worth more than a clean abort.

use crate::console::ConsoleGuard;
use crate::device::fbdev::{PRIMARY_PATH, SECONDARY_PATH};
use crate::device::{DisplayDevice, FbDevice, HeapRegion, Region};
use crate::error::{Result, SurfaceError};
use crate::format::{Channel, PixelFormat, Rgba, fixup_alpha};
use crate::sys::{FixScreenInfo, VarScreenInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ════════════════════════════════════════════════════════════════════
// Modes
// ════════════════════════════════════════════════════════════════════

/// How drawing reaches the screen. Fixed for the life of a surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BufferingMode {
    #[default]
    Unbuffered,
    Shadow,
    DoublePan,
}

impl fmt::Display for BufferingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BufferingMode::Unbuffered => "unbuffered",
            BufferingMode::Shadow => "shadow",
            BufferingMode::DoublePan => "double-pan",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown buffering mode {0:?} (expected none, shadow or pan)")]
pub struct ParseBufferingModeError(pub String);

impl FromStr for BufferingMode {
    type Err = ParseBufferingModeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "unbuffered" => Ok(BufferingMode::Unbuffered),
            "shadow" | "mem" | "memory" => Ok(BufferingMode::Shadow),
            "pan" | "double-pan" | "doublepan" => Ok(BufferingMode::DoublePan),
            _ => Err(ParseBufferingModeError(s.to_string())),
        }
    }
}

/// Reserved compositing selector.
///
/// Every mode currently overwrites the destination with the source pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    None,
    Alpha,
    Additive,
}

// ════════════════════════════════════════════════════════════════════
// Pixel target
// ════════════════════════════════════════════════════════════════════

/// Anything a rasterizer can plot into.
pub trait PixelTarget {
    /// Plot one pixel. Coordinates off the target are silently ignored.
    fn write_pixel(&mut self, x: i32, y: i32, pixel: u32);
}

// ════════════════════════════════════════════════════════════════════
// Geometry
// ════════════════════════════════════════════════════════════════════

/// Negotiated screen geometry. `byte_size` is always
/// `virtual_height * stride`, whatever the buffering mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub virtual_width: u32,
    pub virtual_height: u32,
    /// Bytes per scanline.
    pub stride: u32,
    pub byte_size: usize,
    /// Scan-out offsets reported by the device at open time, added to every
    /// pixel address. Under `DoublePan` the vertical pan picks the buffer
    /// instead, so `y_offset` is 0 there.
    pub x_offset: u32,
    pub y_offset: u32,
}

impl Geometry {
    fn from_info(var: &VarScreenInfo, fix: &FixScreenInfo) -> Self {
        Self {
            width: var.xres,
            height: var.yres,
            virtual_width: var.xres_virtual,
            virtual_height: var.yres_virtual,
            stride: fix.line_length,
            byte_size: var.yres_virtual as usize * fix.line_length as usize,
            x_offset: var.xoffset,
            y_offset: var.yoffset,
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Open options
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct OpenOptions {
    buffering: BufferingMode,
    exclusive: bool,
    primary_path: PathBuf,
    secondary_path: PathBuf,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            buffering: BufferingMode::default(),
            exclusive: false,
            primary_path: PathBuf::from(PRIMARY_PATH),
            secondary_path: PathBuf::from(SECONDARY_PATH),
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffering(mut self, mode: BufferingMode) -> Self {
        self.buffering = mode;
        self
    }

    /// Switch the controlling virtual console to graphics mode while open.
    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn primary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.primary_path = path.into();
        self
    }

    pub fn secondary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secondary_path = path.into();
        self
    }

    /// Open the framebuffer device node and negotiate a surface on it.
    pub fn open(&self) -> Result<Surface> {
        let device = FbDevice::open(&self.primary_path, &self.secondary_path)?;
        self.open_with(Box::new(device))
    }

    /// Negotiate a surface on an already opened device.
    pub fn open_with(&self, device: Box<dyn DisplayDevice>) -> Result<Surface> {
        Surface::negotiate(device, self.buffering, self.exclusive)
    }
}

// ════════════════════════════════════════════════════════════════════
// Buffers
// ════════════════════════════════════════════════════════════════════

enum Buffers {
    Unbuffered {
        front: Box<dyn Region>,
    },
    Shadow {
        front: Box<dyn Region>,
        back: Box<dyn Region>,
    },
    /// One mapping of two buffers; `back` is the index (0 or 1) drawn into.
    DoublePan {
        region: Box<dyn Region>,
        back: usize,
    },
}

impl Buffers {
    fn allocate(device: &mut dyn DisplayDevice, mode: BufferingMode, size: usize) -> Result<Self> {
        match mode {
            BufferingMode::Unbuffered => {
                let front = device.map(size).map_err(|source| SurfaceError::AllocationFailed {
                    what: "map front buffer",
                    source,
                })?;
                Ok(Buffers::Unbuffered { front })
            }
            BufferingMode::Shadow => {
                let front = device.map(size).map_err(|source| SurfaceError::AllocationFailed {
                    what: "map front buffer",
                    source,
                })?;
                match HeapRegion::allocate(size) {
                    Ok(back) => Ok(Buffers::Shadow {
                        front,
                        back: Box::new(back),
                    }),
                    Err(source) => {
                        release(front, "front buffer");
                        Err(SurfaceError::AllocationFailed {
                            what: "allocate back buffer",
                            source,
                        })
                    }
                }
            }
            BufferingMode::DoublePan => {
                let double = size.checked_mul(2).ok_or_else(|| SurfaceError::AllocationFailed {
                    what: "size double buffer",
                    source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
                })?;
                let region = device.map(double).map_err(|source| SurfaceError::AllocationFailed {
                    what: "map double buffer",
                    source,
                })?;
                Ok(Buffers::DoublePan { region, back: 1 })
            }
        }
    }

    fn active(&self, size: usize) -> &[u8] {
        match self {
            Buffers::Unbuffered { front } => front.as_slice(),
            Buffers::Shadow { back, .. } => back.as_slice(),
            Buffers::DoublePan { region, back } => &region.as_slice()[back * size..(back + 1) * size],
        }
    }

    fn active_mut(&mut self, size: usize) -> &mut [u8] {
        match self {
            Buffers::Unbuffered { front } => front.as_mut_slice(),
            Buffers::Shadow { back, .. } => back.as_mut_slice(),
            Buffers::DoublePan { region, back } => {
                &mut region.as_mut_slice()[*back * size..(*back + 1) * size]
            }
        }
    }

    fn front(&self, size: usize) -> &[u8] {
        match self {
            Buffers::Unbuffered { front } | Buffers::Shadow { front, .. } => front.as_slice(),
            Buffers::DoublePan { region, back } => {
                let front = 1 - back;
                &region.as_slice()[front * size..(front + 1) * size]
            }
        }
    }

    /// Back buffer released before the front, the reverse of allocation.
    fn release_all(self) {
        match self {
            Buffers::Unbuffered { front } => release(front, "front buffer"),
            Buffers::Shadow { front, back } => {
                release(back, "back buffer");
                release(front, "front buffer");
            }
            Buffers::DoublePan { region, .. } => release(region, "double buffer"),
        }
    }
}

fn release(region: Box<dyn Region>, what: &str) {
    if let Err(e) = region.release() {
        tracing::warn!("failed to release {}: {}", what, e);
    }
}

// ════════════════════════════════════════════════════════════════════
// Surface
// ════════════════════════════════════════════════════════════════════

/// What `configure` settled on, before the surface is assembled.
struct Negotiated {
    var: VarScreenInfo,
    fix: FixScreenInfo,
    format: PixelFormat,
    buffers: Buffers,
    pan_offset: u32,
}

pub struct Surface {
    device: Option<Box<dyn DisplayDevice>>,
    buffers: Option<Buffers>,
    console: Option<ConsoleGuard>,
    var: VarScreenInfo,
    format: PixelFormat,
    geometry: Geometry,
    buffering: BufferingMode,
    blend: BlendMode,
    pan_offset: u32,
    black: u32,
    white: u32,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("device", &self.device.as_ref().map(|d| d.describe()))
            .field("format", &self.format)
            .field("geometry", &self.geometry)
            .field("buffering", &self.buffering)
            .field("blend", &self.blend)
            .field("pan_offset", &self.pan_offset)
            .field("console", &self.console)
            .finish()
    }
}

impl Surface {
    /// Open the default framebuffer (`/dev/fb0`, then `/dev/fb/0`).
    pub fn open(buffering: BufferingMode, exclusive: bool) -> Result<Self> {
        let device = FbDevice::open_default()?;
        Self::negotiate(Box::new(device), buffering, exclusive)
    }

    fn negotiate(mut device: Box<dyn DisplayDevice>, buffering: BufferingMode, exclusive: bool) -> Result<Self> {
        match Self::configure(device.as_mut(), buffering) {
            Ok(Negotiated {
                var,
                fix,
                format,
                buffers,
                pan_offset,
            }) => {
                let mut geometry = Geometry::from_info(&var, &fix);
                if buffering == BufferingMode::DoublePan {
                    geometry.y_offset = 0;
                }
                let console = if exclusive { ConsoleGuard::acquire() } else { None };

                tracing::info!(
                    "{}: {}x{} (virtual {}), {} bpp, stride {}, {} bytes, {}",
                    device.describe(),
                    geometry.width,
                    geometry.height,
                    geometry.virtual_height,
                    format.bits_per_pixel,
                    geometry.stride,
                    geometry.byte_size,
                    buffering
                );

                Ok(Self {
                    device: Some(device),
                    buffers: Some(buffers),
                    console,
                    var,
                    black: format.pack_rgb(0x00, 0x00, 0x00),
                    white: format.pack_rgb(0xFF, 0xFF, 0xFF),
                    format,
                    geometry,
                    buffering,
                    blend: BlendMode::None,
                    pan_offset,
                })
            }
            Err(e) => {
                if let Err(close_err) = device.close() {
                    tracing::warn!("failed to close fb device: {}", close_err);
                }
                Err(e)
            }
        }
    }

    /// Format fixup, re-query and buffer allocation. Leaves nothing
    /// allocated on error.
    fn configure(device: &mut dyn DisplayDevice, buffering: BufferingMode) -> Result<Negotiated> {
        let mut var = device.variable_info().unwrap_or_else(|e| {
            tracing::warn!("failed to get variable screen info: {}", e);
            VarScreenInfo::default()
        });

        fixup_alpha(&mut var);
        if let Err(e) = device.set_variable_info(&var) {
            tracing::warn!("failed to set variable screen info: {}", e);
        }

        // Whatever the driver reports now is what we draw with.
        let var = device.variable_info().unwrap_or_else(|e| {
            tracing::warn!("failed to get variable screen info: {}", e);
            var
        });
        let fix = device.fixed_info().unwrap_or_else(|e| {
            tracing::warn!("failed to get fixed screen info: {}", e);
            FixScreenInfo::default()
        });

        let format = validate_format(PixelFormat::from_var_info(&var))?;
        if fix.line_length == 0 || var.yres_virtual == 0 {
            return Err(SurfaceError::NegotiationFailed(format!(
                "stride {} x virtual height {} is empty",
                fix.line_length, var.yres_virtual
            )));
        }
        tracing::debug!(
            "negotiated format on {:?}: {:?}, offsets ({}, {})",
            fix.id_str(),
            format,
            var.xoffset,
            var.yoffset
        );

        let size = var.yres_virtual as usize * fix.line_length as usize;
        let mut buffers = Buffers::allocate(device, buffering, size)?;

        let mut var = var;
        let mut pan_offset = 0;
        if let Buffers::DoublePan { back, .. } = &mut buffers {
            pan_offset = settle_pan(device, &mut var);
            // Draw into whichever half is not on screen.
            *back = if pan_offset == 0 { 1 } else { 0 };
        }

        Ok(Negotiated {
            var,
            fix,
            format,
            buffers,
            pan_offset,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Visible width and height in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.geometry.width, self.geometry.height)
    }

    pub fn device_name(&self) -> String {
        self.device.as_ref().map(|d| d.describe()).unwrap_or_default()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    pub fn buffering(&self) -> BufferingMode {
        self.buffering
    }

    pub fn byte_size(&self) -> usize {
        self.geometry.byte_size
    }

    /// Current vertical scan-out offset in scanlines (`DoublePan` only).
    pub fn pan_offset(&self) -> u32 {
        self.pan_offset
    }

    pub fn is_exclusive(&self) -> bool {
        self.console.is_some()
    }

    /// The virtual console switched to graphics mode, if any.
    pub fn console_tty(&self) -> Option<&Path> {
        self.console.as_ref().map(|c| c.tty())
    }

    pub fn black(&self) -> u32 {
        self.black
    }

    pub fn white(&self) -> u32 {
        self.white
    }

    /// The buffer drawing goes into.
    pub fn active_buffer(&self) -> &[u8] {
        match &self.buffers {
            Some(b) => b.active(self.geometry.byte_size),
            None => &[],
        }
    }

    /// The buffer the device is showing.
    pub fn front_buffer(&self) -> &[u8] {
        match &self.buffers {
            Some(b) => b.front(self.geometry.byte_size),
            None => &[],
        }
    }

    // ── Colors ───────────────────────────────────────────────────────

    /// Pack 8-bit channel values into a pixel word. Values are not
    /// clamped to the channel width.
    pub fn pack_rgb(&self, r: u8, g: u8, b: u8) -> u32 {
        self.format.pack_rgb(r, g, b)
    }

    pub fn pack_rgba(&self, r: u8, g: u8, b: u8, a: u8) -> u32 {
        self.format.pack_rgba(r, g, b, a)
    }

    pub fn unpack(&self, pixel: u32) -> Rgba {
        self.format.unpack(pixel)
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    // ── Drawing ──────────────────────────────────────────────────────

    /// Byte offset of `(x, y)` in the active buffer, if the whole pixel
    /// fits there.
    fn pixel_offset(&self, x: i32, y: i32) -> Option<usize> {
        let bpp = self.format.bytes_per_pixel() as i64;
        let col = i64::from(x) + i64::from(self.geometry.x_offset);
        let row = i64::from(y) + i64::from(self.geometry.y_offset);
        if x < 0 || y < 0 || col >= i64::from(self.geometry.virtual_width.max(self.geometry.width)) {
            return None;
        }

        let offset = col * bpp + row * i64::from(self.geometry.stride);
        if offset + bpp > self.geometry.byte_size as i64 {
            return None;
        }
        Some(offset as usize)
    }

    /// Store `pixel` at `(x, y)` in the active buffer. Off-surface
    /// coordinates are a no-op.
    pub fn write_pixel(&mut self, x: i32, y: i32, pixel: u32) {
        let Some(offset) = self.pixel_offset(x, y) else {
            return;
        };
        let bpp = self.format.bytes_per_pixel();
        let size = self.geometry.byte_size;
        let blend = self.blend;
        let Some(buffers) = self.buffers.as_mut() else {
            return;
        };
        let dst = &mut buffers.active_mut(size)[offset..offset + bpp];

        match blend {
            // Compositing is reserved; all modes store the source as is.
            BlendMode::None | BlendMode::Alpha | BlendMode::Additive => store_pixel(dst, pixel),
        }
    }

    /// The pixel word at `(x, y)` in the active buffer.
    pub fn read_pixel(&self, x: i32, y: i32) -> Option<u32> {
        let offset = self.pixel_offset(x, y)?;
        let bpp = self.format.bytes_per_pixel();
        self.active_buffer().get(offset..offset + bpp).map(load_pixel)
    }

    /// Fill every byte of the active buffer with the low byte of `pixel`.
    ///
    /// This is a byte fill, not a pixel fill: for colors whose bytes differ
    /// only the lowest one survives. Black (all zero bytes) is exact.
    pub fn clear(&mut self, pixel: u32) {
        let size = self.geometry.byte_size;
        if let Some(buffers) = self.buffers.as_mut() {
            buffers.active_mut(size).fill(pixel as u8);
        }
    }

    /// Make the active buffer visible.
    pub fn present(&mut self) {
        let size = self.geometry.byte_size;
        match self.buffers.as_mut() {
            None | Some(Buffers::Unbuffered { .. }) => {}
            Some(Buffers::Shadow { front, back }) => {
                front.as_mut_slice().copy_from_slice(back.as_slice());
            }
            Some(Buffers::DoublePan { back, .. }) => {
                self.pan_offset = if self.pan_offset == 0 {
                    self.geometry.virtual_height
                } else {
                    0
                };
                self.var.yoffset = self.pan_offset;

                if let Some(device) = self.device.as_mut() {
                    if let Err(e) = device.pan_display(&self.var) {
                        tracing::warn!("failed to pan display: {}", e);
                    }
                }
                *back = 1 - *back;
                tracing::trace!("panned to {} ({} bytes per buffer)", self.pan_offset, size);
            }
        }
    }

    /// Release buffers, restore the console and close the device.
    pub fn close(mut self) {
        self.teardown();
    }

    /// Each step runs even if an earlier one failed.
    fn teardown(&mut self) {
        if let Some(buffers) = self.buffers.take() {
            buffers.release_all();
        }
        if let Some(console) = self.console.take() {
            console.restore();
        }
        if let Some(device) = self.device.take() {
            let name = device.describe();
            match device.close() {
                Ok(()) => tracing::debug!("closed {}", name),
                Err(e) => tracing::warn!("failed to close fb device {}: {}", name, e),
            }
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl PixelTarget for Surface {
    fn write_pixel(&mut self, x: i32, y: i32, pixel: u32) {
        Surface::write_pixel(self, x, y, pixel);
    }
}

// ════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════

fn validate_format(mut format: PixelFormat) -> Result<PixelFormat> {
    let bpp = format.bits_per_pixel;
    if bpp == 0 || bpp > 32 || bpp % 8 != 0 {
        return Err(SurfaceError::NegotiationFailed(format!(
            "{} bits per pixel is not addressable",
            bpp
        )));
    }

    if format.masks_overlap() || !format.fits_pixel_width() {
        tracing::warn!("alpha channel {:?} collides with the color channels; ignoring it", format.alpha);
        format.alpha = Channel::default();
    }
    if format.masks_overlap() || !format.fits_pixel_width() {
        return Err(SurfaceError::NegotiationFailed(format!(
            "color channels overlap or exceed {} bits: {:?}",
            bpp, format
        )));
    }
    Ok(format)
}

/// Bring a double-pan display back to the first buffer.
///
/// Returns the pan offset in effect afterwards: 0, or `yres_virtual` when
/// the device refuses to move and is still showing the second buffer.
fn settle_pan(device: &mut dyn DisplayDevice, var: &mut VarScreenInfo) -> u32 {
    if var.yoffset == 0 {
        return 0;
    }

    let reported = var.yoffset;
    var.yoffset = 0;
    match device.pan_display(var) {
        Ok(()) => {
            tracing::debug!("reset pan from {} to 0", reported);
            0
        }
        Err(e) => {
            tracing::warn!("failed to reset pan from {}: {}", reported, e);
            var.yoffset = reported;
            if reported >= var.yres_virtual {
                var.yres_virtual
            } else {
                0
            }
        }
    }
}

/// Store the low `dst.len()` bytes of `pixel` in memory order.
fn store_pixel(dst: &mut [u8], pixel: u32) {
    match dst.len() {
        4 => dst.copy_from_slice(&pixel.to_ne_bytes()),
        2 => dst.copy_from_slice(&(pixel as u16).to_ne_bytes()),
        3 => dst.copy_from_slice(&pixel.to_le_bytes()[..3]),
        1 => dst[0] = pixel as u8,
        _ => {}
    }
}

fn load_pixel(src: &[u8]) -> u32 {
    match src.len() {
        4 => u32::from_ne_bytes([src[0], src[1], src[2], src[3]]),
        2 => u32::from(u16::from_ne_bytes([src[0], src[1]])),
        3 => u32::from_le_bytes([src[0], src[1], src[2], 0]),
        1 => u32::from(src[0]),
        _ => 0,
    }
}
