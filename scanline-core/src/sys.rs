// scanline-core/src/sys.rs
//! Kernel ABI for the fbdev and virtual-console interfaces.
//!
//! The structs mirror `<linux/fb.h>` field for field; the ioctl wrappers are
//! generated with the `nix` "bad" macros because the fbdev and KD request
//! numbers predate the `_IOR`/`_IOW` encoding.

use std::ffi::c_ulong;

// ════════════════════════════════════════════════════════════════════
// Request numbers
// ════════════════════════════════════════════════════════════════════

pub const FBIOGET_VSCREENINFO: u32 = 0x4600;
pub const FBIOPUT_VSCREENINFO: u32 = 0x4601;
pub const FBIOGET_FSCREENINFO: u32 = 0x4602;
pub const FBIOPAN_DISPLAY: u32 = 0x4606;

pub const KDSETMODE: u32 = 0x4B3A;
pub const KDGETMODE: u32 = 0x4B3B;

pub const KD_TEXT: i32 = 0x00;
pub const KD_GRAPHICS: i32 = 0x01;

// ════════════════════════════════════════════════════════════════════
// Screen info
// ════════════════════════════════════════════════════════════════════

/// One channel of `fb_var_screeninfo` (`struct fb_bitfield`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbBitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

/// `struct fb_var_screeninfo`: the negotiable part of the mode.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarScreenInfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo`: what the driver decided for us.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixScreenInfo {
    pub id: [u8; 16],
    pub smem_start: c_ulong,
    pub smem_len: u32,
    pub type_: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub line_length: u32,
    pub mmio_start: c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

impl FixScreenInfo {
    /// Driver identification string, trimmed at the first NUL.
    pub fn id_str(&self) -> String {
        let end = self.id.iter().position(|&b| b == 0).unwrap_or(self.id.len());
        String::from_utf8_lossy(&self.id[..end]).into_owned()
    }
}

// ════════════════════════════════════════════════════════════════════
// ioctl wrappers
// ════════════════════════════════════════════════════════════════════

pub mod ioctl {
    use super::{FixScreenInfo, VarScreenInfo};

    nix::ioctl_read_bad!(fbioget_vscreeninfo, super::FBIOGET_VSCREENINFO, VarScreenInfo);
    nix::ioctl_write_ptr_bad!(fbioput_vscreeninfo, super::FBIOPUT_VSCREENINFO, VarScreenInfo);
    nix::ioctl_read_bad!(fbioget_fscreeninfo, super::FBIOGET_FSCREENINFO, FixScreenInfo);
    nix::ioctl_write_ptr_bad!(fbiopan_display, super::FBIOPAN_DISPLAY, VarScreenInfo);

    nix::ioctl_read_bad!(kd_get_mode, super::KDGETMODE, libc::c_int);
    nix::ioctl_write_int_bad!(kd_set_mode, super::KDSETMODE);
}
