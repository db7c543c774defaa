// scanline-core/src/format.rs
//! Packed pixel layout.
//!
//! A framebuffer describes each channel as a `(offset, length)` pair inside
//! one pixel word. Packing shifts each value into place and ORs the results;
//! nothing is clamped, so a value wider than its channel spills into the
//! neighbouring bits (an 8-bit red on a 5-bit channel, say).

use crate::sys::VarScreenInfo;
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════
// Channel
// ════════════════════════════════════════════════════════════════════

/// Where one color channel lives inside a packed pixel word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub offset: u32,
    pub length: u32,
}

impl Channel {
    pub const fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    /// Bits owned by this channel, already shifted into position.
    pub fn mask(&self) -> u32 {
        if self.length == 0 || self.offset >= 32 {
            return 0;
        }
        let width = if self.length >= 64 {
            u64::MAX
        } else {
            (1u64 << self.length) - 1
        };
        ((width << self.offset) & u64::from(u32::MAX)) as u32
    }

    /// Shift `value` into this channel's position. Not masked.
    pub fn pack(&self, value: u32) -> u32 {
        value.checked_shl(self.offset).unwrap_or(0)
    }

    /// Pull this channel's value back out of a packed word.
    pub fn extract(&self, word: u32) -> u32 {
        (word & self.mask()).checked_shr(self.offset).unwrap_or(0)
    }
}

// ════════════════════════════════════════════════════════════════════
// Pixel format
// ════════════════════════════════════════════════════════════════════

/// Unpacked channel values of one pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
    pub alpha: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelFormat {
    pub red: Channel,
    pub green: Channel,
    pub blue: Channel,
    pub alpha: Channel,
    pub bits_per_pixel: u32,
}

impl PixelFormat {
    pub fn from_var_info(var: &VarScreenInfo) -> Self {
        Self {
            red: Channel::new(var.red.offset, var.red.length),
            green: Channel::new(var.green.offset, var.green.length),
            blue: Channel::new(var.blue.offset, var.blue.length),
            alpha: Channel::new(var.transp.offset, var.transp.length),
            bits_per_pixel: var.bits_per_pixel,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel / 8) as usize
    }

    pub fn pack_rgb(&self, r: u8, g: u8, b: u8) -> u32 {
        self.red.pack(r.into()) | self.green.pack(g.into()) | self.blue.pack(b.into())
    }

    pub fn pack_rgba(&self, r: u8, g: u8, b: u8, a: u8) -> u32 {
        self.pack_rgb(r, g, b) | self.alpha.pack(a.into())
    }

    pub fn unpack(&self, word: u32) -> Rgba {
        Rgba {
            red: self.red.extract(word),
            green: self.green.extract(word),
            blue: self.blue.extract(word),
            alpha: self.alpha.extract(word),
        }
    }

    /// True if any two channel masks share a bit.
    pub fn masks_overlap(&self) -> bool {
        let masks = [
            self.red.mask(),
            self.green.mask(),
            self.blue.mask(),
            self.alpha.mask(),
        ];
        let mut seen = 0u32;
        for m in masks {
            if seen & m != 0 {
                return true;
            }
            seen |= m;
        }
        false
    }

    /// True if every channel fits inside `bits_per_pixel`.
    pub fn fits_pixel_width(&self) -> bool {
        let width = self.bits_per_pixel.min(32);
        [self.red, self.green, self.blue, self.alpha]
            .iter()
            .filter(|c| c.length > 0)
            .all(|c| c.offset.saturating_add(c.length) <= width)
    }
}

// ════════════════════════════════════════════════════════════════════
// Negotiation helpers
// ════════════════════════════════════════════════════════════════════

/// Turn off grayscale and claim any bits left over after red, green and
/// blue as an alpha channel sitting directly above them.
pub fn fixup_alpha(var: &mut VarScreenInfo) {
    var.grayscale = 0;

    let rgb_length = var.red.length + var.green.length + var.blue.length;
    if rgb_length < var.bits_per_pixel {
        var.transp.offset = rgb_length;
        var.transp.length = var.bits_per_pixel - rgb_length;
    }
}
