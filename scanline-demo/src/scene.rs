// scanline-demo/src/scene.rs
//! The demo picture: a white dial with a red rim and a black hand that
//! sweeps 0.1 rad per frame.

use scanline_core::Surface;
use scanline_raster::{draw_filled_circle, draw_line};

pub const ANGLE_STEP: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct Dial {
    cx: i32,
    cy: i32,
    radius: i32,
    angle: f32,
}

impl Dial {
    /// Centred on the screen, as large as fits.
    pub fn fit(width: u32, height: u32) -> Self {
        Self {
            cx: (width / 2) as i32,
            cy: (height / 2) as i32,
            radius: (width / 2).min(height / 2) as i32,
            angle: 0.0,
        }
    }

    pub fn centre(&self) -> (i32, i32) {
        (self.cx, self.cy)
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Tip of the hand at the current angle.
    pub fn hand_tip(&self) -> (i32, i32) {
        let r = self.radius as f32;
        (
            self.cx + (r * self.angle.cos()) as i32,
            self.cy + (r * self.angle.sin()) as i32,
        )
    }

    /// Draw one frame into the surface's active buffer and advance the hand.
    /// Does not present.
    pub fn render(&mut self, surface: &mut Surface) {
        let black = surface.black();
        let white = surface.white();
        let red = surface.pack_rgb(0xFF, 0x00, 0x00);

        surface.clear(black);

        let (x2, y2) = self.hand_tip();
        self.angle += ANGLE_STEP;

        draw_filled_circle(surface, self.cx, self.cy, self.radius, red, white);
        draw_line(surface, self.cx, self.cy, x2, y2, black);
    }
}
