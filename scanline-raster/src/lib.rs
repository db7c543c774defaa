//! # Scanline Raster
//!
//! Integer rasterization on top of a single primitive: plotting one pixel.
//! Nothing here clips. Off-surface coordinates go straight to the target,
//! which is expected to drop them.

pub use scanline_core::PixelTarget;

// ════════════════════════════════════════════════════════════════════
// Lines
// ════════════════════════════════════════════════════════════════════

/// Horizontal span on row `y`, both ends inclusive, in either order.
pub fn draw_hline<P: PixelTarget + ?Sized>(target: &mut P, x1: i32, x2: i32, y: i32, pixel: u32) {
    for x in x1.min(x2)..=x1.max(x2) {
        target.write_pixel(x, y, pixel);
    }
}

/// Vertical span on column `x`, both ends inclusive, in either order.
pub fn draw_vline<P: PixelTarget + ?Sized>(target: &mut P, x: i32, y1: i32, y2: i32, pixel: u32) {
    for y in y1.min(y2)..=y1.max(y2) {
        target.write_pixel(x, y, pixel);
    }
}

/// Line from `(x1, y1)` to `(x2, y2)`, both endpoints plotted.
///
/// Steps one pixel at a time along the axis with the larger delta and
/// carries the other axis in an error accumulator. Axis-aligned lines take
/// the span fast path and are plotted once. Deltas are carried in `i64` so
/// endpoints anywhere in `i32` are accepted.
pub fn draw_line<P: PixelTarget + ?Sized>(target: &mut P, x1: i32, y1: i32, x2: i32, y2: i32, pixel: u32) {
    if x1 == x2 {
        draw_vline(target, x1, y1, y2, pixel);
        return;
    }
    if y1 == y2 {
        draw_hline(target, x1, x2, y1, pixel);
        return;
    }

    let dx = i64::from(x2) - i64::from(x1);
    let dy = i64::from(y2) - i64::from(y1);
    let dxabs = dx.abs();
    let dyabs = dy.abs();
    let sdx = dx.signum();
    let sdy = dy.signum();

    // Both stay between the endpoints, so they always fit back into i32.
    let mut px = i64::from(x1);
    let mut py = i64::from(y1);
    target.write_pixel(px as i32, py as i32, pixel);

    if dxabs >= dyabs {
        let mut err = dxabs >> 1;
        for _ in 0..dxabs {
            err += dyabs;
            if err >= dxabs {
                err -= dxabs;
                py += sdy;
            }
            px += sdx;
            target.write_pixel(px as i32, py as i32, pixel);
        }
    } else {
        let mut err = dyabs >> 1;
        for _ in 0..dyabs {
            err += dxabs;
            if err >= dyabs {
                err -= dyabs;
                px += sdx;
            }
            py += sdy;
            target.write_pixel(px as i32, py as i32, pixel);
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Circles
// ════════════════════════════════════════════════════════════════════

/// Walks one octant of a midpoint circle, handing `(x, y)` offsets to
/// `step`. `x` starts at `radius` and shrinks; `y` starts at 0 and grows.
fn midpoint_octant(radius: i32, mut step: impl FnMut(i32, i32)) {
    if radius < 0 {
        return;
    }
    let mut error = -i64::from(radius);
    let mut x = radius;
    let mut y = 0;

    while x >= y {
        step(x, y);

        error += i64::from(y);
        y += 1;
        error += i64::from(y);

        if error >= 0 {
            error -= i64::from(x);
            x -= 1;
            error -= i64::from(x);
        }
    }
}

/// Centre plus offset, pinned to the `i32` range. A pinned coordinate is
/// off any real surface and gets dropped there.
fn offset(c: i32, d: i32) -> i32 {
    c.saturating_add(d)
}

fn plot_octants<P: PixelTarget + ?Sized>(target: &mut P, cx: i32, cy: i32, x: i32, y: i32, pixel: u32) {
    target.write_pixel(offset(cx, x), offset(cy, y), pixel);
    target.write_pixel(offset(cx, -x), offset(cy, y), pixel);
    target.write_pixel(offset(cx, x), offset(cy, -y), pixel);
    target.write_pixel(offset(cx, -x), offset(cy, -y), pixel);

    target.write_pixel(offset(cx, y), offset(cy, x), pixel);
    target.write_pixel(offset(cx, -y), offset(cy, x), pixel);
    target.write_pixel(offset(cx, y), offset(cy, -x), pixel);
    target.write_pixel(offset(cx, -y), offset(cy, -x), pixel);
}

/// Circle outline. Radius 0 plots the centre; a negative radius plots nothing.
pub fn draw_circle<P: PixelTarget + ?Sized>(target: &mut P, cx: i32, cy: i32, radius: i32, pixel: u32) {
    midpoint_octant(radius, |x, y| plot_octants(target, cx, cy, x, y, pixel));
}

/// Disc filled with `fill`, outlined with `pixel`.
///
/// Two passes: every row of the disc is spanned with the fill color first,
/// then the whole outline is plotted on top. Interleaving the two per step
/// lets later spans near the diagonal overwrite earlier outline points.
pub fn draw_filled_circle<P: PixelTarget + ?Sized>(
    target: &mut P,
    cx: i32,
    cy: i32,
    radius: i32,
    pixel: u32,
    fill: u32,
) {
    midpoint_octant(radius, |x, y| {
        draw_hline(target, offset(cx, x), offset(cx, -x), offset(cy, y), fill);
        draw_hline(target, offset(cx, x), offset(cx, -x), offset(cy, -y), fill);
        draw_hline(target, offset(cx, y), offset(cx, -y), offset(cy, x), fill);
        draw_hline(target, offset(cx, y), offset(cx, -y), offset(cy, -x), fill);
    });
    draw_circle(target, cx, cy, radius, pixel);
}

// ════════════════════════════════════════════════════════════════════
// Rectangles and polygons
// ════════════════════════════════════════════════════════════════════

/// Border from `(x, y)` to `(x + w, y + h)` inclusive. The far corner is
/// pinned to the `i32` range.
pub fn draw_rect<P: PixelTarget + ?Sized>(target: &mut P, x: i32, y: i32, w: i32, h: i32, pixel: u32) {
    let (x2, y2) = (offset(x, w), offset(y, h));
    draw_hline(target, x, x2, y, pixel);
    draw_hline(target, x, x2, y2, pixel);
    draw_vline(target, x, y, y2, pixel);
    draw_vline(target, x2, y, y2, pixel);
}

/// Rows `y..y + h` spanned with `fill`, then the [`draw_rect`] border in `pixel`.
pub fn fill_rect<P: PixelTarget + ?Sized>(
    target: &mut P,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    pixel: u32,
    fill: u32,
) {
    let x2 = offset(x, w);
    for row in y..offset(y, h) {
        draw_hline(target, x, x2, row, fill);
    }
    draw_rect(target, x, y, w, h, pixel);
}

#[allow(clippy::too_many_arguments)]
pub fn draw_triangle<P: PixelTarget + ?Sized>(
    target: &mut P,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    x3: i32,
    y3: i32,
    pixel: u32,
) {
    draw_line(target, x1, y1, x2, y2, pixel);
    draw_line(target, x2, y2, x3, y3, pixel);
    draw_line(target, x3, y3, x1, y1, pixel);
}

/// Closed outline through `vertices` in order, last joined back to first.
pub fn draw_polygon<P: PixelTarget + ?Sized>(target: &mut P, vertices: &[(i32, i32)], pixel: u32) {
    let n = vertices.len();
    for i in 0..n {
        let (x1, y1) = vertices[i];
        let (x2, y2) = vertices[(i + 1) % n];
        draw_line(target, x1, y1, x2, y2, pixel);
    }
}
