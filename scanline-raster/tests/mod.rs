use scanline_core::{BufferingMode, MemoryDevice, OpenOptions, Surface};
use scanline_raster::*;
use std::collections::HashSet;

/// Records every plot, in order, without clipping.
#[derive(Debug, Default)]
struct Recorder {
    writes: Vec<(i32, i32, u32)>,
}

impl PixelTarget for Recorder {
    fn write_pixel(&mut self, x: i32, y: i32, pixel: u32) {
        self.writes.push((x, y, pixel));
    }
}

impl Recorder {
    fn points(&self) -> HashSet<(i32, i32)> {
        self.writes.iter().map(|&(x, y, _)| (x, y)).collect()
    }

    fn count_at(&self, x: i32, y: i32) -> usize {
        self.writes.iter().filter(|&&(px, py, _)| px == x && py == y).count()
    }

    fn last_at(&self, x: i32, y: i32) -> Option<u32> {
        self.writes
            .iter()
            .rev()
            .find(|&&(px, py, _)| px == x && py == y)
            .map(|&(_, _, p)| p)
    }
}

fn surface() -> Surface {
    OpenOptions::new()
        .buffering(BufferingMode::Shadow)
        .open_with(Box::new(MemoryDevice::new(96, 64, 32)))
        .unwrap()
}

const OUTLINE: u32 = 0x00FF_0000;
const FILL: u32 = 0x00FF_FFFF;

// ============================================================================
// Straight Line Tests
// ============================================================================

#[test]
fn test_hline_is_order_normalized() {
    let mut a = Recorder::default();
    let mut b = Recorder::default();
    draw_hline(&mut a, 2, 5, 7, 1);
    draw_hline(&mut b, 5, 2, 7, 1);
    assert_eq!(a.writes, b.writes);
    assert_eq!(a.writes, vec![(2, 7, 1), (3, 7, 1), (4, 7, 1), (5, 7, 1)]);
}

#[test]
fn test_vline_inclusive_bounds() {
    let mut r = Recorder::default();
    draw_vline(&mut r, 3, 9, 6, 1);
    assert_eq!(r.points(), HashSet::from([(3, 6), (3, 7), (3, 8), (3, 9)]));
}

#[test]
fn test_axis_aligned_lines_are_plotted_once() {
    let mut r = Recorder::default();
    draw_line(&mut r, 0, 4, 10, 4, 1);
    assert_eq!(r.writes.len(), 11);
    assert!((0..=10).all(|x| r.count_at(x, 4) == 1));

    let mut r = Recorder::default();
    draw_line(&mut r, 2, 8, 2, 0, 1);
    assert_eq!(r.writes.len(), 9);
    assert!((0..=8).all(|y| r.count_at(2, y) == 1));
}

#[test]
fn test_degenerate_line_is_a_point() {
    let mut r = Recorder::default();
    draw_line(&mut r, 3, 3, 3, 3, 9);
    assert_eq!(r.writes, vec![(3, 3, 9)]);
}

// ============================================================================
// General Line Tests
// ============================================================================

#[test]
fn test_diagonal_line() {
    let mut r = Recorder::default();
    draw_line(&mut r, 0, 0, 4, 4, 1);
    assert_eq!(r.points(), (0..=4).map(|i| (i, i)).collect());
}

#[test]
fn test_shallow_line_steps_along_x() {
    let mut r = Recorder::default();
    draw_line(&mut r, 0, 0, 10, 3, 1);

    assert_eq!(r.writes.len(), 11);
    let xs: HashSet<i32> = r.writes.iter().map(|w| w.0).collect();
    assert_eq!(xs.len(), 11);
    assert!(r.points().contains(&(0, 0)));
    assert!(r.points().contains(&(10, 3)));
    // Never moves more than one row per column.
    for pair in r.writes.windows(2) {
        assert!((pair[1].1 - pair[0].1).abs() <= 1);
    }
}

#[test]
fn test_steep_line_steps_along_y() {
    let mut r = Recorder::default();
    draw_line(&mut r, 5, 12, 2, 0, 1);

    assert_eq!(r.writes.len(), 13);
    let ys: HashSet<i32> = r.writes.iter().map(|w| w.1).collect();
    assert_eq!(ys.len(), 13);
    assert!(r.points().contains(&(5, 12)));
    assert!(r.points().contains(&(2, 0)));
}

#[test]
fn test_line_endpoints_in_every_direction() {
    for (x2, y2) in [(7, 3), (-7, 3), (7, -3), (-7, -3), (3, 7), (-3, -7)] {
        let mut r = Recorder::default();
        draw_line(&mut r, 0, 0, x2, y2, 1);
        let points = r.points();
        assert!(points.contains(&(0, 0)), "start missing for ({x2}, {y2})");
        assert!(points.contains(&(x2, y2)), "end missing for ({x2}, {y2})");
    }
}

// ============================================================================
// Circle Tests
// ============================================================================

#[test]
fn test_circle_radius_zero_is_the_centre() {
    let mut r = Recorder::default();
    draw_circle(&mut r, 4, 4, 0, 1);
    assert_eq!(r.points(), HashSet::from([(4, 4)]));
}

#[test]
fn test_circle_negative_radius_draws_nothing() {
    let mut r = Recorder::default();
    draw_circle(&mut r, 4, 4, -3, 1);
    assert!(r.writes.is_empty());
}

#[test]
fn test_circle_points_lie_on_radius() {
    let mut r = Recorder::default();
    draw_circle(&mut r, 0, 0, 12, 1);
    for (x, y) in r.points() {
        let d = ((x * x + y * y) as f64).sqrt();
        assert!((d - 12.0).abs() < 1.0, "({x}, {y}) is {d} from centre");
    }
    for p in [(12, 0), (-12, 0), (0, 12), (0, -12)] {
        assert!(r.points().contains(&p));
    }
}

#[test]
fn test_circle_is_symmetric() {
    let mut r = Recorder::default();
    draw_circle(&mut r, 0, 0, 9, 1);
    let points = r.points();
    for &(x, y) in &points {
        assert!(points.contains(&(-x, y)));
        assert!(points.contains(&(x, -y)));
        assert!(points.contains(&(y, x)));
    }
}

#[test]
fn test_filled_circle_diameter_on_surface() {
    let mut s = surface();
    let (cx, cy, r) = (40, 30, 10);
    draw_filled_circle(&mut s, cx, cy, r, OUTLINE, FILL);

    assert_eq!(s.read_pixel(cx - r, cy), Some(OUTLINE));
    assert_eq!(s.read_pixel(cx + r, cy), Some(OUTLINE));
    for x in cx - r + 1..cx + r {
        assert_eq!(s.read_pixel(x, cy), Some(FILL), "x = {x}");
    }
    assert_eq!(s.read_pixel(cx - r - 1, cy), Some(0));
    assert_eq!(s.read_pixel(cx + r + 1, cy), Some(0));
}

#[test]
fn test_filled_circle_outline_wins_at_boundary() {
    let mut r = Recorder::default();
    draw_filled_circle(&mut r, 0, 0, 7, OUTLINE, FILL);

    let mut outline = Recorder::default();
    draw_circle(&mut outline, 0, 0, 7, OUTLINE);
    for (x, y) in outline.points() {
        assert_eq!(r.last_at(x, y), Some(OUTLINE), "({x}, {y})");
    }
    assert_eq!(r.last_at(0, 0), Some(FILL));
}

#[test]
fn test_filled_circle_radius_zero() {
    let mut r = Recorder::default();
    draw_filled_circle(&mut r, 2, 2, 0, OUTLINE, FILL);
    assert_eq!(r.points(), HashSet::from([(2, 2)]));
    assert_eq!(r.last_at(2, 2), Some(OUTLINE));
}

#[test]
fn test_filled_circle_clipped_by_surface() {
    let mut s = surface();
    draw_filled_circle(&mut s, -5, -5, 20, OUTLINE, FILL);
    assert_eq!(s.read_pixel(0, 0), Some(FILL));
    assert_eq!(s.read_pixel(60, 60), Some(0));
}

#[test]
fn test_circles_near_coordinate_limits_do_not_overflow() {
    let mut s = surface();
    draw_circle(&mut s, i32::MAX, 0, 1, OUTLINE);
    draw_circle(&mut s, i32::MIN, i32::MIN, 3, OUTLINE);
    draw_filled_circle(&mut s, i32::MAX, i32::MAX, 4, OUTLINE, FILL);
    draw_filled_circle(&mut s, 0, i32::MIN, 2, OUTLINE, FILL);
    draw_circle(&mut s, 0, 0, i32::MIN, OUTLINE);
    assert!(s.active_buffer().iter().all(|&b| b == 0));

    let mut r = Recorder::default();
    draw_circle(&mut r, i32::MAX, 0, 1, 1);
    let points = r.points();
    assert!(points.contains(&(i32::MAX - 1, 0)));
    assert!(points.contains(&(i32::MAX, 1)));
    assert!(points.iter().all(|&(x, _)| x >= i32::MAX - 1));
}

#[test]
fn test_rects_near_coordinate_limits_do_not_overflow() {
    let mut s = surface();
    fill_rect(&mut s, 0, i32::MAX, 2, 2, OUTLINE, FILL);
    fill_rect(&mut s, i32::MAX, 0, 5, 2, OUTLINE, FILL);
    draw_rect(&mut s, i32::MIN, i32::MIN, -4, -4, OUTLINE);
    assert!(s.active_buffer().iter().all(|&b| b == 0));

    // The far corner is pinned, so the part that is on screen still draws.
    let mut r = Recorder::default();
    draw_rect(&mut r, i32::MAX - 1, 0, 10, 1, 1);
    let points = r.points();
    assert!(points.contains(&(i32::MAX - 1, 0)));
    assert!(points.contains(&(i32::MAX, 1)));
}

/// Counts plots and tracks the columns touched, without storing them.
#[derive(Debug, Default)]
struct Counter {
    plots: u64,
    min_x: Option<i32>,
    max_x: Option<i32>,
}

impl PixelTarget for Counter {
    fn write_pixel(&mut self, x: i32, _y: i32, _pixel: u32) {
        self.plots += 1;
        self.min_x = Some(self.min_x.map_or(x, |m| m.min(x)));
        self.max_x = Some(self.max_x.map_or(x, |m| m.max(x)));
    }
}

#[test]
fn test_line_spanning_the_coordinate_range() {
    let mut c = Counter::default();
    draw_line(&mut c, i32::MIN, 0, 5, 3, 1);

    // One plot per column from i32::MIN to 5 inclusive.
    assert_eq!(c.plots, (5i64 - i64::from(i32::MIN) + 1) as u64);
    assert_eq!(c.min_x, Some(i32::MIN));
    assert_eq!(c.max_x, Some(5));
}

// ============================================================================
// Rectangle Tests
// ============================================================================

#[test]
fn test_rect_border_and_untouched_interior() {
    let mut s = surface();
    draw_rect(&mut s, 10, 10, 50, 20, OUTLINE);

    for x in 10..=60 {
        assert_eq!(s.read_pixel(x, 10), Some(OUTLINE), "top x = {x}");
        assert_eq!(s.read_pixel(x, 30), Some(OUTLINE), "bottom x = {x}");
    }
    for y in 10..=30 {
        assert_eq!(s.read_pixel(10, y), Some(OUTLINE), "left y = {y}");
        assert_eq!(s.read_pixel(60, y), Some(OUTLINE), "right y = {y}");
    }
    for y in 11..30 {
        for x in 11..60 {
            assert_eq!(s.read_pixel(x, y), Some(0), "interior ({x}, {y})");
        }
    }
    assert_eq!(s.read_pixel(61, 10), Some(0));
    assert_eq!(s.read_pixel(10, 31), Some(0));
}

#[test]
fn test_fill_rect_fills_then_outlines() {
    let mut s = surface();
    fill_rect(&mut s, 4, 4, 10, 6, OUTLINE, FILL);

    assert_eq!(s.read_pixel(4, 4), Some(OUTLINE));
    assert_eq!(s.read_pixel(14, 10), Some(OUTLINE));
    assert_eq!(s.read_pixel(9, 4), Some(OUTLINE));
    assert_eq!(s.read_pixel(9, 7), Some(FILL));
    assert_eq!(s.read_pixel(13, 9), Some(FILL));
    assert_eq!(s.read_pixel(15, 7), Some(0));
}

// ============================================================================
// Triangle / Polygon Tests
// ============================================================================

#[test]
fn test_triangle_closes_the_loop() {
    let mut r = Recorder::default();
    draw_triangle(&mut r, 0, 0, 10, 0, 0, 10, 1);
    let points = r.points();
    for p in [(0, 0), (10, 0), (0, 10), (5, 0), (0, 5), (5, 5)] {
        assert!(points.contains(&p), "{:?} missing", p);
    }
}

#[test]
fn test_polygon_pairs_x_with_y() {
    let mut r = Recorder::default();
    draw_polygon(&mut r, &[(2, 10), (30, 10), (30, 20)], 1);
    let points = r.points();

    assert!(points.contains(&(16, 10)));
    assert!(points.contains(&(30, 15)));
    assert!(points.contains(&(2, 10)));
    // Feeding the x coordinates in as y would have started a line at (2, 30).
    assert!(!points.contains(&(2, 30)));
    assert!(points.iter().all(|&(_, y)| (10..=20).contains(&y)));
}

#[test]
fn test_polygon_matches_triangle() {
    let mut poly = Recorder::default();
    let mut tri = Recorder::default();
    draw_polygon(&mut poly, &[(1, 1), (20, 4), (8, 17)], 1);
    draw_triangle(&mut tri, 1, 1, 20, 4, 8, 17, 1);
    assert_eq!(poly.writes, tri.writes);
}

#[test]
fn test_polygon_degenerate_inputs() {
    let mut r = Recorder::default();
    draw_polygon(&mut r, &[], 1);
    assert!(r.writes.is_empty());

    draw_polygon(&mut r, &[(3, 4)], 1);
    assert_eq!(r.points(), HashSet::from([(3, 4)]));
}

#[test]
fn test_primitives_work_through_trait_objects() {
    let mut r = Recorder::default();
    let target: &mut dyn PixelTarget = &mut r;
    draw_rect(target, 0, 0, 2, 2, 1);
    assert_eq!(r.points().len(), 8);
}
