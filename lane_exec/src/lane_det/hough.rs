//! Probabilistic Hough segment detection
//!
//! This is the progressive probabilistic Hough transform (Matas et al.):
//! edge points are visited one at a time and vote into the accumulator. As
//! soon as a bin passes the vote threshold the corresponding line is followed
//! through the mask from the current point in both directions, tolerating gaps
//! up to the maximum gap. The points walked over are removed from the mask
//! (and their votes withdrawn) so that they do not contribute to other lines.
//!
//! Points are visited in a fixed scattered order, so that the first votes for
//! a line come from along its whole length, while keeping the output a pure
//! function of the mask. The walk accepts points one pixel either side of the
//! line to absorb the angular quantisation of the accumulator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use ndarray::Array2;

use super::{LineSegment, Params};
use crate::frame::EdgeMask;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Primes used as the stride of the point visiting order. The first which
/// does not divide the number of points is used, making the order a
/// permutation.
const VISIT_STRIDES: [usize; 3] = [7919, 7907, 7901];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Vote accumulator indexed by `[angle, rho]`.
struct Accumulator {
    votes: Array2<i32>,

    /// `(cos, sin)` of each angle bin, scaled by the inverse rho resolution.
    trig: Vec<(f64, f64)>,

    /// Unscaled `(cos, sin)` of each angle bin.
    unit_trig: Vec<(f64, f64)>,

    num_rho: usize
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Detect line segments in the mask.
///
/// An empty result is a valid outcome meaning there is nothing to steer by.
pub fn detect_segments(mask: &EdgeMask, params: &Params) -> Vec<LineSegment> {
    let width = mask.width() as usize;
    let height = mask.height() as usize;

    let mut segments = Vec::new();

    if width == 0 || height == 0 {
        return segments;
    }

    let mut acc = Accumulator::new(width, height, params);

    // Points not yet assigned to any line, and those which have voted
    let mut pending = Array2::<bool>::from_elem((height, width), false);
    let mut voted = Array2::<bool>::from_elem((height, width), false);
    let mut points = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if mask.is_set(x as u32, y as u32) {
                pending[[y, x]] = true;
                points.push((x, y));
            }
        }
    }

    trace!("Hough over {} edge points", points.len());

    let threshold = params.hough_threshold as i32;
    let max_gap = params.hough_max_gap_px as usize;
    let min_length = params.hough_min_length_px as i32;

    let order = visit_order(points.len());

    for (x, y) in order.into_iter().map(|i| points[i]) {
        // Skip points already consumed by a line
        if !pending[[y, x]] {
            continue;
        }

        // Vote and find the strongest bin through this point
        let best = acc.vote(x, y, 1);
        voted[[y, x]] = true;

        let angle_idx = match best {
            Some((n, v)) if v >= threshold => n,
            _ => continue
        };

        // Direction along the line, perpendicular to its normal
        let (cos_t, sin_t) = acc.unit_trig[angle_idx];
        let step = Step::new(-sin_t, cos_t);

        // Find the furthest set points in each direction, and the number of
        // steps taken to reach them
        let mut line_end = [(x, y); 2];
        let mut end_step = [0usize; 2];
        for k in 0..2 {
            let mut walk = step.walk_from(x, y, k == 1);
            let mut gap = 0;
            let mut i = 0;

            while let Some(p) = walk.next_in(width, height) {
                let hit = step
                    .corridor(p, width, height)
                    .into_iter()
                    .find(|&(cx, cy)| pending[[cy, cx]]);

                match hit {
                    Some(h) => {
                        gap = 0;
                        line_end[k] = h;
                        end_step[k] = i;
                    },
                    None => {
                        gap += 1;
                        if gap > max_gap {
                            break;
                        }
                    }
                }

                i += 1;
            }
        }

        let good_line = 
            (line_end[1].0 as i32 - line_end[0].0 as i32).abs() >= min_length
            ||
            (line_end[1].1 as i32 - line_end[0].1 as i32).abs() >= min_length;

        // Remove the walked points from the mask, withdrawing their votes if
        // the line is kept
        for k in 0..2 {
            let mut walk = step.walk_from(x, y, k == 1);

            for _ in 0..=end_step[k] {
                let p = match walk.next_in(width, height) {
                    Some(p) => p,
                    None => break
                };

                for (cx, cy) in step.corridor(p, width, height) {
                    if pending[[cy, cx]] {
                        if good_line && voted[[cy, cx]] {
                            acc.vote(cx, cy, -1);
                            voted[[cy, cx]] = false;
                        }
                        pending[[cy, cx]] = false;
                    }
                }
            }
        }

        if good_line {
            segments.push(LineSegment::new(
                line_end[0].0 as i32,
                line_end[0].1 as i32,
                line_end[1].0 as i32,
                line_end[1].1 as i32
            ));
        }
    }

    segments
}

// ---------------------------------------------------------------------------
// PRIVATE ITEMS
// ---------------------------------------------------------------------------

/// Scattered visiting order over `n` points.
fn visit_order(n: usize) -> Vec<usize> {
    let stride = VISIT_STRIDES
        .iter()
        .copied()
        .find(|s| n % s != 0)
        .unwrap_or(1);

    (0..n).map(|j| (j * stride) % n).collect()
}

impl Accumulator {
    fn new(width: usize, height: usize, params: &Params) -> Self {
        let theta_rad = params.hough_theta_deg.to_radians();
        let irho = 1.0 / params.hough_rho_px;

        let num_angle = ((std::f64::consts::PI / theta_rad).round() as usize).max(1);
        let num_rho = ((((width + height) * 2 + 1) as f64) * irho).round() as usize;

        let unit_trig: Vec<(f64, f64)> = (0..num_angle)
            .map(|n| {
                let a = n as f64 * theta_rad;
                (a.cos(), a.sin())
            })
            .collect();
        let trig = unit_trig
            .iter()
            .map(|(c, s)| (c * irho, s * irho))
            .collect();

        Self {
            votes: Array2::zeros((num_angle, num_rho)),
            trig,
            unit_trig,
            num_rho
        }
    }

    /// Add `delta` votes for the point in every angle bin, returning the bin
    /// with the most votes after the update.
    fn vote(&mut self, x: usize, y: usize, delta: i32) -> Option<(usize, i32)> {
        let offset = (self.num_rho as i64 - 1) / 2;
        let mut best: Option<(usize, i32)> = None;

        for (n, (c, s)) in self.trig.iter().enumerate() {
            let r = (x as f64 * c + y as f64 * s).round() as i64 + offset;
            if r < 0 || r as usize >= self.num_rho {
                continue;
            }

            let v = &mut self.votes[[n, r as usize]];
            *v += delta;

            if best.map_or(true, |(_, bv)| *v > bv) {
                best = Some((n, *v));
            }
        }

        best
    }
}

/// Pixel stepping along a line direction, advancing one pixel per step along
/// the dominant axis.
#[derive(Clone, Copy)]
struct Step {
    dx: f64,
    dy: f64
}

struct Walk {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64
}

impl Step {
    fn new(dir_x: f64, dir_y: f64) -> Self {
        if dir_x.abs() > dir_y.abs() {
            Self {
                dx: dir_x.signum(),
                dy: dir_y / dir_x.abs()
            }
        }
        else {
            Self {
                dx: dir_x / dir_y.abs(),
                dy: dir_y.signum()
            }
        }
    }

    /// The pixel on the line and its neighbours across the minor axis, inside
    /// the image.
    fn corridor(
        &self,
        p: (usize, usize),
        width: usize,
        height: usize
    ) -> Vec<(usize, usize)> {
        let (px, py) = p;
        let mut pixels = vec![p];

        if self.dx.abs() == 1.0 {
            if py > 0 {
                pixels.push((px, py - 1));
            }
            if py + 1 < height {
                pixels.push((px, py + 1));
            }
        }
        else {
            if px > 0 {
                pixels.push((px - 1, py));
            }
            if px + 1 < width {
                pixels.push((px + 1, py));
            }
        }

        pixels
    }

    fn walk_from(&self, x: usize, y: usize, reverse: bool) -> Walk {
        let sign = if reverse { -1.0 } else { 1.0 };

        Walk {
            x: x as f64,
            y: y as f64,
            dx: self.dx * sign,
            dy: self.dy * sign
        }
    }
}

impl Walk {
    /// Return the current pixel and advance, or `None` once the walk leaves
    /// the image.
    fn next_in(&mut self, width: usize, height: usize) -> Option<(usize, usize)> {
        let px = self.x.round();
        let py = self.y.round();

        if px < 0.0 || py < 0.0 || px >= width as f64 || py >= height as f64 {
            return None;
        }

        self.x += self.dx;
        self.y += self.dy;

        Some((px as usize, py as usize))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::{GrayImage, Luma};
    use imageproc::drawing::draw_line_segment_mut;

    fn mask_with_lines(lines: &[((f32, f32), (f32, f32))]) -> EdgeMask {
        let mut img = GrayImage::new(640, 480);
        for (start, end) in lines {
            draw_line_segment_mut(&mut img, *start, *end, Luma([255u8]));
        }
        EdgeMask::new(img)
    }

    fn seg_slope(s: &LineSegment) -> f64 {
        (s.y2 - s.y1) as f64 / (s.x2 - s.x1) as f64
    }

    #[test]
    fn test_empty_mask_no_segments() {
        let mask = EdgeMask::new(GrayImage::new(640, 480));
        assert!(detect_segments(&mask, &Params::default()).is_empty());
    }

    #[test]
    fn test_single_line_detected() {
        let mask = mask_with_lines(&[((100.0, 470.0), (300.0, 370.0))]);
        let segments = detect_segments(&mask, &Params::default());

        assert!(!segments.is_empty());

        for s in segments.iter() {
            assert!(!s.is_vertical());
            assert!(seg_slope(s) < 0.0, "segment {:?}", s);
            for &(x, y) in [(s.x1, s.y1), (s.x2, s.y2)].iter() {
                assert!(x >= 99 && x <= 301);
                assert!(y >= 369 && y <= 471);
            }
        }

        // Most of the line is covered by the longest segment, which follows
        // the line's slope
        let longest = segments
            .iter()
            .max_by_key(|s| (s.x2 - s.x1).abs())
            .unwrap();
        assert!((longest.x2 - longest.x1).abs() > 100, "longest {:?}", longest);
        assert!((seg_slope(longest) + 0.5).abs() < 0.05, "longest {:?}", longest);
    }

    #[test]
    fn test_short_run_rejected() {
        // Too few points to ever reach the vote threshold
        let mask = mask_with_lines(&[((10.0, 400.0), (13.0, 400.0))]);
        assert!(detect_segments(&mask, &Params::default()).is_empty());
    }

    #[test]
    fn test_visit_order_is_permutation() {
        for n in [0usize, 1, 2, 201, 7919, 10_000].iter() {
            let mut order = visit_order(*n);
            order.sort_unstable();
            assert_eq!(order, (0..*n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_deterministic() {
        let mask = mask_with_lines(&[
            ((40.0, 470.0), (280.0, 290.0)),
            ((600.0, 470.0), (360.0, 290.0))
        ]);
        let params = Params::default();

        assert_eq!(detect_segments(&mask, &params), detect_segments(&mask, &params));
    }
}
