//! # Diagnostics overlay
//!
//! Renders the detected lane lines and the heading vector onto a copy of the
//! frame for monitoring. The overlay is advisory only and nothing in the
//! control path reads it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::{frame::Frame, lane_det::LaneLine};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Colour and width of the lane lines.
pub const LANE_LINE_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
pub const LANE_LINE_WIDTH_PX: f32 = 6.0;

/// Colour and width of the heading vector.
pub const HEADING_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);
pub const HEADING_WIDTH_PX: f32 = 5.0;

/// Weight of the frame in the blended output, the overlay has weight 1.
pub const FRAME_WEIGHT: f32 = 0.8;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Render the lane lines and the heading for `angle_deg` onto the frame.
pub fn render(frame: &Frame, lines: &[LaneLine], angle_deg: i32) -> RgbImage {
    let (width, height) = (frame.width(), frame.height());
    let mut layer = RgbImage::new(width, height);

    for line in lines {
        draw_thick_line(
            &mut layer,
            (line.x1 as f32, line.y1 as f32),
            (line.x2 as f32, line.y2 as f32),
            LANE_LINE_WIDTH_PX,
            LANE_LINE_COLOUR
        );
    }

    let (start, end) = heading_vector(width, height, angle_deg);
    draw_thick_line(&mut layer, start, end, HEADING_WIDTH_PX, HEADING_COLOUR);

    blend(frame.image(), &layer)
}

/// Endpoints of the heading vector, from the bottom centre of the frame up to
/// its vertical middle in the direction of the steering angle.
pub fn heading_vector(width: u32, height: u32, angle_deg: i32) -> ((f32, f32), (f32, f32)) {
    let x1 = (width / 2) as f32;
    let y1 = height as f32;
    let half_height = height as f32 / 2.0;

    let x2 = x1 - half_height / (angle_deg as f32).to_radians().tan();

    // Flat headings have no intersection with the middle row
    let x2 = if x2.is_finite() { x2 } else { x1 };

    ((x1, y1), (x2, (height / 2) as f32))
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Saturating `FRAME_WEIGHT * frame + layer`.
fn blend(frame: &RgbImage, layer: &RgbImage) -> RgbImage {
    RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        let f = frame.get_pixel(x, y);
        let l = layer.get_pixel(x, y);

        let mut out = [0u8; 3];
        for c in 0..3 {
            let v = FRAME_WEIGHT * f[c] as f32 + l[c] as f32;
            out[c] = v.round().min(255.0) as u8;
        }

        Rgb(out)
    })
}

/// Draw a line of the given width by stamping parallel single pixel lines
/// across it.
fn draw_thick_line(
    img: &mut RgbImage,
    start: (f32, f32),
    end: (f32, f32),
    width: f32,
    colour: Rgb<u8>
) {
    let margin = width;
    let (start, end) = match clip_segment(
        start,
        end,
        -margin,
        -margin,
        img.width() as f32 + margin,
        img.height() as f32 + margin
    ) {
        Some(s) => s,
        None => return
    };

    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let len = (dx * dx + dy * dy).sqrt();

    // Unit normal, any direction will do for a point
    let (nx, ny) = if len > 0.0 { (-dy / len, dx / len) } else { (1.0, 0.0) };

    let steps = (width * 2.0).ceil() as i32;
    for i in 0..=steps {
        let offset = -width / 2.0 + width * i as f32 / steps as f32;
        draw_line_segment_mut(
            img,
            (start.0 + nx * offset, start.1 + ny * offset),
            (end.0 + nx * offset, end.1 + ny * offset),
            colour
        );
    }
}

/// Clip a segment to a rectangle (Liang-Barsky), or `None` if it lies
/// entirely outside.
fn clip_segment(
    start: (f32, f32),
    end: (f32, f32),
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32
) -> Option<((f32, f32), (f32, f32))> {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let mut t0 = 0f32;
    let mut t1 = 1f32;

    let edges = [
        (-dx, start.0 - x_min),
        (dx, x_max - start.0),
        (-dy, start.1 - y_min),
        (dy, y_max - start.1)
    ];

    for &(p, q) in edges.iter() {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }

        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        }
        else {
            t1 = t1.min(r);
        }

        if t0 > t1 {
            return None;
        }
    }

    Some((
        (start.0 + t0 * dx, start.1 + t0 * dy),
        (start.0 + t1 * dx, start.1 + t1 * dy)
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lane_det::LaneSide;
    use chrono::Utc;

    fn grey_frame() -> Frame {
        Frame::new(RgbImage::from_pixel(640, 480, Rgb([100, 100, 100])), Utc::now())
            .unwrap()
    }

    #[test]
    fn test_blend_background() {
        let img = render(&grey_frame(), &[], 90);

        // Away from any drawing the frame is dimmed
        assert_eq!(img.get_pixel(10, 10), &Rgb([80, 80, 80]));
        assert_eq!(img.dimensions(), (640, 480));
    }

    #[test]
    fn test_heading_straight() {
        let ((x1, y1), (x2, y2)) = heading_vector(640, 480, 90);
        assert_eq!((x1, y1), (320.0, 480.0));
        assert!((x2 - 320.0).abs() < 1e-3);
        assert_eq!(y2, 240.0);

        // Red drawn on top of the dimmed frame, saturating
        let img = render(&grey_frame(), &[], 90);
        assert_eq!(img.get_pixel(320, 300), &Rgb([255, 80, 80]));
    }

    #[test]
    fn test_heading_direction() {
        // Right bias leans right, left bias leans left
        let (_, (x_right, _)) = heading_vector(640, 480, 135);
        let (_, (x_left, _)) = heading_vector(640, 480, 45);

        assert!((x_right - 560.0).abs() < 1e-2);
        assert!((x_left - 80.0).abs() < 1e-2);
    }

    #[test]
    fn test_heading_flat_finite() {
        let ((x1, _), (x2, _)) = heading_vector(640, 480, 0);
        assert!(x2.is_finite());
        assert_eq!(x1, 320.0);
    }

    #[test]
    fn test_lane_lines_drawn() {
        let lines = [LaneLine { side: LaneSide::Left, x1: 100, y1: 480, x2: 220, y2: 240 }];
        let img = render(&grey_frame(), &lines, 90);

        // Midpoint of the lane line is green
        assert_eq!(img.get_pixel(160, 360), &Rgb([80, 255, 80]));
    }

    #[test]
    fn test_far_lines_clipped() {
        // Endpoints far outside the frame, as made from near flat fits
        let lines = [LaneLine {
            side: LaneSide::Right,
            x1: 800,
            y1: 480,
            x2: -1_000_000,
            y2: 240
        }];

        let img = render(&grey_frame(), &lines, 120);
        assert_eq!(img.dimensions(), (640, 480));
    }

    #[test]
    fn test_clip_segment() {
        assert!(clip_segment((-10.0, -10.0), (-5.0, -1.0), 0.0, 0.0, 10.0, 10.0).is_none());

        let ((x0, y0), (x1, y1)) =
            clip_segment((-10.0, 5.0), (20.0, 5.0), 0.0, 0.0, 10.0, 10.0).unwrap();
        assert!(x0.abs() < 1e-4 && (x1 - 10.0).abs() < 1e-4);
        assert_eq!((y0, y1), (5.0, 5.0));
    }
}
