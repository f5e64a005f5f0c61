//! # Steering angle calculation
//!
//! Reduces the detected lane lines to a single steering angle in degrees,
//! where 90 is straight ahead, lower values a left bias and higher values a
//! right bias.
//!
//! - Two lines: the horizontal offset is the midpoint of the lines' upper
//!   endpoints relative to the frame's horizontal centre.
//! - One line: the horizontal offset is the run of the line itself, upper x
//!   minus lower x. This follows the direction the single visible boundary
//!   leans rather than its distance from the centre.
//! - No lines: zero offset, drive straight.
//!
//! In all cases the vertical reference is half the frame height.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::lane_det::LaneLine;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Angle corresponding to straight ahead.
///
/// Units: degrees
pub const STRAIGHT_AHEAD_DEG: i32 = 90;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A steering estimate along with the offsets it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SteeringEstimate {
    /// Steering angle, truncated to whole degrees.
    ///
    /// Units: degrees
    pub angle_deg: i32,

    /// Horizontal offset of the heading point.
    ///
    /// Units: pixels
    pub x_offset: f64,

    /// Vertical reference distance of the heading point.
    ///
    /// Units: pixels
    pub y_offset: i32,

    /// Number of lane lines the estimate is based on.
    pub num_lines: usize
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the steering angle for the given lane lines.
pub fn steering_angle(lines: &[LaneLine], width: u32, height: u32) -> i32 {
    estimate_steering(lines, width, height).angle_deg
}

/// Compute the full steering estimate for the given lane lines.
///
/// Lines beyond the first two are ignored.
pub fn estimate_steering(lines: &[LaneLine], width: u32, height: u32) -> SteeringEstimate {
    let y_offset = (height / 2) as i32;

    let x_offset = match lines {
        [] => 0.0,
        [line] => (line.x2 - line.x1) as f64,
        [left, right, ..] => {
            let mid = (width / 2) as f64;
            (left.x2 + right.x2) as f64 / 2.0 - mid
        }
    };

    SteeringEstimate {
        angle_deg: angle_from_offsets(x_offset, y_offset),
        x_offset,
        y_offset,
        num_lines: lines.len().min(2)
    }
}

/// The "no observation" estimate used when there is no frame.
pub fn straight_ahead(height: u32) -> SteeringEstimate {
    SteeringEstimate {
        angle_deg: STRAIGHT_AHEAD_DEG,
        x_offset: 0.0,
        y_offset: (height / 2) as i32,
        num_lines: 0
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn angle_from_offsets(x_offset: f64, y_offset: i32) -> i32 {
    // A frame too short to have a vertical reference gives no steering cue
    if y_offset <= 0 || !x_offset.is_finite() {
        return STRAIGHT_AHEAD_DEG;
    }

    let deviation_deg = (x_offset / y_offset as f64).atan().to_degrees();

    deviation_deg as i32 + STRAIGHT_AHEAD_DEG
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lane_det::LaneSide;

    fn line(side: LaneSide, x1: i32, x2: i32) -> LaneLine {
        LaneLine { side, x1, y1: 480, x2, y2: 240 }
    }

    #[test]
    fn test_no_lines_straight() {
        let est = estimate_steering(&[], 640, 480);

        assert_eq!(est.angle_deg, 90);
        assert_eq!(est.x_offset, 0.0);
        assert_eq!(est.y_offset, 240);
        assert_eq!(est.num_lines, 0);
    }

    #[test]
    fn test_two_symmetric_lines_straight() {
        let lines = [
            line(LaneSide::Left, 40, 280),
            line(LaneSide::Right, 600, 360)
        ];

        assert_eq!(steering_angle(&lines, 640, 480), 90);
    }

    #[test]
    fn test_two_lines_offset() {
        // Midpoint of upper x is 420, 100 px right of centre
        let lines = [
            line(LaneSide::Left, 100, 340),
            line(LaneSide::Right, 600, 500)
        ];
        let est = estimate_steering(&lines, 640, 480);

        assert_eq!(est.x_offset, 100.0);
        // atan(100 / 240) = 22.6 degrees
        assert_eq!(est.angle_deg, 112);
    }

    #[test]
    fn test_one_line_uses_own_run() {
        // Upper x is right of lower x so the heading leans right
        let est = estimate_steering(&[line(LaneSide::Left, 100, 580)], 640, 480);
        assert_eq!(est.x_offset, 480.0);
        // atan(2) = 63.4 degrees
        assert_eq!(est.angle_deg, 153);

        // And the mirror case leans left
        let est = estimate_steering(&[line(LaneSide::Right, 580, 100)], 640, 480);
        assert_eq!(est.angle_deg, 27);
    }

    #[test]
    fn test_angle_truncated() {
        // atan(10 / 240) = 2.39 degrees, truncated towards zero both ways
        assert_eq!(angle_from_offsets(10.0, 240), 92);
        assert_eq!(angle_from_offsets(-10.0, 240), 88);
    }

    #[test]
    fn test_degenerate_height() {
        assert_eq!(steering_angle(&[line(LaneSide::Left, 0, 10)], 640, 1), 90);
    }
}
