//! Fitting lane lines to detected segments

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::Serialize;

use util::maths::{mean_pairs, polyfit_1};

use super::{
    FitCandidate, LaneLine, LaneSide, LineSegment, Params, ZERO_SLOPE_SUBSTITUTE
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Segments sorted into the side of the lane they bound.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Candidates {
    pub left: Vec<FitCandidate>,
    pub right: Vec<FitCandidate>,

    /// Number of segments which were vertical or fell outside both gates.
    pub num_discarded: usize
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Sort segments into left and right fit candidates.
///
/// A segment with negative slope lying entirely left of
/// `width * (1 - boundary_fraction)` is a left candidate. Any other segment
/// lying entirely right of `width * boundary_fraction` is a right candidate.
/// Vertical segments have no slope and are discarded.
pub fn partition_candidates(
    segments: &[LineSegment],
    width: u32,
    params: &Params
) -> Candidates {
    let left_gate = width as f64 * (1.0 - params.boundary_fraction);
    let right_gate = width as f64 * params.boundary_fraction;

    let mut candidates = Candidates::default();

    for seg in segments {
        if seg.is_vertical() {
            trace!("Skipping vertical segment {:?}", seg);
            candidates.num_discarded += 1;
            continue;
        }

        let (x1, x2) = (seg.x1 as f64, seg.x2 as f64);
        let fit = match polyfit_1(&[(x1, seg.y1 as f64), (x2, seg.y2 as f64)]) {
            Some((slope, intercept)) => FitCandidate { slope, intercept },
            None => {
                candidates.num_discarded += 1;
                continue;
            }
        };

        if fit.slope < 0.0 {
            if x1 < left_gate && x2 < left_gate {
                candidates.left.push(fit);
                continue;
            }
        }
        else if x1 > right_gate && x2 > right_gate {
            candidates.right.push(fit);
            continue;
        }

        candidates.num_discarded += 1;
    }

    candidates
}

/// Average a set of fit candidates, or `None` if the set is empty.
pub fn average_fit(candidates: &[FitCandidate]) -> Option<FitCandidate> {
    let pairs: Vec<(f64, f64)> = candidates
        .iter()
        .map(|c| (c.slope, c.intercept))
        .collect();

    mean_pairs(&pairs).map(|(slope, intercept)| FitCandidate { slope, intercept })
}

/// Materialise a fit into a line running from the bottom of the frame to its
/// vertical middle.
///
/// A zero slope is replaced by `ZERO_SLOPE_SUBSTITUTE` so that the endpoints
/// stay finite. X coordinates are truncated towards zero.
pub fn make_line(fit: &FitCandidate, side: LaneSide, height: u32) -> LaneLine {
    let slope = if fit.slope == 0.0 {
        ZERO_SLOPE_SUBSTITUTE
    }
    else {
        fit.slope
    };

    let y1 = height as i32;
    let y2 = y1 / 2;

    let x_at = |y: i32| ((y as f64 - fit.intercept) / slope) as i32;

    LaneLine {
        side,
        x1: x_at(y1),
        y1,
        x2: x_at(y2),
        y2
    }
}

/// Fit up to two lane lines to the segments, left first.
pub fn fit_lane_lines(
    segments: &[LineSegment],
    width: u32,
    height: u32,
    params: &Params
) -> Vec<LaneLine> {
    let candidates = partition_candidates(segments, width, params);

    lines_from_candidates(&candidates, height)
}

/// Average each side's candidates into a lane line, left first.
pub fn lines_from_candidates(candidates: &Candidates, height: u32) -> Vec<LaneLine> {
    let mut lines = Vec::with_capacity(2);

    if let Some(fit) = average_fit(&candidates.left) {
        lines.push(make_line(&fit, LaneSide::Left, height));
    }
    if let Some(fit) = average_fit(&candidates.right) {
        lines.push(make_line(&fit, LaneSide::Right, height));
    }

    lines
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partition() {
        let params = Params::default();

        let segments = vec![
            // Left: negative slope, left of 426.67
            LineSegment::new(100, 470, 300, 370),
            // Right: positive slope, right of 213.33
            LineSegment::new(400, 370, 600, 470),
            // Negative slope but crossing the left gate
            LineSegment::new(400, 470, 500, 420),
            // Positive slope but left of the right gate
            LineSegment::new(10, 300, 100, 400),
            // Vertical
            LineSegment::new(320, 300, 320, 400),
        ];

        let c = partition_candidates(&segments, 640, &params);

        assert_eq!(c.left.len(), 1);
        assert_eq!(c.right.len(), 1);
        assert_eq!(c.num_discarded, 3);

        assert!((c.left[0].slope + 0.5).abs() < 1e-9);
        assert!((c.left[0].intercept - 520.0).abs() < 1e-6);
        assert!((c.right[0].slope - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_horizontal_goes_right() {
        // Zero slope is not negative, so a horizontal segment is a right
        // candidate if it is far enough right
        let segments = vec![LineSegment::new(300, 400, 500, 400)];
        let c = partition_candidates(&segments, 640, &Params::default());

        assert!(c.left.is_empty());
        assert_eq!(c.right.len(), 1);
        assert_eq!(c.right[0].slope, 0.0);
    }

    #[test]
    fn test_average_fit() {
        assert!(average_fit(&[]).is_none());

        let avg = average_fit(&[
            FitCandidate { slope: -1.0, intercept: 500.0 },
            FitCandidate { slope: -0.5, intercept: 600.0 },
        ]).unwrap();

        assert!((avg.slope + 0.75).abs() < 1e-12);
        assert!((avg.intercept - 550.0).abs() < 1e-12);
    }

    #[test]
    fn test_make_line() {
        let fit = FitCandidate { slope: -0.5, intercept: 530.0 };
        let line = make_line(&fit, LaneSide::Left, 480);

        assert_eq!(line.side, LaneSide::Left);
        assert_eq!(line.lower(), (100, 480));
        assert_eq!(line.upper(), (580, 240));
    }

    #[test]
    fn test_make_line_zero_slope_finite() {
        let fit = FitCandidate { slope: 0.0, intercept: 400.0 };
        let line = make_line(&fit, LaneSide::Right, 480);

        // (480 - 400) / 0.1 and (240 - 400) / 0.1
        assert_eq!(line.lower(), (800, 480));
        assert_eq!(line.upper(), (-1600, 240));
    }

    #[test]
    fn test_fit_lane_lines_order() {
        let segments = vec![
            LineSegment::new(400, 370, 600, 470),
            LineSegment::new(100, 470, 300, 370),
        ];
        let lines = fit_lane_lines(&segments, 640, 480, &Params::default());

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].side, LaneSide::Left);
        assert_eq!(lines[1].side, LaneSide::Right);
    }

    #[test]
    fn test_no_segments_no_lines() {
        assert!(fit_lane_lines(&[], 640, 480, &Params::default()).is_empty());
    }
}
