//! # Lane geometry estimation module
//!
//! Lane detection converts a camera frame into at most two lane lines, the
//! left and right boundaries of the lane the vehicle is driving in. The
//! pipeline is:
//!
//!  1. Colour segmentation: threshold the frame in HSV space to isolate the
//!     lane marking colour, then run a Canny edge detector over the result.
//!  2. Region of interest: zero the top part of the edge mask, distant
//!     markings are noisy and destabilise the fit.
//!  3. Segment detection: probabilistic Hough transform over the mask.
//!  4. Candidate partitioning: each segment is converted to a slope and
//!     intercept and sorted into left (negative slope, left of the right gate)
//!     or right (non-negative slope, right of the left gate) candidates.
//!  5. Averaging: each non-empty candidate set is averaged and materialised
//!     into a line running from the bottom of the frame to its middle.
//!
//! Note that image coordinates have Y pointing down, so the left boundary of
//! a lane seen from the vehicle has a negative slope.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod fit;
mod hough;
mod params;
mod roi;
mod segment;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// Internal
pub use fit::*;
pub use hough::*;
pub use params::*;
pub use roi::*;
pub use segment::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Slope substituted for an exactly horizontal fit when converting it back to
/// endpoints.
pub const ZERO_SLOPE_SUBSTITUTE: f64 = 0.1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A line segment detected in the edge mask, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32
}

/// Slope and intercept of a line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitCandidate {
    pub slope: f64,
    pub intercept: f64
}

/// An averaged lane boundary.
///
/// `(x1, y1)` is the lower endpoint at the bottom of the frame, `(x2, y2)` the
/// upper endpoint at the vertical middle of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaneLine {
    pub side: LaneSide,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which side of the lane a line bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LaneSide {
    Left,
    Right
}

/// Possible errors that can occur during LaneDet operation.
#[derive(Debug, thiserror::Error)]
pub enum LaneDetError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Could not initialise the archive: {0}")]
    ArchiveError(util::archive::ArchiveError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LineSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// True if the segment is vertical, in which case it has no slope.
    pub fn is_vertical(&self) -> bool {
        self.x1 == self.x2
    }
}

impl LaneLine {
    /// The endpoint at the bottom of the frame.
    pub fn lower(&self) -> (i32, i32) {
        (self.x1, self.y1)
    }

    /// The endpoint nearest the middle of the frame.
    pub fn upper(&self) -> (i32, i32) {
        (self.x2, self.y2)
    }
}
