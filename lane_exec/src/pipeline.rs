//! # Perception pipeline
//!
//! Joins lane detection and steering angle calculation. When no frame has
//! been received yet every stage is skipped and the result is the "no
//! observation" perception: no lines and a straight ahead angle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::{
    frame::Frame,
    lane_det::{self, LaneLine},
    steer_calc::{self, SteeringEstimate}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The result of perceiving one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Perception {
    /// Lane lines, left first.
    pub lines: Vec<LaneLine>,

    /// Steering estimate derived from the lines.
    pub steering: SteeringEstimate,

    /// Report from lane detection.
    pub report: lane_det::StatusReport
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Perceive the lane in the given frame.
pub fn perceive(frame: Option<&Frame>, params: &lane_det::Params) -> Perception {
    let frame = match frame {
        Some(f) => f,
        None => return Perception::no_observation()
    };

    let (lines, report) = lane_det::estimate_with_report(frame, params);
    let steering = steer_calc::estimate_steering(&lines, frame.width(), frame.height());

    Perception {
        lines,
        steering,
        report
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Perception {
    /// The perception used before any frame has been received.
    pub fn no_observation() -> Self {
        Self {
            lines: Vec::new(),
            steering: steer_calc::straight_ahead(0),
            report: lane_det::StatusReport {
                no_frame: true,
                ..Default::default()
            }
        }
    }

    pub fn angle_deg(&self) -> i32 {
        self.steering.angle_deg
    }
}
