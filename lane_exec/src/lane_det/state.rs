//! Implementations for the LaneDet state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use std::sync::Arc;

// Internal
use super::{
    apply_roi, detect_segments, lines_from_candidates, partition_candidates,
    segment_colour, LaneDetError, LaneLine, Params
};
use crate::{
    frame::Frame,
    pipeline::{self, Perception}
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::{self, Session}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lane detection module state
#[derive(Default)]
pub struct LaneDet {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,
    arch_report: Archiver
}

/// Input data to LaneDet.
#[derive(Default)]
pub struct InputData {
    /// The latest frame, or `None` if no frame has been received yet.
    pub frame: Option<Arc<Frame>>
}

/// Status report for LaneDet processing.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// No frame was available so detection was skipped.
    pub no_frame: bool,

    /// Number of edge points inside the region of interest.
    pub num_edge_points: usize,

    /// Number of segments found by the Hough transform.
    pub num_segments: usize,

    pub num_left_candidates: usize,
    pub num_right_candidates: usize,

    /// Segments which were vertical or outside both side gates.
    pub num_discarded: usize,

    /// Number of lane lines produced.
    pub num_lines: usize
}

/// Status report row written to the archive.
#[derive(Serialize)]
struct ReportRecord {
    time_s: f64,
    no_frame: bool,
    num_edge_points: usize,
    num_segments: usize,
    num_left_candidates: usize,
    num_right_candidates: usize,
    num_discarded: usize,
    num_lines: usize
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Estimate the lane lines in a frame.
///
/// This is a pure function of the frame and parameters, returning zero, one
/// or two lines, left first.
pub fn estimate(frame: &Frame, params: &Params) -> Vec<LaneLine> {
    estimate_with_report(frame, params).0
}

/// Estimate the lane lines in a frame, also reporting the intermediate
/// counts of each stage.
pub fn estimate_with_report(
    frame: &Frame,
    params: &Params
) -> (Vec<LaneLine>, StatusReport) {
    let mut report = StatusReport::default();

    let mask = apply_roi(segment_colour(frame, params), params);
    report.num_edge_points = mask.count_set();

    let segments = detect_segments(&mask, params);
    report.num_segments = segments.len();

    if segments.is_empty() {
        trace!("No segments detected");
        return (Vec::new(), report);
    }

    let candidates = partition_candidates(&segments, frame.width(), params);
    report.num_left_candidates = candidates.left.len();
    report.num_right_candidates = candidates.right.len();
    report.num_discarded = candidates.num_discarded;

    let lines = lines_from_candidates(&candidates, frame.height());
    report.num_lines = lines.len();

    trace!(
        "LaneDet: {} segments ({} left, {} right, {} discarded) -> {:?}",
        report.num_segments,
        report.num_left_candidates,
        report.num_right_candidates,
        report.num_discarded,
        lines
    );

    (lines, report)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LaneDet {
    /// Create a new instance from already loaded parameters.
    pub fn new(params: Params) -> Result<Self, LaneDetError> {
        params.validate()?;

        Ok(Self {
            params,
            ..Default::default()
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl State for LaneDet {
    type InitData = &'static str;
    type InitError = LaneDetError;

    type InputData = InputData;
    type OutputData = Perception;
    type StatusReport = StatusReport;
    type ProcError = LaneDetError;

    /// Initialise the LaneDet module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        self.params = params::load(init_data)
            .map_err(LaneDetError::ParamLoadError)?;
        self.params.validate()?;

        // Initialise the archiver
        self.arch_report = Archiver::from_path(
            session, "lane_det/status_report.csv"
        ).map_err(LaneDetError::ArchiveError)?;

        Ok(())
    }

    /// Perform cyclic processing of lane detection.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let perception = pipeline::perceive(
            input_data.frame.as_deref(),
            &self.params
        );

        self.report = perception.report;

        Ok((perception, self.report))
    }
}

impl Archived for LaneDet {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let r = self.report;

        self.arch_report.serialise(ReportRecord {
            time_s: session::get_elapsed_seconds(),
            no_frame: r.no_frame,
            num_edge_points: r.num_edge_points,
            num_segments: r.num_segments,
            num_left_candidates: r.num_left_candidates,
            num_right_candidates: r.num_right_candidates,
            num_discarded: r.num_discarded,
            num_lines: r.num_lines
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;
    use image::{Rgb, RgbImage};

    fn blank_frame() -> Frame {
        Frame::new(RgbImage::from_pixel(640, 480, Rgb([40, 40, 40])), Utc::now())
            .unwrap()
    }

    #[test]
    fn test_blank_frame_no_lines() {
        let (lines, report) = estimate_with_report(&blank_frame(), &Params::default());

        assert!(lines.is_empty());
        assert_eq!(report.num_edge_points, 0);
        assert_eq!(report.num_segments, 0);
        assert_eq!(report.num_lines, 0);
    }

    #[test]
    fn test_proc_without_frame() {
        let mut lane_det = LaneDet::new(Params::default()).unwrap();

        let (perception, report) = lane_det.proc(&InputData::default()).unwrap();

        assert!(report.no_frame);
        assert!(perception.lines.is_empty());
        assert_eq!(perception.steering.angle_deg, 90);
    }

    #[test]
    fn test_new_rejects_invalid_params() {
        let mut params = Params::default();
        params.canny_low = 200.0;

        assert!(LaneDet::new(params).is_err());
    }
}
