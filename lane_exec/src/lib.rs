//! # Lane following library.
//!
//! This library allows other crates in the workspace, benchmarks and tests to access the
//! perception and control modules of the lane following executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command sink - output channel for actuator commands
pub mod cmd_sink;

/// Data store - global data for the executable
pub mod data_store;

/// Frame types - typed colour frames and edge masks
pub mod frame;

/// Frame slot - latest-value hand-off between the frame source and the control loop
pub mod frame_slot;

/// Frame source - replays image files as the camera
pub mod frame_source;

/// Lane detection module - finds the lane boundaries in a frame
pub mod lane_det;

/// Diagnostics overlay - draws the lane lines and heading onto the frame
pub mod overlay;

/// Executable parameters
pub mod params;

/// PD control module - converts steering deviation into actuator commands
pub mod pd_ctrl;

/// Perception pipeline - lane detection followed by steering calculation
pub mod pipeline;

/// Steering calculation - reduces lane lines to a steering angle
pub mod steer_calc;
