//! # Lane Executable Parameters
//!
//! This module provide parameters for the lane following executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneExecParams {

    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Directory of image files replayed as the camera, relative to the software root if not
    /// absolute.
    pub frame_dir: String,

    /// Period between replayed frames.
    ///
    /// Units: seconds
    pub frame_period_s: f64,

    /// Number of consecutive frames which may fail to decode before the frame source is
    /// considered failed.
    pub max_consec_frame_failures: u32,

    /// Render the diagnostics overlay.
    pub overlay_enabled: bool,

    /// Number of cycles between saved overlay images.
    pub overlay_period_cycles: u64,

    /// Write per-cycle archives.
    pub archive_enabled: bool
}

impl Default for LaneExecParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.1,
            frame_dir: "frames".into(),
            frame_period_s: 0.1,
            max_consec_frame_failures: 10,
            overlay_enabled: true,
            overlay_period_cycles: 10,
            archive_enabled: true
        }
    }
}

impl LaneExecParams {
    /// Number of cycles per second
    pub fn cycle_frequency_hz(&self) -> f64 {
        1.0 / self.cycle_period_s
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load() {
        let params: LaneExecParams = util::params::from_str(
            r#"
            cycle_period_s = 0.1
            frame_dir = "replay"
            frame_period_s = 0.2
            max_consec_frame_failures = 3
            overlay_enabled = false
            overlay_period_cycles = 5
            archive_enabled = true
            "#
        ).unwrap();

        assert_eq!(params.frame_dir, "replay");
        assert_eq!(params.max_consec_frame_failures, 3);
        assert!((params.cycle_frequency_hz() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_param_file() {
        let params: LaneExecParams = util::params::from_str(
            include_str!("../../params/lane_exec.toml")
        ).unwrap();

        assert_eq!(params.cycle_period_s, LaneExecParams::default().cycle_period_s);
    }
}
