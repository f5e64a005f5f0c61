//! # Data Store

use log::{info, warn};
use serde::Serialize;

use crate::{
    lane_det,
    pd_ctrl::{self, Command},
    pipeline::Perception
};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the vehicle has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    FrameSourceFailed,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// True if the overlay should be saved on this cycle
    pub is_overlay_cycle: bool,

    /// Session elapsed time at the start of the cycle
    pub cycle_time_s: f64,

    // Safe mode variables
    /// Determines if the vehicle is in safe mode.
    pub safe: bool,

    /// Gives the reason for the vehicle being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Frames
    /// Sequence number of the frame used this cycle
    pub frame_seq: Option<u64>,

    // LaneDet
    pub lane_det: lane_det::LaneDet,
    pub lane_det_input: lane_det::InputData,
    pub perception: Option<Perception>,

    // PdCtrl
    pub pd_ctrl: pd_ctrl::PdCtrl,
    pub pd_ctrl_output: Command,
    pub pd_ctrl_status_rpt: pd_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

/// One row of the per-cycle archive.
#[derive(Debug, Clone, Serialize)]
pub struct TickRecord {
    pub time_s: f64,
    pub safe: bool,
    pub frame_seq: Option<u64>,
    pub angle_deg: i32,
    pub num_lines: usize,
    pub deviation: f64,
    pub error: f64,
    pub derivative: f64,
    pub proportional: f64,
    pub in_dead_band: bool,
    pub steer_deg: u16,
    pub drive_duty: u16
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the vehicle into safe mode with the given cause.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            // Hold the safe command and forget the controller history
            self.pd_ctrl.make_safe();
            self.pd_ctrl_output = Command::safe();
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled, or `Err(())`
    /// otherwise. To remove safe mode the provided cause must match the initial reason for safe
    /// mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) if root_cause == cause => {
                self.safe = false;
                self.safe_cause = None;
                info!("Make unsafe requested, root cause match, safe mode disabled");
                Ok(())
            }
            Some(_) => Err(()),
            None => Ok(()),
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the overlay cycle
    /// flag.
    pub fn cycle_start(&mut self, overlay_period_cycles: u64) {
        self.is_overlay_cycle =
            overlay_period_cycles > 0 && self.num_cycles % overlay_period_cycles == 0;

        self.lane_det_input = lane_det::InputData::default();
        self.perception = None;
        self.pd_ctrl_output = Command::safe();
        self.pd_ctrl_status_rpt = pd_ctrl::StatusReport::default();

        self.cycle_time_s = util::session::get_elapsed_seconds();
    }

    /// Build the archive record for this cycle.
    pub fn tick_record(&self) -> TickRecord {
        let (angle_deg, num_lines) = match self.perception {
            Some(ref p) => (p.angle_deg(), p.lines.len()),
            None => (crate::steer_calc::STRAIGHT_AHEAD_DEG, 0)
        };
        let rpt = &self.pd_ctrl_status_rpt;

        TickRecord {
            time_s: self.cycle_time_s,
            safe: self.safe,
            frame_seq: self.frame_seq,
            angle_deg,
            num_lines,
            deviation: rpt.deviation,
            error: rpt.error,
            derivative: rpt.derivative,
            proportional: rpt.proportional,
            in_dead_band: rpt.in_dead_band,
            steer_deg: self.pd_ctrl_output.steer_deg,
            drive_duty: self.pd_ctrl_output.drive_duty[0]
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Instant;
    use util::module::State;

    #[test]
    fn test_safe_mode() {
        let mut ds = DataStore::default();
        assert!(!ds.safe);

        ds.make_safe(SafeModeCause::FrameSourceFailed);
        assert!(ds.safe);
        assert_eq!(ds.pd_ctrl_output, Command::safe());

        assert_eq!(ds.make_unsafe(SafeModeCause::FrameSourceFailed), Ok(()));
        assert!(!ds.safe);
        assert_eq!(ds.safe_cause, None);

        // Clearing when not safe is fine
        assert_eq!(ds.make_unsafe(SafeModeCause::FrameSourceFailed), Ok(()));
    }

    #[test]
    fn test_make_safe_resets_controller() {
        let mut ds = DataStore::default();

        ds.pd_ctrl
            .proc(&pd_ctrl::InputData { angle_deg: 120, time: Instant::now() })
            .unwrap();
        assert!(ds.pd_ctrl.ctrl_state().last_time.is_some());

        ds.make_safe(SafeModeCause::FrameSourceFailed);
        assert!(ds.pd_ctrl.ctrl_state().last_time.is_none());
        assert_eq!(ds.pd_ctrl.ctrl_state().last_error, 0.0);
    }

    #[test]
    fn test_cycle_start_overlay_flag() {
        let mut ds = DataStore::default();

        ds.cycle_start(10);
        assert!(ds.is_overlay_cycle);

        ds.num_cycles = 3;
        ds.cycle_start(10);
        assert!(!ds.is_overlay_cycle);

        ds.num_cycles = 20;
        ds.cycle_start(10);
        assert!(ds.is_overlay_cycle);

        // Zero period disables the overlay
        ds.cycle_start(0);
        assert!(!ds.is_overlay_cycle);
    }

    #[test]
    fn test_tick_record_without_perception() {
        let mut ds = DataStore::default();
        ds.cycle_start(10);

        let rec = ds.tick_record();
        assert_eq!(rec.angle_deg, 90);
        assert_eq!(rec.num_lines, 0);
        assert_eq!(rec.steer_deg, 90);
        assert_eq!(rec.drive_duty, 0);
    }
}
