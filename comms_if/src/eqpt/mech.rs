//! # Mechanisms Equipment Commands
//!
//! The vehicle has a single steering servo and two drive motors. Steering is
//! commanded as an absolute servo angle, drive as a duty cycle magnitude.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum steering servo angle in degrees.
pub const MAX_STEER_DEG: u16 = 180;

/// Steering servo angle which points the wheels straight ahead.
pub const STEER_CENTRE_DEG: u16 = 90;

/// Maximum drive motor duty.
pub const MAX_DRIVE_DUTY: u16 = 30;

/// Number of drive motors.
pub const NUM_DRV_MOTORS: usize = 2;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands that are sent to the steering servo and drive motors.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MechDems {
    /// The demanded steering servo angle, in [0, 180] degrees.
    pub steer_deg: u16,

    /// The demanded duty of each drive motor, in [0, 30].
    pub drive_duty: [u16; NUM_DRV_MOTORS]
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl MechDems {
    /// The demands to hold when no safe command can be calculated: wheels
    /// centred and drive stopped.
    pub fn safe() -> Self {
        Self {
            steer_deg: STEER_CENTRE_DEG,
            drive_duty: [0; NUM_DRV_MOTORS]
        }
    }

    /// Check that the demands are inside the actuator ranges.
    pub fn is_valid(&self) -> bool {
        self.steer_deg <= MAX_STEER_DEG
            && self.drive_duty.iter().all(|d| *d <= MAX_DRIVE_DUTY)
    }
}

impl Default for MechDems {
    fn default() -> Self {
        Self::safe()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_safe_dems() {
        let dems = MechDems::default();
        assert_eq!(dems.steer_deg, 90);
        assert_eq!(dems.drive_duty, [0, 0]);
        assert!(dems.is_valid());
    }

    #[test]
    fn test_invalid_dems() {
        assert!(!MechDems { steer_deg: 181, drive_duty: [0, 0] }.is_valid());
        assert!(!MechDems { steer_deg: 90, drive_duty: [31, 0] }.is_valid());
    }
}
