//! Parameters structure for PdCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use comms_if::eqpt::mech::{MAX_DRIVE_DUTY, MAX_STEER_DEG};
use super::PdCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the PD controller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Params {

    // ---- GAINS ----

    /// Proportional gain
    pub k_p: f64,

    /// Derivative gain as a fraction of the proportional gain
    pub k_d_ratio: f64,

    // ---- DRIVE ----

    /// Drive duty held before the first dead-band tick.
    pub base_speed_duty: f64,

    /// Drive duty held once the deviation has entered the dead-band.
    pub cruise_speed_duty: f64,

    /// Maximum magnitude of the drive duty.
    pub max_drive_duty: u16,

    // ---- STEERING ----

    /// Steering target which corresponds to straight ahead.
    ///
    /// Units: degrees
    pub steer_centre_deg: f64,

    /// Half width of the band of deviations around straight ahead for which
    /// no correction is applied. The band is exclusive at both ends.
    ///
    /// Units: degrees
    pub dead_band_deg: f64,

    /// Minimum steering target before mirroring.
    ///
    /// Units: degrees
    pub min_steer_deg: u16,

    /// Maximum steering target before mirroring.
    ///
    /// Units: degrees
    pub max_steer_deg: u16
}

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 0.45,
            k_d_ratio: 0.65,
            base_speed_duty: 20.0,
            cruise_speed_duty: 18.0,
            max_drive_duty: 30,
            steer_centre_deg: 90.0,
            dead_band_deg: 5.0,
            min_steer_deg: 60,
            max_steer_deg: 135
        }
    }
}

impl Params {
    /// Derivative gain
    pub fn k_d(&self) -> f64 {
        self.k_p * self.k_d_ratio
    }

    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), PdCtrlError> {
        if self.min_steer_deg >= self.max_steer_deg {
            return Err(PdCtrlError::InvalidParams(format!(
                "min_steer_deg ({}) must be less than max_steer_deg ({})",
                self.min_steer_deg, self.max_steer_deg
            )));
        }
        if self.max_steer_deg > MAX_STEER_DEG {
            return Err(PdCtrlError::InvalidParams(format!(
                "max_steer_deg ({}) exceeds the servo range ({})",
                self.max_steer_deg, MAX_STEER_DEG
            )));
        }
        if self.max_drive_duty > MAX_DRIVE_DUTY {
            return Err(PdCtrlError::InvalidParams(format!(
                "max_drive_duty ({}) exceeds the motor limit ({})",
                self.max_drive_duty, MAX_DRIVE_DUTY
            )));
        }
        if self.base_speed_duty < 0.0 || self.cruise_speed_duty < 0.0 {
            return Err(PdCtrlError::InvalidParams(
                "Speed duties must not be negative".into()
            ));
        }
        if self.dead_band_deg < 0.0 {
            return Err(PdCtrlError::InvalidParams(format!(
                "dead_band_deg ({}) must not be negative",
                self.dead_band_deg
            )));
        }
        let gains = [self.k_p, self.k_d_ratio, self.steer_centre_deg];
        if gains.iter().any(|g| !g.is_finite()) {
            return Err(PdCtrlError::InvalidParams(
                "Gains and steering centre must be finite".into()
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let params = Params::default();

        assert!(params.validate().is_ok());
        assert!((params.k_d() - 0.2925).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_steer_range() {
        let mut params = Params::default();
        params.min_steer_deg = 135;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.max_steer_deg = 200;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_invalid_duty() {
        let mut params = Params::default();
        params.max_drive_duty = 31;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.cruise_speed_duty = -1.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_load_from_toml() {
        let params: Params = util::params::from_str(
            r#"
            k_p = 0.5
            k_d_ratio = 0.65
            base_speed_duty = 20.0
            cruise_speed_duty = 18.0
            max_drive_duty = 30
            steer_centre_deg = 90.0
            dead_band_deg = 5.0
            min_steer_deg = 60
            max_steer_deg = 135
            "#
        ).unwrap();

        assert_eq!(params.k_p, 0.5);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_param_file_valid() {
        let params: Params = util::params::from_str(
            include_str!("../../../params/pd_ctrl.toml")
        ).unwrap();

        assert!(params.validate().is_ok());
        assert_eq!(params.k_p, Params::default().k_p);
    }
}
