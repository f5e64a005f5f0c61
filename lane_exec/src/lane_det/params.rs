//! Parameters structure for LaneDet

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::LaneDetError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for lane detection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Params {

    // ---- COLOUR SEGMENTATION ----

    /// Lower HSV bound of the lane marking colour, inclusive.
    ///
    /// Hue is in [0, 180), saturation and value in [0, 255].
    pub hsv_lower: [u8; 3],

    /// Upper HSV bound of the lane marking colour, inclusive.
    pub hsv_upper: [u8; 3],

    /// Canny edge detector low threshold
    pub canny_low: f32,

    /// Canny edge detector high threshold
    pub canny_high: f32,

    // ---- REGION OF INTEREST ----

    /// Fraction of the frame height, from the top, excluded from detection.
    pub roi_vertical_split: f64,

    // ---- SEGMENT DETECTION ----

    /// Distance resolution of the Hough accumulator.
    ///
    /// Units: pixels
    pub hough_rho_px: f64,

    /// Angular resolution of the Hough accumulator.
    ///
    /// Units: degrees
    pub hough_theta_deg: f64,

    /// Minimum number of accumulator votes for a line to be considered.
    pub hough_threshold: u32,

    /// Minimum length of a detected segment, along either axis.
    ///
    /// Units: pixels
    pub hough_min_length_px: u32,

    /// Maximum gap between points on the same line for them to be joined into
    /// one segment.
    ///
    /// Units: pixels
    pub hough_max_gap_px: u32,

    // ---- CANDIDATE PARTITIONING ----

    /// Fraction of the frame width used to gate left and right candidates.
    ///
    /// Left candidates must lie left of `width * (1 - boundary_fraction)`,
    /// right candidates right of `width * boundary_fraction`.
    pub boundary_fraction: f64
}

impl Default for Params {
    fn default() -> Self {
        Self {
            hsv_lower: [90, 120, 0],
            hsv_upper: [150, 255, 255],
            canny_low: 50.0,
            canny_high: 100.0,
            roi_vertical_split: 0.5,
            hough_rho_px: 1.0,
            hough_theta_deg: 1.0,
            hough_threshold: 10,
            hough_min_length_px: 5,
            hough_max_gap_px: 150,
            boundary_fraction: 1.0 / 3.0
        }
    }
}

impl Params {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), LaneDetError> {
        if self.canny_low > self.canny_high {
            return Err(LaneDetError::InvalidParams(format!(
                "canny_low ({}) is greater than canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }
        if !(0.0..=1.0).contains(&self.roi_vertical_split) {
            return Err(LaneDetError::InvalidParams(format!(
                "roi_vertical_split ({}) must be between 0 and 1",
                self.roi_vertical_split
            )));
        }
        if self.hough_rho_px <= 0.0 || self.hough_theta_deg <= 0.0 {
            return Err(LaneDetError::InvalidParams(
                "Hough resolutions must be positive".into()
            ));
        }
        if !(0.0..=0.5).contains(&self.boundary_fraction) {
            return Err(LaneDetError::InvalidParams(format!(
                "boundary_fraction ({}) must be between 0 and 0.5",
                self.boundary_fraction
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_param_file_matches_defaults() {
        let params: Params = util::params::from_str(
            include_str!("../../../params/lane_det.toml")
        ).unwrap();
        let default = Params::default();

        assert!(params.validate().is_ok());
        assert_eq!(params.hsv_lower, default.hsv_lower);
        assert_eq!(params.hsv_upper, default.hsv_upper);
        assert_eq!(params.hough_threshold, default.hough_threshold);
        assert_eq!(params.hough_max_gap_px, default.hough_max_gap_px);
        assert!((params.boundary_fraction - default.boundary_fraction).abs() < 1e-12);
    }

    #[test]
    fn test_invalid() {
        let mut params = Params::default();
        params.roi_vertical_split = 1.5;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.hough_theta_deg = 0.0;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.boundary_fraction = 0.6;
        assert!(params.validate().is_err());
    }
}
