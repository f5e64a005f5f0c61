//! Region of interest filtering

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::Luma;

use super::Params;
use crate::frame::EdgeMask;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// First row of the region of interest for a frame of the given height.
///
/// The region covers the full frame width from this row to the bottom of the
/// frame.
pub fn roi_start_row(height: u32, params: &Params) -> u32 {
    ((height as f64 * params.roi_vertical_split) as u32).min(height)
}

/// Zero all pixels of the mask outside the region of interest.
pub fn apply_roi(mut mask: EdgeMask, params: &Params) -> EdgeMask {
    let start_row = roi_start_row(mask.height(), params);
    let width = mask.width();

    let img = mask.image_mut();
    for y in 0..start_row {
        for x in 0..width {
            img.put_pixel(x, y, Luma([0]));
        }
    }

    mask
}

#[cfg(test)]
mod test {
    use super::*;
    use image::GrayImage;

    #[test]
    fn test_roi_keeps_lower_half() {
        let mask = EdgeMask::new(GrayImage::from_pixel(10, 9, Luma([255])));
        let params = Params::default();

        assert_eq!(roi_start_row(9, &params), 4);

        let filtered = apply_roi(mask, &params);

        for y in 0..9 {
            for x in 0..10 {
                assert_eq!(filtered.is_set(x, y), y >= 4, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_roi_split_limits() {
        let mut params = Params::default();
        params.roi_vertical_split = 1.0;

        let mask = EdgeMask::new(GrayImage::from_pixel(4, 4, Luma([255])));
        assert_eq!(apply_roi(mask, &params).count_set(), 0);

        params.roi_vertical_split = 0.0;
        let mask = EdgeMask::new(GrayImage::from_pixel(4, 4, Luma([255])));
        assert_eq!(apply_roi(mask, &params).count_set(), 16);
    }
}
