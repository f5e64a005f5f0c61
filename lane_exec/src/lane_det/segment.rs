//! Colour segmentation and edge extraction

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{GrayImage, Luma, Rgb};
use imageproc::edges::canny;

use super::Params;
use crate::frame::{EdgeMask, Frame};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Threshold the frame to the lane marking colour band and extract the edges
/// of the resulting mask.
pub fn segment_colour(frame: &Frame, params: &Params) -> EdgeMask {
    let colour_mask = colour_mask(frame, params);

    EdgeMask::new(canny(&colour_mask, params.canny_low, params.canny_high))
}

/// Binary mask of those pixels whose HSV value lies inside the lane marking
/// colour band (inclusive at both ends).
pub fn colour_mask(frame: &Frame, params: &Params) -> GrayImage {
    let img = frame.image();

    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let hsv = rgb_to_hsv(img.get_pixel(x, y));

        let in_band = (0..3).all(|i| {
            hsv[i] >= params.hsv_lower[i] && hsv[i] <= params.hsv_upper[i]
        });

        if in_band {
            Luma([255u8])
        }
        else {
            Luma([0u8])
        }
    })
}

/// Convert an 8-bit RGB pixel into 8-bit HSV.
///
/// Hue is halved to fit in a byte, so lies in [0, 180). Saturation and value
/// are in [0, 255].
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> [u8; 3] {
    let r = pixel[0] as f64;
    let g = pixel[1] as f64;
    let b = pixel[2] as f64;

    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v > 0.0 {
        delta * 255.0 / v
    }
    else {
        0.0
    };

    let mut h = if delta == 0.0 {
        0.0
    }
    else if v == r {
        60.0 * (g - b) / delta
    }
    else if v == g {
        120.0 + 60.0 * (b - r) / delta
    }
    else {
        240.0 + 60.0 * (r - g) / delta
    };

    if h < 0.0 {
        h += 360.0;
    }

    // Hue of 360 wraps back to 0 after halving and rounding
    let h = (h / 2.0).round() as u32 % 180;

    [h as u8, s.round() as u8, v as u8]
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;
    use image::RgbImage;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn test_rgb_to_hsv() {
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 0])), [0, 0, 0]);
        assert_eq!(rgb_to_hsv(&Rgb([255, 255, 255])), [0, 0, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([255, 0, 0])), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 255, 0])), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 255])), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 128])), [120, 255, 128]);
    }

    #[test]
    fn test_colour_mask_selects_blue() {
        let mut img = RgbImage::new(4, 1);
        img.put_pixel(0, 0, Rgb([0, 0, 255]));
        img.put_pixel(1, 0, Rgb([255, 0, 0]));
        img.put_pixel(2, 0, Rgb([40, 40, 200]));
        img.put_pixel(3, 0, Rgb([200, 200, 255]));
        let frame = Frame::new(img, Utc::now()).unwrap();

        let mask = colour_mask(&frame, &Params::default());

        // Saturated blue, red, slightly washed blue, pale blue
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(1, 0)[0], 0);
        assert_eq!(mask.get_pixel(2, 0)[0], 255);
        assert_eq!(mask.get_pixel(3, 0)[0], 0);
    }

    #[test]
    fn test_blank_frame_has_no_edges() {
        let frame = Frame::new(RgbImage::new(64, 48), Utc::now()).unwrap();
        let edges = segment_colour(&frame, &Params::default());

        assert_eq!(edges.count_set(), 0);
        assert_eq!((edges.width(), edges.height()), (64, 48));
    }

    #[test]
    fn test_marking_has_edges() {
        let mut img = RgbImage::new(64, 48);
        draw_filled_rect_mut(&mut img, Rect::at(20, 10).of_size(20, 20), Rgb([0, 0, 255]));
        let frame = Frame::new(img, Utc::now()).unwrap();

        let edges = segment_colour(&frame, &Params::default());

        assert!(edges.count_set() > 0);
        // The inside of the marking is uniform so carries no edges
        assert!(!edges.is_set(30, 20));
    }
}
