//! # Frame types
//!
//! Typed raster buffers used by the perception pipeline. A `Frame` is the
//! immutable colour image captured by the camera, an `EdgeMask` is the binary
//! image derived from it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use comms_if::eqpt::cam::{CamFrame, CamImage};
use image::{GrayImage, RgbImage};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A 3-channel colour frame from the camera.
///
/// Frames are immutable once constructed, the pipeline only ever reads them.
#[derive(Debug, Clone)]
pub struct Frame {
    timestamp: DateTime<Utc>,
    image: RgbImage
}

/// A binary raster with the same dimensions as the frame it was derived from.
///
/// Pixels are either 0 or 255.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMask {
    image: GrayImage
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Frame has zero size ({0}x{1})")]
    EmptyFrame(u32, u32),

    #[error("Mask size ({0}x{1}) does not match the frame size ({2}x{3})")]
    MaskSizeMismatch(u32, u32, u32, u32),

    #[error("Could not decode the camera frame: {0}")]
    DecodeError(image::ImageError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Frame {
    /// Create a new frame from an RGB image captured at the given time.
    pub fn new(image: RgbImage, timestamp: DateTime<Utc>) -> Result<Self, FrameError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(FrameError::EmptyFrame(image.width(), image.height()));
        }

        Ok(Self { timestamp, image })
    }

    /// Create a frame from an already decoded camera image.
    pub fn from_cam_image(cam_image: &CamImage) -> Result<Self, FrameError> {
        Self::new(cam_image.image.to_rgb8(), cam_image.timestamp)
    }

    /// Decode an encoded camera frame.
    pub fn from_cam_frame(cam_frame: &CamFrame) -> Result<Self, FrameError> {
        let cam_image = cam_frame.to_cam_image().map_err(FrameError::DecodeError)?;

        Self::from_cam_image(&cam_image)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

impl EdgeMask {
    /// Wrap a grayscale image as a mask, binarising it (any non-zero pixel is
    /// set).
    pub fn new(mut image: GrayImage) -> Self {
        for p in image.pixels_mut() {
            if p[0] != 0 {
                p[0] = 255;
            }
        }

        Self { image }
    }

    /// Wrap a grayscale image as the mask of the given frame.
    pub fn for_frame(image: GrayImage, frame: &Frame) -> Result<Self, FrameError> {
        if image.dimensions() != (frame.width(), frame.height()) {
            return Err(FrameError::MaskSizeMismatch(
                image.width(), image.height(), frame.width(), frame.height()
            ));
        }

        Ok(Self::new(image))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// True if the pixel at (x, y) is set.
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] != 0
    }

    /// Number of set pixels in the mask.
    pub fn count_set(&self) -> usize {
        self.image.pixels().filter(|p| p[0] != 0).count()
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut GrayImage {
        &mut self.image
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::cam::ImageFormat;
    use image::Luma;

    #[test]
    fn test_empty_frame_rejected() {
        assert!(matches!(
            Frame::new(RgbImage::new(0, 480), Utc::now()),
            Err(FrameError::EmptyFrame(0, 480))
        ));
    }

    #[test]
    fn test_mask_binarised() {
        let mut img = GrayImage::new(3, 3);
        img.put_pixel(1, 1, Luma([7]));

        let mask = EdgeMask::new(img);
        assert!(mask.is_set(1, 1));
        assert!(!mask.is_set(0, 0));
        assert_eq!(mask.image().get_pixel(1, 1)[0], 255);
        assert_eq!(mask.count_set(), 1);
    }

    #[test]
    fn test_mask_size_checked() {
        let frame = Frame::new(RgbImage::new(8, 6), Utc::now()).unwrap();

        assert!(EdgeMask::for_frame(GrayImage::new(8, 6), &frame).is_ok());
        assert!(matches!(
            EdgeMask::for_frame(GrayImage::new(6, 8), &frame),
            Err(FrameError::MaskSizeMismatch(6, 8, 8, 6))
        ));
    }

    #[test]
    fn test_corrupt_cam_frame() {
        let cam_frame = CamFrame {
            timestamp: Utc::now(),
            format: ImageFormat::Png,
            data: vec![1, 2, 3]
        };

        assert!(matches!(
            Frame::from_cam_frame(&cam_frame),
            Err(FrameError::DecodeError(_))
        ));
    }
}
