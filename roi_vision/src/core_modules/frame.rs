// THEORY:
// The `frame` module is the boundary between the outside world (video decoders,
// image files, camera SDKs) and the analysis layers. It knows
// nothing about how frames are produced. It only fixes three contracts:
//
// 1.  **FrameRate**: every timestamp in the system is `frame_index / fps`, so
//     the rate is validated once, up front, and carried as a newtype that can
//     never hold zero, a negative value or NaN.
// 2.  **GrayFrame**: the analysis layers work on 8-bit luma only. Any frame
//     type a source yields must be able to produce a `GrayImage` of itself.
//     Colour frames stay untouched so a renderer can still draw on them.
// 3.  **FrameSource**: a pull-based, single-pass sequence of frames with a
//     queryable rate and an explicit `release`. `read` returning `None` is the
//     normal end of the stream, never an error.

use crate::error::{Result, VisionError};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

/// A validated, strictly positive playback rate in frames per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate(f64);

impl FrameRate {
    pub fn new(fps: f64) -> Result<Self> {
        if fps.is_finite() && fps > 0.0 {
            Ok(Self(fps))
        } else {
            Err(VisionError::InvalidFrameRate(fps))
        }
    }

    pub fn fps(&self) -> f64 {
        self.0
    }

    /// Converts a frame index (or a span of frames) into seconds.
    pub fn seconds(&self, frames: u64) -> f64 {
        frames as f64 / self.0
    }

    /// Milliseconds between two consecutive frames, rounded down, never zero.
    pub fn frame_interval_millis(&self) -> u32 {
        ((1000.0 / self.0) as u32).max(1)
    }
}

/// Anything the pipeline can reduce to an 8-bit luma image.
pub trait GrayFrame {
    fn to_luma(&self) -> Result<GrayImage>;
}

impl GrayFrame for GrayImage {
    fn to_luma(&self) -> Result<GrayImage> {
        Ok(self.clone())
    }
}

impl GrayFrame for RgbImage {
    fn to_luma(&self) -> Result<GrayImage> {
        Ok(image::imageops::grayscale(self))
    }
}

impl GrayFrame for RgbaImage {
    fn to_luma(&self) -> Result<GrayImage> {
        Ok(image::imageops::grayscale(self))
    }
}

impl GrayFrame for DynamicImage {
    fn to_luma(&self) -> Result<GrayImage> {
        Ok(self.to_luma8())
    }
}

/// A finite, ordered supply of frames.
pub trait FrameSource {
    type Frame: GrayFrame;

    /// The raw rate reported by the underlying container. Validation happens
    /// in the pipeline so that a bad rate aborts before the first read.
    fn frame_rate(&self) -> f64;

    /// The next frame, or `None` once the stream is exhausted or unreadable.
    fn read(&mut self) -> Option<Self::Frame>;

    /// Frees the underlying resources. Called once, after the last `read`.
    fn release(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn rejects_zero_negative_and_nan_rates() {
        assert!(matches!(FrameRate::new(0.0), Err(VisionError::InvalidFrameRate(_))));
        assert!(matches!(FrameRate::new(-25.0), Err(VisionError::InvalidFrameRate(_))));
        assert!(FrameRate::new(f64::NAN).is_err());
        assert!(FrameRate::new(f64::INFINITY).is_err());
    }

    #[test]
    fn converts_frames_to_seconds() {
        let rate = FrameRate::new(10.0).unwrap();
        assert_eq!(rate.seconds(16), 1.6);
        assert_eq!(rate.seconds(0), 0.0);
        assert_eq!(rate.frame_interval_millis(), 100);
    }

    #[test]
    fn very_high_rates_still_wait_at_least_one_millisecond() {
        let rate = FrameRate::new(5000.0).unwrap();
        assert_eq!(rate.frame_interval_millis(), 1);
    }

    #[test]
    fn colour_frames_reduce_to_luma_with_same_dimensions() {
        let rgb = RgbImage::from_pixel(8, 4, Rgb([255, 255, 255]));
        let luma = rgb.to_luma().unwrap();
        assert_eq!(luma.dimensions(), (8, 4));
        assert_eq!(luma.get_pixel(3, 2), &Luma([255]));

        let dynamic = DynamicImage::ImageRgb8(RgbImage::new(5, 5));
        assert_eq!(dynamic.to_luma().unwrap().get_pixel(0, 0), &Luma([0]));
    }
}
