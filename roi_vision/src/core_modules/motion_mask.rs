// THEORY:
// The `MotionMaskExtractor` turns a luma frame into a clean, binary map of
// "something moved here". It owns the `BackgroundModel` outright; nothing else
// in the system can touch the running statistics.
//
// The raw model output is followed by a fixed intensity cutoff. The cutoff is a
// pure function of the mask: it never feeds back into the model and never
// triggers a second pass over the frame.

use crate::core_modules::background_model::{BACKGROUND, BackgroundModel, FOREGROUND, MotionConfig};
use crate::error::Result;
use image::GrayImage;

pub struct MotionMaskExtractor {
    model: BackgroundModel,
    binarize_threshold: u8,
}

impl MotionMaskExtractor {
    pub fn new(config: MotionConfig) -> Self {
        let binarize_threshold = config.binarize_threshold;
        Self {
            model: BackgroundModel::new(config),
            binarize_threshold,
        }
    }

    /// Advances the background model by one frame and returns the binarized mask.
    pub fn apply(&mut self, frame: &GrayImage) -> Result<GrayImage> {
        let raw = self.model.apply(frame)?;
        Ok(binarize(&raw, self.binarize_threshold))
    }

    pub fn frames_seen(&self) -> u64 {
        self.model.frames_seen()
    }
}

/// Values strictly above `cutoff` become foreground; everything else background.
pub fn binarize(mask: &GrayImage, cutoff: u8) -> GrayImage {
    let mut out = mask.clone();
    for pixel in out.pixels_mut() {
        pixel[0] = if pixel[0] > cutoff { FOREGROUND } else { BACKGROUND };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn binarize_keeps_only_values_above_cutoff() {
        let mut mask = GrayImage::new(4, 1);
        mask.put_pixel(0, 0, Luma([0]));
        mask.put_pixel(1, 0, Luma([50]));
        mask.put_pixel(2, 0, Luma([51]));
        mask.put_pixel(3, 0, Luma([127]));

        let out = binarize(&mask, 50);
        let values: Vec<u8> = out.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    #[test]
    fn extractor_advances_model_once_per_frame() {
        let mut extractor = MotionMaskExtractor::new(MotionConfig::default());
        let frame = GrayImage::from_pixel(8, 8, Luma([30]));
        for expected in 1..=3 {
            extractor.apply(&frame).unwrap();
            assert_eq!(extractor.frames_seen(), expected);
        }
    }

    #[test]
    fn raised_cutoff_suppresses_everything() {
        let config = MotionConfig { binarize_threshold: 255, ..MotionConfig::default() };
        let mut extractor = MotionMaskExtractor::new(config);
        extractor.apply(&GrayImage::new(8, 8)).unwrap();
        let mask = extractor.apply(&GrayImage::from_pixel(8, 8, Luma([255]))).unwrap();
        assert!(mask.pixels().all(|p| p[0] == BACKGROUND));
    }
}
