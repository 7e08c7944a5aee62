// THEORY:
// The `BackgroundModel` is the temporal memory of the vision system. Like a
// grid of tiny learning cells, it holds one running Gaussian (mean and
// variance of luma) for every pixel location and uses it to decide whether the
// current sample belongs to the static scene or to something that moved.
//
// Key architectural principles:
// 1.  **Lazy Seeding**: The model has no dimensions until it sees its first
//     frame. That frame becomes the initial mean; nothing can be foreground yet.
// 2.  **Adaptive Learning**: The learning rate starts high and settles at
//     `1 / history`, so the model converges quickly at the start of a video and
//     then only drifts slowly. A subject that stops moving for long enough is
//     eventually absorbed into the background.
// 3.  **Statistical Decision**: A pixel is foreground when its squared deviation
//     from the mean exceeds `var_threshold` times the learned variance (a squared
//     Mahalanobis distance). Variance is clamped so that a perfectly static region
//     does not become infinitely sensitive.
// 4.  **Two Labels Only**: There is no shadow class. A sample is either
//     background (0) or foreground (255).
// 5.  **Order Dependence**: Each call to `apply` both classifies and learns.
//     Frames must arrive exactly once and in order; the model cannot be queried
//     without advancing it.

use crate::error::{Result, VisionError};
use image::{GrayImage, Luma};
use serde::Deserialize;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Tunables for the background model and the binarization step that follows it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionConfig {
    /// Number of frames the learning rate eventually averages over.
    pub history: u32,
    /// Squared Mahalanobis distance above which a pixel is foreground.
    pub var_threshold: f32,
    /// Variance given to every pixel when the model is seeded.
    pub var_init: f32,
    pub var_min: f32,
    pub var_max: f32,
    /// Mask intensity cutoff applied after the model; values above it survive.
    pub binarize_threshold: u8,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            history: 500,
            var_threshold: 50.0,
            var_init: 15.0,
            var_min: 4.0,
            var_max: 75.0,
            binarize_threshold: 50,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.history == 0 {
            return Err(VisionError::Config("motion.history must be at least 1".into()));
        }
        if !(self.var_threshold.is_finite() && self.var_threshold > 0.0) {
            return Err(VisionError::Config("motion.var_threshold must be positive".into()));
        }
        if !(self.var_min > 0.0 && self.var_min <= self.var_max) {
            return Err(VisionError::Config(format!(
                "motion.var_min ({}) must be positive and not exceed motion.var_max ({})",
                self.var_min, self.var_max
            )));
        }
        Ok(())
    }
}

/// Per-pixel running Gaussian model of the static scene.
pub struct BackgroundModel {
    config: MotionConfig,
    width: u32,
    height: u32,
    mean: Vec<f32>,
    variance: Vec<f32>,
    /// Number of frames applied so far, seed included.
    frames_seen: u64,
}

impl BackgroundModel {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            width: 0,
            height: 0,
            mean: Vec::new(),
            variance: Vec::new(),
            frames_seen: 0,
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.frames_seen > 0
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Classifies every pixel of `frame` and then folds it into the model.
    pub fn apply(&mut self, frame: &GrayImage) -> Result<GrayImage> {
        let (width, height) = frame.dimensions();

        if !self.is_seeded() {
            self.seed(frame);
            return Ok(GrayImage::from_pixel(width, height, Luma([BACKGROUND])));
        }

        if (width, height) != (self.width, self.height) {
            return Err(VisionError::FrameDimensions {
                expected: (self.width, self.height),
                found: (width, height),
            });
        }

        self.frames_seen += 1;
        let alpha = self.learning_rate();
        let threshold = self.config.var_threshold;
        let (var_min, var_max) = (self.config.var_min, self.config.var_max);

        let mut mask = GrayImage::new(width, height);
        let cells = self.mean.iter_mut().zip(self.variance.iter_mut());
        for ((sample, out), (mean, var)) in frame.pixels().zip(mask.pixels_mut()).zip(cells) {
            let deviation = sample[0] as f32 - *mean;
            let distance_sq = deviation * deviation;

            out[0] = if distance_sq > threshold * *var { FOREGROUND } else { BACKGROUND };

            *mean += alpha * deviation;
            *var = (*var + alpha * (distance_sq - *var)).clamp(var_min, var_max);
        }

        Ok(mask)
    }

    fn seed(&mut self, frame: &GrayImage) {
        let (width, height) = frame.dimensions();
        self.width = width;
        self.height = height;
        self.mean = frame.pixels().map(|p| p[0] as f32).collect();
        self.variance = vec![self.config.var_init; self.mean.len()];
        self.frames_seen = 1;
        log::debug!("background model seeded at {}x{}", width, height);
    }

    /// Starts fast and settles at `1 / history`.
    fn learning_rate(&self) -> f32 {
        let window = (2 * self.frames_seen).min(self.config.history as u64).max(1);
        1.0 / window as f32
    }
}
