// THEORY:
// The `pipeline` module is the top-level API of the engine. It wires the layers
// together in one strictly sequential pass per frame:
//
//     frame -> luma -> motion mask -> candidates -> containment -> occupancy
//
// and drives a `FrameSource` to exhaustion. Three rules shape the driver:
// 1.  **Validate before reading**: the frame rate is checked before the first
//     frame is pulled, because every timestamp depends on it.
// 2.  **Rendering is a tap**: a `Renderer` sees the frame after the occupancy
//     update and may only answer "abort or continue". It cannot reach the
//     model, the candidates or the tracker.
// 3.  **Always clean up**: however the loop ends (end of stream, cancellation
//     or an error), the source is released and the renderer closed exactly once.

use crate::core_modules::background_model::MotionConfig;
use crate::core_modules::blob_detector::{DEFAULT_MIN_AREA, extract_candidates};
use crate::core_modules::containment::any_contained;
use crate::core_modules::frame::{FrameRate, FrameSource, GrayFrame};
use crate::core_modules::motion_mask::MotionMaskExtractor;
use crate::core_modules::occupancy::{OccupancyMode, OccupancyReport, OccupancyTracker};
use crate::core_modules::rect::Roi;
use crate::error::Result;
use image::GrayImage;

/// Configuration for the OccupancyPipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub roi: Roi,
    pub mode: OccupancyMode,
    pub motion: MotionConfig,
    /// Blobs with fewer foreground pixels than this are treated as noise.
    pub min_candidate_area: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            roi: Roi::default(),
            mode: OccupancyMode::default(),
            motion: MotionConfig::default(),
            min_candidate_area: DEFAULT_MIN_AREA,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.motion.validate()
    }
}

/// What a renderer is told about the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub roi: Roi,
    pub frame_index: u64,
    pub frame_rate: FrameRate,
    /// Seconds from the start of the video.
    pub timestamp: f64,
    /// Seconds spent in the current stay, if the subject is inside.
    pub inside_for: Option<f64>,
    pub first_entry: Option<f64>,
}

/// Optional per-frame visual inspection.
pub trait Renderer<F> {
    /// Shows `frame`. Returning `Ok(true)` asks the run to stop.
    fn render(&mut self, frame: &F, overlay: &Overlay) -> Result<bool>;

    /// Releases display resources after the last `render` call.
    fn close(&mut self) {}
}

/// What the per-frame stages found in a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAnalysis {
    pub candidates: usize,
    pub contained: bool,
}

/// How a run ended and what it found.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub report: OccupancyReport,
    pub frames_processed: u64,
    /// True when a renderer asked to stop before the source ran dry.
    pub cancelled: bool,
}

/// The per-frame stages shared by every run, independent of where frames come from.
pub struct FrameAnalyzer {
    extractor: MotionMaskExtractor,
    roi: Roi,
    min_candidate_area: u32,
}

impl FrameAnalyzer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            extractor: MotionMaskExtractor::new(config.motion.clone()),
            roi: config.roi,
            min_candidate_area: config.min_candidate_area,
        }
    }

    /// Mask, candidates and containment for one frame. Advances the background model.
    pub fn analyze(&mut self, frame: &GrayImage) -> Result<FrameAnalysis> {
        let mask = self.extractor.apply(frame)?;
        let candidates = extract_candidates(&mask, self.min_candidate_area);
        Ok(FrameAnalysis {
            candidates: candidates.len(),
            contained: any_contained(&candidates, &self.roi),
        })
    }
}

/// The main, top-level struct for the occupancy engine.
pub struct OccupancyPipeline {
    config: PipelineConfig,
}

impl OccupancyPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs `source` to exhaustion without rendering.
    pub fn run<S: FrameSource>(&self, source: &mut S) -> Result<RunSummary> {
        self.drive(source, None)
    }

    /// Runs `source` to exhaustion, showing every processed frame on `renderer`.
    pub fn run_with_renderer<S, R>(&self, source: &mut S, renderer: &mut R) -> Result<RunSummary>
    where
        S: FrameSource,
        R: Renderer<S::Frame>,
    {
        let result = self.drive(source, Some(&mut *renderer));
        renderer.close();
        result
    }

    fn drive<S: FrameSource>(
        &self,
        source: &mut S,
        renderer: Option<&mut dyn Renderer<S::Frame>>,
    ) -> Result<RunSummary> {
        let result = self.process_stream(source, renderer);
        source.release();
        result
    }

    fn process_stream<S: FrameSource>(
        &self,
        source: &mut S,
        mut renderer: Option<&mut dyn Renderer<S::Frame>>,
    ) -> Result<RunSummary> {
        let rate = FrameRate::new(source.frame_rate())?;
        log::info!(
            "occupancy run: roi={} mode={:?} fps={:.3} min_area={}",
            self.config.roi,
            self.config.mode,
            rate.fps(),
            self.config.min_candidate_area
        );

        let mut analyzer = FrameAnalyzer::new(&self.config);
        let mut tracker = OccupancyTracker::new(self.config.mode, rate);
        let mut frame_index = 0u64;
        let mut cancelled = false;

        while let Some(frame) = source.read() {
            let luma = match frame.to_luma() {
                Ok(luma) => luma,
                Err(e) => {
                    log::warn!("ending run at unconvertible frame {}: {}", frame_index + 1, e);
                    break;
                }
            };
            frame_index += 1;

            let analysis = analyzer.analyze(&luma)?;
            log::trace!("frame {}: {:?}", frame_index, analysis);
            if let Some(transition) = tracker.update(frame_index, analysis.contained) {
                log::debug!("frame {}: {:?}", frame_index, transition);
            }

            if let Some(r) = renderer.as_deref_mut() {
                let overlay = Overlay {
                    roi: self.config.roi,
                    frame_index,
                    frame_rate: rate,
                    timestamp: rate.seconds(frame_index),
                    inside_for: tracker.inside_for(frame_index),
                    first_entry: tracker.first_entry_time(),
                };
                match r.render(&frame, &overlay) {
                    Ok(true) => {
                        log::info!("run cancelled by renderer at frame {}", frame_index);
                        cancelled = true;
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        log::warn!("rendering disabled: {}", e);
                        renderer = None;
                    }
                }
            }
        }

        let report = tracker.finish();
        log::info!("occupancy run finished after {} frames", frame_index);
        Ok(RunSummary { report, frames_processed: frame_index, cancelled })
    }
}
