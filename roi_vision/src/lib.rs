// THEORY:
// `roi_vision` answers one question about a recorded video: when is the moving
// subject fully inside a fixed rectangle, and for how long?
//
// The public API is the `OccupancyPipeline` and its `PipelineConfig`, plus the
// two seams through which the outside world plugs in: `FrameSource` (where
// frames come from) and `Renderer` (optional visual inspection). The layers in
// `core_modules` are public so that they can be reused and tested on their own,
// but a caller normally only needs what is re-exported here.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use core_modules::frame::{FrameRate, FrameSource, GrayFrame};
pub use core_modules::image_sequence::ImageSequenceSource;
pub use core_modules::occupancy::{OccupancyEvent, OccupancyMode, OccupancyReport};
pub use core_modules::rect::{Rect, Roi};
pub use error::{Result, VisionError};
pub use pipeline::{OccupancyPipeline, Overlay, PipelineConfig, Renderer, RunSummary};
