use std::path::PathBuf;

/// Everything that can abort an occupancy run.
///
/// End-of-stream and user cancellation are not errors. Both end a run normally
/// and show up in `RunSummary`.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("invalid frame rate {0}: must be finite and greater than zero")]
    InvalidFrameRate(f64),

    #[error("invalid region of interest: {0}")]
    InvalidRoi(String),

    #[error("frame dimensions changed from {expected:?} to {found:?}")]
    FrameDimensions { expected: (u32, u32), found: (u32, u32) },

    #[error("frame conversion failed: {0}")]
    Frame(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("renderer failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, VisionError>;
