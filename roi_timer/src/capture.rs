use anyhow::{Context, Result, bail};
use image::GrayImage;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use roi_vision::{FrameSource, GrayFrame, VisionError};
use std::path::Path;

/// A decoded OpenCV frame in its native BGR(A) or single-channel layout.
pub struct BgrFrame(pub Mat);

impl GrayFrame for BgrFrame {
    fn to_luma(&self) -> roi_vision::Result<GrayImage> {
        let frame = &self.0;
        let mut gray = Mat::default();
        match frame.channels() {
            1 => gray = frame.try_clone().map_err(frame_err)?,
            3 => imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0).map_err(frame_err)?,
            4 => imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGRA2GRAY, 0).map_err(frame_err)?,
            n => return Err(VisionError::Frame(format!("unsupported channel count {}", n))),
        }

        let (width, height) = (gray.cols() as u32, gray.rows() as u32);
        let bytes = gray.data_bytes().map_err(frame_err)?.to_vec();
        GrayImage::from_raw(width, height, bytes)
            .ok_or_else(|| VisionError::Frame(format!("{}x{} luma buffer has the wrong size", width, height)))
    }
}

fn frame_err(e: opencv::Error) -> VisionError {
    VisionError::Frame(e.to_string())
}

/// Frames from a video container, decoded by OpenCV.
pub struct VideoFileSource {
    capture: VideoCapture,
    fps: f64,
}

impl VideoFileSource {
    /// Opens `path`. `fps_override` replaces the rate reported by the container.
    pub fn open(path: &Path, fps_override: Option<f64>) -> Result<Self> {
        let location = path
            .to_str()
            .with_context(|| format!("video path is not valid UTF-8: {}", path.display()))?;
        let capture = VideoCapture::from_file(location, videoio::CAP_ANY)
            .with_context(|| format!("failed to open video {}", path.display()))?;
        if !capture.is_opened()? {
            bail!("failed to open video {}", path.display());
        }

        let reported = capture.get(videoio::CAP_PROP_FPS)?;
        let fps = fps_override.unwrap_or(reported);
        log::info!(
            "opened {} ({}x{}, reported {:.3} fps, using {:.3})",
            path.display(),
            capture.get(videoio::CAP_PROP_FRAME_WIDTH)?,
            capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?,
            reported,
            fps
        );

        Ok(Self { capture, fps })
    }
}

impl FrameSource for VideoFileSource {
    type Frame = BgrFrame;

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn read(&mut self) -> Option<BgrFrame> {
        let mut frame = Mat::default();
        match self.capture.read(&mut frame) {
            Ok(true) if !frame.empty() => Some(BgrFrame(frame)),
            Ok(_) => None,
            Err(e) => {
                log::warn!("error reading frame, treating as end of video: {}", e);
                None
            }
        }
    }

    fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            log::warn!("failed to release video capture: {}", e);
        }
    }
}
