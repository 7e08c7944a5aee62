use crate::capture::BgrFrame;
use opencv::{
    core::{self, Mat, Scalar, Size},
    highgui, imgproc,
    prelude::*,
};
use roi_vision::{Overlay, Renderer, VisionError};

const WINDOW_NAME: &str = "Frame";
const DISPLAY_SIZE: (i32, i32) = (900, 600);
const ESC_KEY: i32 = 27;

/// Shows each frame with the ROI and occupancy timers in a HighGUI window.
/// ESC stops the run.
pub struct HighGuiRenderer {
    window_open: bool,
}

impl HighGuiRenderer {
    pub fn new() -> Self {
        Self { window_open: false }
    }

    fn draw(&mut self, frame: &BgrFrame, overlay: &Overlay) -> opencv::Result<bool> {
        let mut canvas = frame.0.try_clone()?;

        let roi = overlay.roi.rect();
        let rect = core::Rect::new(to_i32(roi.x), to_i32(roi.y), to_i32(roi.width), to_i32(roi.height));
        imgproc::rectangle(&mut canvas, rect, Scalar::new(0.0, 255.0, 0.0, 0.0), 2, imgproc::LINE_8, 0)?;

        if let Some(inside_for) = overlay.inside_for {
            label(&mut canvas, &format!("In box: {:.2}s", inside_for), 30)?;
        }
        if let Some(first_entry) = overlay.first_entry {
            label(&mut canvas, &format!("Entered at {:.2}s", first_entry), 65)?;
        }

        let mut resized = Mat::default();
        imgproc::resize(
            &canvas,
            &mut resized,
            Size::new(DISPLAY_SIZE.0, DISPLAY_SIZE.1),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;
        highgui::imshow(WINDOW_NAME, &resized)?;
        self.window_open = true;

        let key = highgui::wait_key(overlay.frame_rate.frame_interval_millis() as i32)?;
        Ok(key & 0xFF == ESC_KEY)
    }

    fn destroy_windows(&mut self) {
        if self.window_open {
            if let Err(e) = highgui::destroy_all_windows() {
                log::warn!("failed to close display window: {}", e);
            }
            self.window_open = false;
        }
    }
}

fn label(canvas: &mut Mat, text: &str, baseline_y: i32) -> opencv::Result<()> {
    imgproc::put_text(
        canvas,
        text,
        core::Point::new(10, baseline_y),
        imgproc::FONT_HERSHEY_SIMPLEX,
        1.0,
        Scalar::new(0.0, 0.0, 255.0, 0.0),
        2,
        imgproc::LINE_8,
        false,
    )
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl Renderer<BgrFrame> for HighGuiRenderer {
    fn render(&mut self, frame: &BgrFrame, overlay: &Overlay) -> roi_vision::Result<bool> {
        self.draw(frame, overlay).map_err(|e| VisionError::Render(e.to_string()))
    }

    fn close(&mut self) {
        self.destroy_windows();
    }
}

impl Drop for HighGuiRenderer {
    fn drop(&mut self) {
        self.destroy_windows();
    }
}
