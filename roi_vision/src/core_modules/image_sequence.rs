// THEORY:
// `ImageSequenceSource` treats a directory of still images as a video. Frames
// are ordered by file name, so zero-padded names (`frame_0001.png`, ...) play
// back in capture order. The directory carries no timing information, so the
// caller supplies the frame rate.
//
// A still that fails to decode ends the stream, exactly like a failed read
// from a video container: the run is a single deterministic pass and nothing
// is retried or skipped.

use crate::core_modules::frame::FrameSource;
use crate::error::{Result, VisionError};
use image::DynamicImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

const STILL_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

pub struct ImageSequenceSource {
    pending: VecDeque<PathBuf>,
    fps: f64,
}

impl ImageSequenceSource {
    pub fn open(dir: impl AsRef<Path>, fps: f64) -> Result<Self> {
        let dir = dir.as_ref();
        let io_err = |source: std::io::Error| VisionError::Io { path: dir.to_path_buf(), source };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && is_still(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        log::info!("image sequence {}: {} frames", dir.display(), paths.len());
        Ok(Self { pending: paths.into(), fps })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

fn is_still(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| STILL_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    type Frame = DynamicImage;

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn read(&mut self) -> Option<DynamicImage> {
        let path = self.pending.pop_front()?;
        match image::open(&path) {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::warn!("stopping at unreadable still {}: {}", path.display(), e);
                self.pending.clear();
                None
            }
        }
    }

    fn release(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::frame::GrayFrame;
    use image::{GrayImage, Luma};

    fn write_still(dir: &Path, name: &str, level: u8) {
        GrayImage::from_pixel(4, 4, Luma([level]))
            .save(dir.join(name))
            .expect("Error Saving File.");
    }

    #[test]
    fn plays_stills_back_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_still(dir.path(), "frame_0002.png", 20);
        write_still(dir.path(), "frame_0001.png", 10);
        write_still(dir.path(), "frame_0003.png", 30);
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), 25.0).unwrap();
        assert_eq!(source.remaining(), 3);
        assert_eq!(source.frame_rate(), 25.0);

        let levels: Vec<u8> = std::iter::from_fn(|| source.read())
            .map(|frame| frame.to_luma().unwrap().get_pixel(0, 0)[0])
            .collect();
        assert_eq!(levels, vec![10, 20, 30]);
        assert!(source.read().is_none());
    }

    #[test]
    fn undecodable_still_ends_the_stream() {
        let dir = tempfile::tempdir().unwrap();
        write_still(dir.path(), "a.png", 10);
        std::fs::write(dir.path().join("b.png"), b"definitely not a png").unwrap();
        write_still(dir.path(), "c.png", 30);

        let mut source = ImageSequenceSource::open(dir.path(), 10.0).unwrap();
        assert!(source.read().is_some());
        assert!(source.read().is_none());
        assert!(source.read().is_none());
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            ImageSequenceSource::open(&missing, 10.0),
            Err(VisionError::Io { .. })
        ));
    }
}
