// THEORY:
// Plain geometry containers. A `Rect` is a pixel-aligned box described by its
// top-left corner and size; a `Roi` is a `Rect` that has been validated and is
// never mutated again; a `Candidate` is the bounding box of one moving blob in
// one frame, together with the blob's pixel area. None of them carry behaviour
// beyond simple derived edges.

use crate::error::{Result, VisionError};
use serde::Deserialize;
use std::fmt;

/// An axis-aligned box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// The fixed region whose occupancy is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RoiFields")]
pub struct Roi {
    rect: Rect,
}

impl Roi {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(VisionError::InvalidRoi(format!(
                "width and height must be non-zero, got {}x{}",
                width, height
            )));
        }
        Ok(Self { rect: Rect::new(x, y, width, height) })
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// `(x1, y1, x2, y2)` with exclusive far edges.
    pub fn bound(&self) -> (u64, u64, u64, u64) {
        (self.rect.x as u64, self.rect.y as u64, self.rect.right(), self.rect.bottom())
    }
}

impl Default for Roi {
    fn default() -> Self {
        Self { rect: Rect::new(50, 50, 600, 800) }
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.rect, f)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RoiFields {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl TryFrom<RoiFields> for Roi {
    type Error = VisionError;

    fn try_from(f: RoiFields) -> Result<Self> {
        Roi::new(f.x, f.y, f.width, f.height)
    }
}

/// The bounding box of one connected foreground blob in a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub rect: Rect,
    /// Number of foreground pixels in the blob.
    pub area: u32,
}
