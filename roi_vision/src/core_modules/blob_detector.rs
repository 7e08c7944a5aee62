// THEORY:
// The blob detector is the spatial grouping layer. It takes the binary motion
// mask for a single frame and finds the coherent moving shapes in it.
//
// Algorithm:
// 1.  **Outer Background**: Flood-fill the background from every border pixel
//     using 4-connectivity. Background that cannot be reached this way is a
//     hole enclosed by some foreground shape.
// 2.  **Region Growing**: Every unvisited foreground pixel seeds a new blob,
//     grown with an explicit stack over its 8 neighbours. While growing we
//     accumulate the bounding box and the pixel count, and note whether the blob
//     touches the frame edge or the outer background.
// 3.  **External Only**: A blob that never touches the outer background lives
//     inside another blob's hole. Only the outermost shapes are reported.
// 4.  **Noise Rejection**: Blobs whose area falls below `min_area` are dropped
//     entirely. Small specks from sensor noise or swaying background never
//     become candidates.
//
// The detector is stateless: it knows nothing about previous frames, and the
// order of the returned candidates carries no meaning.

use crate::core_modules::rect::{Candidate, Rect};
use image::GrayImage;

pub const DEFAULT_MIN_AREA: u32 = 500;

const NEIGHBOURS_4: [(i64, i64); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const NEIGHBOURS_8: [(i64, i64); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// Finds the external blobs of `mask` whose pixel area is at least `min_area`.
pub fn extract_candidates(mask: &GrayImage, min_area: u32) -> Vec<Candidate> {
    let (width, height) = mask.dimensions();
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let foreground: Vec<bool> = mask.pixels().map(|p| p[0] != 0).collect();
    let outer = outer_background(&foreground, w, h);
    let mut visited = vec![false; w * h];
    let mut candidates = Vec::new();

    for start in 0..w * h {
        if !foreground[start] || visited[start] {
            continue;
        }
        let blob = grow_blob(start, &foreground, &outer, &mut visited, w, h);
        if blob.external && blob.area >= min_area {
            candidates.push(Candidate { rect: blob.bounding_box(), area: blob.area });
        }
    }

    candidates
}

struct Blob {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
    area: u32,
    external: bool,
}

impl Blob {
    fn bounding_box(&self) -> Rect {
        Rect::new(
            self.min_x as u32,
            self.min_y as u32,
            (self.max_x - self.min_x + 1) as u32,
            (self.max_y - self.min_y + 1) as u32,
        )
    }
}

fn neighbour(index: usize, (dx, dy): (i64, i64), w: usize, h: usize) -> Option<usize> {
    let nx = (index % w) as i64 + dx;
    let ny = (index / w) as i64 + dy;
    if nx >= 0 && nx < w as i64 && ny >= 0 && ny < h as i64 {
        Some(ny as usize * w + nx as usize)
    } else {
        None
    }
}

fn on_border(index: usize, w: usize, h: usize) -> bool {
    let x = index % w;
    let y = index / w;
    x == 0 || y == 0 || x == w - 1 || y == h - 1
}

/// Marks the background pixels reachable from the frame border.
fn outer_background(foreground: &[bool], w: usize, h: usize) -> Vec<bool> {
    let mut outer = vec![false; w * h];
    let mut stack: Vec<usize> = (0..w * h)
        .filter(|&i| on_border(i, w, h) && !foreground[i])
        .collect();
    for &i in &stack {
        outer[i] = true;
    }

    while let Some(current) = stack.pop() {
        for offset in NEIGHBOURS_4 {
            if let Some(n) = neighbour(current, offset, w, h) {
                if !foreground[n] && !outer[n] {
                    outer[n] = true;
                    stack.push(n);
                }
            }
        }
    }

    outer
}

fn grow_blob(
    start: usize,
    foreground: &[bool],
    outer: &[bool],
    visited: &mut [bool],
    w: usize,
    h: usize,
) -> Blob {
    let mut blob = Blob {
        min_x: usize::MAX,
        min_y: usize::MAX,
        max_x: 0,
        max_y: 0,
        area: 0,
        external: false,
    };
    let mut stack = vec![start];
    visited[start] = true;

    while let Some(current) = stack.pop() {
        let (x, y) = (current % w, current / w);
        blob.min_x = blob.min_x.min(x);
        blob.min_y = blob.min_y.min(y);
        blob.max_x = blob.max_x.max(x);
        blob.max_y = blob.max_y.max(y);
        blob.area += 1;

        if !blob.external {
            blob.external = on_border(current, w, h)
                || NEIGHBOURS_4
                    .iter()
                    .filter_map(|&o| neighbour(current, o, w, h))
                    .any(|n| outer[n]);
        }

        for offset in NEIGHBOURS_8 {
            if let Some(n) = neighbour(current, offset, w, h) {
                if foreground[n] && !visited[n] {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }
    }

    blob
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(mask: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
        for yy in y..y + h {
            for xx in x..x + w {
                mask.put_pixel(xx, yy, Luma([255]));
            }
        }
    }

    fn sorted(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.sort_by_key(|c| (c.rect.x, c.rect.y));
        candidates
    }

    #[test]
    fn empty_mask_has_no_candidates() {
        let mask = GrayImage::new(64, 64);
        assert!(extract_candidates(&mask, 1).is_empty());
    }

    #[test]
    fn finds_bounding_boxes_of_separate_blobs() {
        let mut mask = GrayImage::new(100, 100);
        fill(&mut mask, 10, 10, 20, 25);
        fill(&mut mask, 60, 50, 30, 10);

        let found = sorted(extract_candidates(&mask, 1));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].rect, Rect::new(10, 10, 20, 25));
        assert_eq!(found[0].area, 500);
        assert_eq!(found[1].rect, Rect::new(60, 50, 30, 10));
        assert_eq!(found[1].area, 300);
    }

    #[test]
    fn area_equal_to_minimum_is_kept() {
        let mut mask = GrayImage::new(64, 64);
        fill(&mut mask, 5, 5, 25, 20); // 500 pixels
        let found = extract_candidates(&mask, DEFAULT_MIN_AREA);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].area, 500);
    }

    #[test]
    fn area_one_below_minimum_is_discarded() {
        let mut mask = GrayImage::new(64, 64);
        fill(&mut mask, 5, 5, 25, 20);
        mask.put_pixel(5, 5, Luma([0])); // 499 pixels, same bounding box
        assert!(extract_candidates(&mask, DEFAULT_MIN_AREA).is_empty());
    }

    #[test]
    fn diagonal_pixels_join_one_blob() {
        let mut mask = GrayImage::new(10, 10);
        for i in 2..7 {
            mask.put_pixel(i, i, Luma([255]));
        }
        let found = extract_candidates(&mask, 1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rect, Rect::new(2, 2, 5, 5));
        assert_eq!(found[0].area, 5);
    }

    #[test]
    fn blob_inside_a_hole_is_not_external() {
        let mut mask = GrayImage::new(50, 50);
        // Hollow ring 30x30 with a 2 pixel wall.
        fill(&mut mask, 10, 10, 30, 2);
        fill(&mut mask, 10, 38, 30, 2);
        fill(&mut mask, 10, 12, 2, 26);
        fill(&mut mask, 38, 12, 2, 26);
        // Island in the middle of the hole.
        fill(&mut mask, 22, 22, 5, 5);

        let found = extract_candidates(&mask, 1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rect, Rect::new(10, 10, 30, 30));
    }

    #[test]
    fn blob_touching_frame_edge_is_external() {
        let mut mask = GrayImage::new(20, 20);
        fill(&mut mask, 0, 0, 20, 20);
        let found = extract_candidates(&mask, 1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rect, Rect::new(0, 0, 20, 20));
        assert_eq!(found[0].area, 400);
    }
}
