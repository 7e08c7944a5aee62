// Strict enclosure test between candidate boxes and the ROI. Touching an ROI
// edge still counts as inside; crossing it by a single pixel does not.

use crate::core_modules::rect::{Candidate, Rect, Roi};

/// True iff `rect` lies entirely within the bound of `roi`.
pub fn is_contained(rect: &Rect, roi: &Roi) -> bool {
    let (x1, y1, x2, y2) = roi.bound();
    x1 <= rect.x as u64 && y1 <= rect.y as u64 && rect.right() <= x2 && rect.bottom() <= y2
}

/// True iff at least one candidate is fully contained. Stops at the first hit.
pub fn any_contained<'a, I>(candidates: I, roi: &Roi) -> bool
where
    I: IntoIterator<Item = &'a Candidate>,
{
    candidates.into_iter().any(|c| is_contained(&c.rect, roi))
}
