//! Frontier locator: turning a remembered visual coordinate back into an
//! offset of the current document.

use tracing::trace;

use crate::document::Document;
use crate::layout::Layout;
use crate::types::{Position, VisualY};

/// Default hit tolerance, in visual units.
pub const DEFAULT_TOLERANCE: VisualY = 5.0;

/// Offset whose projection is closest to `target`, within `tolerance`.
///
/// Binary-searches `0..=doc.size()` using [`Layout::project`] as the ordering.
/// Projection is only roughly monotonic, so a hit is refined linearly: the
/// search walks back to the start of the contiguous run of in-tolerance
/// offsets and picks the closest one in that run, leftmost on ties. If the
/// binary search never lands in tolerance, every offset is scanned. When
/// nothing is in tolerance the result is 0.
pub fn resolve_at_visual_y<L: Layout + ?Sized>(
    doc: &Document,
    layout: &L,
    target: VisualY,
    tolerance: VisualY,
) -> Position {
    let size = doc.size();
    let distance = |pos: Position| (layout.project(doc, pos) - target).abs();
    let hit = |pos: Position| distance(pos) < tolerance;

    let mut low = 0usize;
    let mut high = size;
    while low <= high {
        let mid = low + (high - low) / 2;
        let y = layout.project(doc, mid);
        if (y - target).abs() < tolerance {
            let pos = refine(mid, size, &hit, &distance);
            trace!(target_y = target, found = mid, resolved = pos, "frontier resolved");
            return pos;
        }
        if y < target {
            low = mid + 1;
        } else if mid == 0 {
            break;
        } else {
            high = mid - 1;
        }
    }

    let fallback = (0..=size)
        .filter(|&pos| hit(pos))
        .min_by(|&a, &b| distance(a).total_cmp(&distance(b)));
    match fallback {
        Some(pos) => {
            trace!(target_y = target, resolved = pos, "frontier resolved by linear scan");
            pos
        }
        None => {
            trace!(target_y = target, "frontier not within tolerance, using document start");
            0
        }
    }
}

fn refine(
    found: Position,
    size: usize,
    hit: &impl Fn(Position) -> bool,
    distance: &impl Fn(Position) -> VisualY,
) -> Position {
    let mut first = found;
    while first > 0 && hit(first - 1) {
        first -= 1;
    }
    let mut last = found;
    while last < size && hit(last + 1) {
        last += 1;
    }
    // min_by keeps the first of equal elements, so ties go left.
    (first..=last)
        .min_by(|&a, &b| distance(a).total_cmp(&distance(b)))
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::WrapLayout;

    /// Layout that projects through a fixed table.
    struct Table(Vec<VisualY>);

    impl Layout for Table {
        fn project(&self, _doc: &Document, pos: Position) -> VisualY {
            self.0[pos]
        }

        fn project_bottom(&self, doc: &Document, pos: Position) -> VisualY {
            self.project(doc, pos) + 10.0
        }
    }

    #[test]
    fn test_resolves_row_start() {
        let layout = WrapLayout::new(80, 21.0);
        let doc = Document::from_text("first line\nsecond line\nthird");
        // Row two starts at offset 11.
        assert_eq!(resolve_at_visual_y(&doc, &layout, 21.0, 5.0), 11);
        assert_eq!(resolve_at_visual_y(&doc, &layout, 23.0, 5.0), 11);
        assert_eq!(resolve_at_visual_y(&doc, &layout, 42.0, 5.0), 23);
        assert_eq!(resolve_at_visual_y(&doc, &layout, 0.0, 5.0), 0);
    }

    #[test]
    fn test_miss_returns_zero() {
        let layout = WrapLayout::new(80, 21.0);
        let doc = Document::from_text("one\ntwo");
        assert_eq!(resolve_at_visual_y(&doc, &layout, 10.0, 5.0), 0);
        assert_eq!(resolve_at_visual_y(&doc, &layout, 500.0, 5.0), 0);
        assert_eq!(resolve_at_visual_y(&doc, &layout, -50.0, 5.0), 0);
    }

    #[test]
    fn test_non_monotonic_layout_falls_back_to_scan() {
        // size 3 => positions 0..=3
        let doc = Document::from_text("ab");
        let layout = Table(vec![0.0, 30.0, 10.0, 20.0]);
        // Binary search tries 1 (30 > 10) then 0 and gives up; the scan
        // finds offset 2.
        assert_eq!(resolve_at_visual_y(&doc, &layout, 10.0, 5.0), 2);
    }

    #[test]
    fn test_refinement_prefers_closest_in_run() {
        // size 4 => positions 0..=4
        let doc = Document::from_text("abc");
        let layout = Table(vec![0.0, 8.0, 11.0, 9.5, 30.0]);
        // Offset 2 hits; the run is 1..=3 and offset 3 is closest to 10.
        assert_eq!(resolve_at_visual_y(&doc, &layout, 10.0, 5.0), 3);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let layout = WrapLayout::new(6, 21.0);
        let doc = Document::from_text("the quick brown\nfox jumps\n\nover the lazy dog");
        for pos in 0..=doc.size() {
            let y = layout.project(&doc, pos);
            let resolved = resolve_at_visual_y(&doc, &layout, y, 5.0);
            assert!((layout.project(&doc, resolved) - y).abs() < 5.0);
        }
    }
}
