//! Position remapping across document mutations.
//!
//! Every [`Document::apply`](crate::Document::apply) returns a [`PositionMap`]
//! describing how pre-edit offsets move. A map is a sequence of replaced
//! ranges, applied in order, so maps for consecutive edits compose with
//! [`PositionMap::then`].
//!
//! # Example
//!
//! Replacing `3..7` with two units:
//!
//! ```text
//! before:  0 1 2 [3 4 5 6] 7 8
//! after:   0 1 2 [3 4]     5 6
//! ```
//!
//! - `2` stays `2`, `8` becomes `6`.
//! - `3` (range start) stays `3`, `7` (range end) becomes `5`.
//! - `5` was deleted: it collapses to `3` with [`Assoc::Before`] and to `5`
//!   with [`Assoc::After`].

use crate::types::Position;

/// Which side a position sticks to when content is inserted exactly at it,
/// or when it falls inside deleted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// Outcome of mapping a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapped {
    /// The position survived the edit.
    Kept(Position),
    /// The position was inside deleted content; carries the collapse point.
    Deleted(Position),
}

impl Mapped {
    pub fn pos(self) -> Position {
        match self {
            Mapped::Kept(pos) | Mapped::Deleted(pos) => pos,
        }
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, Mapped::Deleted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    start: Position,
    old_len: usize,
    new_len: usize,
}

impl Step {
    fn map(self, pos: Position, assoc: Assoc) -> Mapped {
        let end = self.start + self.old_len;
        if pos < self.start {
            return Mapped::Kept(pos);
        }
        if pos > end {
            return Mapped::Kept(pos - self.old_len + self.new_len);
        }
        if self.old_len == 0 {
            return match assoc {
                Assoc::Before => Mapped::Kept(self.start),
                Assoc::After => Mapped::Kept(self.start + self.new_len),
            };
        }
        if pos == self.start {
            return Mapped::Kept(self.start);
        }
        if pos == end {
            return Mapped::Kept(self.start + self.new_len);
        }
        match assoc {
            Assoc::Before => Mapped::Deleted(self.start),
            Assoc::After => Mapped::Deleted(self.start + self.new_len),
        }
    }
}

/// Maps pre-edit positions to post-edit positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
    steps: Vec<Step>,
}

impl PositionMap {
    /// Map that leaves every position in place.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Map for replacing `old_len` units at `start` with `new_len` units.
    pub fn single(start: Position, old_len: usize, new_len: usize) -> Self {
        if old_len == 0 && new_len == 0 {
            return Self::identity();
        }
        Self {
            steps: vec![Step {
                start,
                old_len,
                new_len,
            }],
        }
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn map(&self, pos: Position, assoc: Assoc) -> Position {
        self.map_result(pos, assoc).pos()
    }

    /// Like [`map`](Self::map), but reports whether the position fell inside
    /// deleted content at any step.
    pub fn map_result(&self, pos: Position, assoc: Assoc) -> Mapped {
        let mut deleted = false;
        let mut pos = pos;
        for step in &self.steps {
            match step.map(pos, assoc) {
                Mapped::Kept(next) => pos = next,
                Mapped::Deleted(next) => {
                    deleted = true;
                    pos = next;
                }
            }
        }
        if deleted {
            Mapped::Deleted(pos)
        } else {
            Mapped::Kept(pos)
        }
    }

    /// Compose with a map for a later edit.
    pub fn then(mut self, next: PositionMap) -> Self {
        self.steps.extend(next.steps);
        self
    }

    /// Net change in document size.
    pub fn size_delta(&self) -> isize {
        self.steps
            .iter()
            .map(|s| s.new_len as isize - s.old_len as isize)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_shifts_positions_after() {
        let map = PositionMap::single(4, 0, 3);
        assert_eq!(map.map(2, Assoc::After), 2);
        assert_eq!(map.map(9, Assoc::Before), 12);
    }

    #[test]
    fn test_insertion_point_follows_assoc() {
        let map = PositionMap::single(4, 0, 3);
        assert_eq!(map.map(4, Assoc::Before), 4);
        assert_eq!(map.map(4, Assoc::After), 7);
        assert!(!map.map_result(4, Assoc::After).is_deleted());
    }

    #[test]
    fn test_deletion_tombstones_interior() {
        let map = PositionMap::single(3, 4, 0);
        assert_eq!(map.map_result(3, Assoc::After), Mapped::Kept(3));
        assert_eq!(map.map_result(5, Assoc::Before), Mapped::Deleted(3));
        assert_eq!(map.map_result(5, Assoc::After), Mapped::Deleted(3));
        assert_eq!(map.map_result(7, Assoc::Before), Mapped::Kept(3));
        assert_eq!(map.map_result(8, Assoc::Before), Mapped::Kept(4));
    }

    #[test]
    fn test_replacement_collapses_by_side() {
        let map = PositionMap::single(3, 4, 2);
        assert_eq!(map.map(5, Assoc::Before), 3);
        assert_eq!(map.map(5, Assoc::After), 5);
        assert_eq!(map.map(7, Assoc::Before), 5);
        assert_eq!(map.map(8, Assoc::Before), 6);
        assert_eq!(map.size_delta(), -2);
    }

    #[test]
    fn test_composition_applies_in_order() {
        // Insert 2 at 0, then delete 5..8 of the new document.
        let map = PositionMap::single(0, 0, 2).then(PositionMap::single(5, 3, 0));
        assert_eq!(map.map(1, Assoc::After), 3);
        assert_eq!(map.map_result(4, Assoc::After), Mapped::Deleted(5));
        assert_eq!(map.map(10, Assoc::After), 9);
        assert_eq!(map.size_delta(), -1);
    }

    #[test]
    fn test_identity() {
        let map = PositionMap::single(7, 0, 0);
        assert!(map.is_identity());
        assert_eq!(map.map(7, Assoc::After), 7);
    }
}
