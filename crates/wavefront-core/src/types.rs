//! Core addressing types: positions, visual coordinates and selections.
//!
//! These types are layout-agnostic. Positions are document offsets and are
//! only meaningful for the document version they were taken from; visual
//! coordinates come from the host layout and survive edits below them.

use std::ops::Range;

/// Offset into a document's linear address space, in chars.
///
/// Not stable across mutations. Carry a position over an edit with the
/// [`PositionMap`](crate::PositionMap) that edit returned.
pub type Position = usize;

/// Vertical coordinate produced by projecting a [`Position`] through the
/// host layout.
pub type VisualY = f32;

/// Anchor/head pair owned by the document.
///
/// The head is the cursor. Either end may come first; the engine reads the
/// ordered bounds through [`start`](Self::start) and [`end`](Self::end).
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
}

impl Selection {
    pub fn new(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    /// A bare cursor at `pos`.
    pub fn collapsed(pos: Position) -> Self {
        Self::new(pos, pos)
    }

    pub fn start(&self) -> Position {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> Position {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn range(&self) -> Range<Position> {
        self.start()..self.end()
    }

    /// Clamp both ends into `0..=max`.
    pub fn clamped(self, max: Position) -> Self {
        Self::new(self.anchor.min(max), self.head.min(max))
    }
}
