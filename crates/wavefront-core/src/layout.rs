//! Layout seam: projecting document positions onto visual coordinates.
//!
//! The engine never renders anything. A host supplies a [`Layout`] that says
//! where a position would appear vertically; the engine remembers the
//! wavefront in those coordinates because they survive edits below them.

use std::ops::Range;

use crate::document::Document;
use crate::node::{Node, PlaceholderId};
use crate::types::{Position, VisualY};

/// Host rendering surface.
///
/// Both methods must be pure functions of the current layout and are only
/// called with positions in `0..=doc.size()`.
pub trait Layout {
    /// Top of the visual row holding `pos`.
    fn project(&self, doc: &Document, pos: Position) -> VisualY;

    /// Bottom of the visual row holding `pos`.
    fn project_bottom(&self, doc: &Document, pos: Position) -> VisualY;
}

/// Fixed-width soft-wrapping layout with a constant line height.
///
/// A text block of `n` chars takes `max(1, ceil(n / columns))` rows. A
/// placeholder takes exactly its reserved height. Good enough for terminals
/// and tests; a GUI host would project through its real text layout instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrapLayout {
    pub columns: usize,
    pub line_height: VisualY,
    pub top: VisualY,
}

impl Default for WrapLayout {
    fn default() -> Self {
        Self {
            columns: 80,
            line_height: 21.0,
            top: 0.0,
        }
    }
}

/// One laid-out row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub top: VisualY,
    pub height: VisualY,
    pub kind: RowKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    /// A slice of a text block. `range` holds every position that projects
    /// onto this row.
    Text {
        range: Range<Position>,
        text: String,
    },
    Placeholder {
        at: Position,
        id: PlaceholderId,
    },
}

impl WrapLayout {
    pub fn new(columns: usize, line_height: VisualY) -> Self {
        Self {
            columns,
            line_height,
            ..Self::default()
        }
    }

    fn columns(&self) -> usize {
        self.columns.max(1)
    }

    fn rows_for(&self, chars: usize) -> usize {
        chars.div_ceil(self.columns()).max(1)
    }

    /// Top and height of the row holding `pos`.
    fn row_of(&self, doc: &Document, pos: Position) -> (VisualY, VisualY) {
        let mut y = self.top;
        let mut end = (self.top, self.line_height);
        for (start, node) in doc.iter() {
            match node {
                Node::TextBlock(block) => {
                    let rows = self.rows_for(block.len_chars());
                    let last_row = (rows - 1) as VisualY * self.line_height;
                    if pos <= start + block.len_chars() {
                        let row = ((pos - start) / self.columns()).min(rows - 1);
                        return (y + row as VisualY * self.line_height, self.line_height);
                    }
                    end = (y + last_row, self.line_height);
                    y += rows as VisualY * self.line_height;
                }
                Node::Placeholder(p) => {
                    if pos == start {
                        return (y, p.height);
                    }
                    y += p.height;
                    end = (y, self.line_height);
                }
            }
        }
        end
    }

    /// Lay out the whole document.
    pub fn rows(&self, doc: &Document) -> Vec<Row> {
        let mut rows = Vec::new();
        let mut y = self.top;
        let cols = self.columns();
        for (start, node) in doc.iter() {
            match node {
                Node::TextBlock(block) => {
                    let chars: Vec<char> = block.chars().map(|(c, _)| c).collect();
                    let count = self.rows_for(chars.len());
                    for k in 0..count {
                        let from = k * cols;
                        let to = ((k + 1) * cols).min(chars.len());
                        let range_end = if k + 1 == count {
                            start + chars.len() + 1
                        } else {
                            start + to
                        };
                        rows.push(Row {
                            top: y,
                            height: self.line_height,
                            kind: RowKind::Text {
                                range: start + from..range_end,
                                text: chars.get(from..to).unwrap_or_default().iter().collect(),
                            },
                        });
                        y += self.line_height;
                    }
                }
                Node::Placeholder(p) => {
                    rows.push(Row {
                        top: y,
                        height: p.height,
                        kind: RowKind::Placeholder { at: start, id: p.id },
                    });
                    y += p.height;
                }
            }
        }
        rows
    }
}

impl Layout for WrapLayout {
    fn project(&self, doc: &Document, pos: Position) -> VisualY {
        self.row_of(doc, pos).0
    }

    fn project_bottom(&self, doc: &Document, pos: Position) -> VisualY {
        let (top, height) = self.row_of(doc, pos);
        top + height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Edit, Placeholder};

    fn with_placeholder(text: &str, from: Position, to: Position, height: VisualY) -> Document {
        let mut doc = Document::from_text(text);
        let original = doc.text_between(from, to, "\n");
        doc.apply(Edit::placeholder(
            from,
            to,
            Placeholder {
                id: PlaceholderId(7),
                payload: 0..original.len(),
                original,
                height,
            },
        ))
        .unwrap();
        doc
    }

    #[test]
    fn test_single_line() {
        let layout = WrapLayout::new(80, 20.0);
        let doc = Document::from_text("hello");
        for pos in 0..=doc.size() {
            assert_eq!(layout.project(&doc, pos), 0.0);
        }
        assert_eq!(layout.project_bottom(&doc, 5), 20.0);
    }

    #[test]
    fn test_blocks_stack() {
        let layout = WrapLayout::new(80, 20.0);
        let doc = Document::from_text("ab\n\ncd");
        assert_eq!(layout.project(&doc, 2), 0.0);
        assert_eq!(layout.project(&doc, 3), 20.0);
        assert_eq!(layout.project(&doc, 4), 40.0);
        assert_eq!(layout.project(&doc, doc.size()), 40.0);
    }

    #[test]
    fn test_soft_wrap() {
        let layout = WrapLayout::new(4, 10.0);
        let doc = Document::from_text("abcdefghij\nz");
        // Three rows: "abcd", "efgh", "ij".
        assert_eq!(layout.project(&doc, 3), 0.0);
        assert_eq!(layout.project(&doc, 4), 10.0);
        assert_eq!(layout.project(&doc, 9), 20.0);
        assert_eq!(layout.project(&doc, 10), 20.0);
        assert_eq!(layout.project(&doc, 11), 30.0);
    }

    #[test]
    fn test_exact_multiple_keeps_end_on_last_row() {
        let layout = WrapLayout::new(4, 10.0);
        let doc = Document::from_text("abcdefgh");
        assert_eq!(layout.project(&doc, 8), 10.0);
        assert_eq!(layout.rows(&doc).len(), 2);
    }

    #[test]
    fn test_placeholder_takes_its_height() {
        let layout = WrapLayout::new(80, 20.0);
        let doc = with_placeholder("one\ntwo\nthree", 0, 8, 40.0);
        // [P][three]
        assert_eq!(layout.project(&doc, 0), 0.0);
        assert_eq!(layout.project_bottom(&doc, 0), 40.0);
        assert_eq!(layout.project(&doc, 1), 40.0);
        assert_eq!(layout.project_bottom(&doc, 6), 60.0);
    }

    #[test]
    fn test_rows() {
        let layout = WrapLayout::new(3, 10.0);
        let doc = with_placeholder("abcde\nxy", 6, 8, 25.0);
        // [abcde][P][""]
        let rows = layout.rows(&doc);
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[1],
            Row {
                top: 10.0,
                height: 10.0,
                kind: RowKind::Text {
                    range: 3..6,
                    text: "de".to_string()
                }
            }
        );
        assert_eq!(
            rows[2].kind,
            RowKind::Placeholder {
                at: 6,
                id: PlaceholderId(7)
            }
        );
        assert_eq!(rows[3].top, 45.0);
        for row in &rows {
            if let RowKind::Text { range, .. } = &row.kind {
                assert!(range.clone().all(|p| layout.project(&doc, p) == row.top));
            }
        }
    }
}
