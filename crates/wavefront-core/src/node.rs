//! Node model: text blocks, placeholders and the edits that produce them.
//!
//! A document is a flat sequence of [`Node`]s. Every node occupies a fixed
//! number of offset units:
//!
//! - A [`TextBlock`] with `n` chars has size `n + 1`. Its content positions are
//!   `s..=s + n` and the unit at `s + n` is the boundary closing the block.
//! - A [`Placeholder`] is an atom of size 1.

use std::fmt;
use std::ops::Range;

use bitflags::bitflags;

use crate::types::{Position, VisualY};

bitflags! {
    /// Inline formatting carried by a run of text.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Marks: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const CODE = 1 << 2;
    }
}

/// Contiguous text sharing one set of marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineRun {
    pub text: String,
    pub marks: Marks,
}

/// A paragraph-like block of inline runs.
///
/// Adjacent runs never share marks; pushing text coalesces them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    runs: Vec<InlineRun>,
    len: usize,
}

impl TextBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block of unmarked text. `text` must not contain line breaks.
    pub fn plain(text: &str) -> Self {
        let mut block = Self::new();
        block.push_str(text, Marks::empty());
        block
    }

    pub fn runs(&self) -> &[InlineRun] {
        &self.runs
    }

    /// Number of chars of content.
    pub fn len_chars(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset units occupied, including the closing boundary.
    pub fn size(&self) -> usize {
        self.len + 1
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn chars(&self) -> impl Iterator<Item = (char, Marks)> + '_ {
        self.runs
            .iter()
            .flat_map(|run| run.text.chars().map(move |c| (c, run.marks)))
    }

    pub(crate) fn push(&mut self, c: char, marks: Marks) {
        match self.runs.last_mut() {
            Some(last) if last.marks == marks => last.text.push(c),
            _ => self.runs.push(InlineRun {
                text: c.to_string(),
                marks,
            }),
        }
        self.len += 1;
    }

    pub(crate) fn push_str(&mut self, text: &str, marks: Marks) {
        for c in text.chars() {
            self.push(c, marks);
        }
    }
}

/// Identity tag of a placeholder. Unique per engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderId(pub(crate) u64);

impl PlaceholderId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque node standing in for a span whose transform is outstanding.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub id: PlaceholderId,
    /// Full text extracted from the committed span.
    pub original: String,
    /// Byte range of `original` that was sent to the transformer.
    pub payload: Range<usize>,
    /// Visual height reserved for the span, fixed at commit time.
    pub height: VisualY,
}

impl Placeholder {
    /// Text that was handed to the transformer.
    pub fn payload_text(&self) -> &str {
        self.original.get(self.payload.clone()).unwrap_or_default()
    }

    /// Rebuild the span text around a transform result, keeping whatever the
    /// trim policy held back from the payload.
    pub fn splice(&self, result: &str) -> String {
        let head = self.original.get(..self.payload.start).unwrap_or_default();
        let tail = self.original.get(self.payload.end..).unwrap_or_default();
        let mut out = String::with_capacity(head.len() + result.len() + tail.len());
        out.push_str(head);
        out.push_str(result);
        out.push_str(tail);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    TextBlock(TextBlock),
    Placeholder(Placeholder),
}

impl Node {
    pub fn size(&self) -> usize {
        match self {
            Node::TextBlock(block) => block.size(),
            Node::Placeholder(_) => 1,
        }
    }

    pub fn as_text_block(&self) -> Option<&TextBlock> {
        match self {
            Node::TextBlock(block) => Some(block),
            Node::Placeholder(_) => None,
        }
    }

    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Node::Placeholder(p) => Some(p),
            Node::TextBlock(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Node::Placeholder(_))
    }

    /// Plain text of the node. A placeholder shows the text it stands in
    /// for, minus a final line break (its own block boundary stands in for
    /// that one).
    pub fn text(&self) -> String {
        match self {
            Node::TextBlock(block) => block.text(),
            Node::Placeholder(p) => p
                .original
                .strip_suffix('\n')
                .unwrap_or(&p.original)
                .to_string(),
        }
    }
}

/// One offset unit of the flattened document.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Unit {
    Char(char, Marks),
    Break,
    Placeholder(Placeholder),
}

/// Content inserted by an [`Edit`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Piece {
    /// Text where `'\n'` starts a new block. `None` marks inherit from the
    /// char before the insertion point.
    Text { text: String, marks: Option<Marks> },
    Break,
    Placeholder(Placeholder),
}

/// A replacement of `from..to` with new content.
///
/// Hosts build edits with [`Edit::insert`], [`Edit::delete`],
/// [`Edit::replace`] and [`Edit::insert_styled`]. Placeholders are only ever
/// inserted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub(crate) from: Position,
    pub(crate) to: Position,
    pub(crate) pieces: Vec<Piece>,
}

impl Edit {
    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    pub fn insert_styled(at: Position, text: impl Into<String>, marks: Marks) -> Self {
        Self {
            from: at,
            to: at,
            pieces: vec![Piece::Text {
                text: text.into(),
                marks: Some(marks),
            }],
        }
    }

    pub fn delete(from: Position, to: Position) -> Self {
        Self {
            from,
            to,
            pieces: Vec::new(),
        }
    }

    pub fn replace(from: Position, to: Position, text: impl Into<String>) -> Self {
        let text = text.into();
        let pieces = if text.is_empty() {
            Vec::new()
        } else {
            vec![Piece::Text { text, marks: None }]
        };
        Self { from, to, pieces }
    }

    /// Swap `from..to` for a placeholder atom.
    pub(crate) fn placeholder(from: Position, to: Position, placeholder: Placeholder) -> Self {
        Self {
            from,
            to,
            pieces: vec![Piece::Placeholder(placeholder)],
        }
    }

    /// Swap `from..to` for unmarked blocks of `text`. A trailing `'\n'`
    /// already closes the last block.
    pub(crate) fn block(from: Position, to: Position, text: String) -> Self {
        let closed = text.ends_with('\n');
        let mut pieces = vec![Piece::Text {
            text,
            marks: Some(Marks::empty()),
        }];
        if !closed {
            pieces.push(Piece::Break);
        }
        Self { from, to, pieces }
    }

    pub fn range(&self) -> Range<Position> {
        self.from..self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_block_coalesces_runs() {
        let mut block = TextBlock::plain("ab");
        block.push('c', Marks::empty());
        block.push('d', Marks::BOLD);
        block.push('e', Marks::BOLD);

        assert_eq!(block.runs().len(), 2);
        assert_eq!(block.runs()[0].text, "abc");
        assert_eq!(block.runs()[1].text, "de");
        assert_eq!(block.len_chars(), 5);
        assert_eq!(block.size(), 6);
        assert_eq!(block.text(), "abcde");
    }

    #[test]
    fn test_empty_block_still_occupies_its_boundary() {
        let block = TextBlock::new();
        assert!(block.is_empty());
        assert_eq!(Node::TextBlock(block).size(), 1);
    }

    #[test]
    fn test_placeholder_splice_keeps_trimmed_edges() {
        let p = Placeholder {
            id: PlaceholderId(1),
            original: "  teh cat\n".to_string(),
            payload: 2..9,
            height: 21.0,
        };
        assert_eq!(p.payload_text(), "teh cat");
        assert_eq!(p.splice("the cat"), "  the cat\n");
        assert_eq!(Node::Placeholder(p).size(), 1);
    }

    #[test]
    fn test_placeholder_text_drops_closing_break() {
        let p = Placeholder {
            id: PlaceholderId(2),
            original: "line\n".to_string(),
            payload: 0..5,
            height: 21.0,
        };
        assert_eq!(Node::Placeholder(p).text(), "line");
    }

    #[test]
    fn test_block_edit_closes_unterminated_text() {
        assert_eq!(Edit::block(0, 1, "a".to_string()).pieces.len(), 2);
        assert_eq!(Edit::block(0, 1, "a\n".to_string()).pieces.len(), 1);
    }

    #[test]
    fn test_replace_with_empty_text_is_a_delete() {
        assert_eq!(Edit::replace(2, 5, ""), Edit::delete(2, 5));
        assert_eq!(Edit::insert(3, "x").range(), 3..3);
    }
}
