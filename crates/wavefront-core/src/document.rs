//! The document: an ordered sequence of nodes addressed by a linear offset.
//!
//! Mutations go through [`Document::apply`], which replaces a contiguous
//! range atomically and returns the [`PositionMap`] for that replacement.
//! The document owns the selection and carries it through every map it
//! produces, so a host never has to remap the cursor by hand.

use std::fmt;

use tracing::trace;

use crate::error::EditError;
use crate::node::{Edit, Marks, Node, Piece, Placeholder, PlaceholderId, TextBlock, Unit};
use crate::position_map::{Assoc, PositionMap};
use crate::types::{Position, Selection};

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
    selection: Selection,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding one empty text block.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::TextBlock(TextBlock::new())],
            selection: Selection::collapsed(0),
        }
    }

    /// One text block per line of `text`. The cursor is placed at the end of
    /// the last block.
    pub fn from_text(text: &str) -> Self {
        let nodes: Vec<Node> = text
            .split('\n')
            .map(|line| Node::TextBlock(TextBlock::plain(line)))
            .collect();
        let mut doc = Self {
            nodes,
            selection: Selection::default(),
        };
        doc.selection = Selection::collapsed(doc.cursor_limit());
        doc
    }

    /// Total number of offset units. Valid positions are `0..=size()`.
    pub fn size(&self) -> usize {
        self.nodes.iter().map(Node::size).sum()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Start offset of every node, in order.
    pub fn node_starts(&self) -> Vec<Position> {
        self.iter().map(|(start, _)| start).collect()
    }

    /// Nodes paired with their start offsets.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Node)> + '_ {
        self.nodes.iter().scan(0, |start, node| {
            let at = *start;
            *start += node.size();
            Some((at, node))
        })
    }

    /// Node owning `pos`, with its start offset. The document end belongs to
    /// the last node.
    pub fn node_containing(&self, pos: Position) -> (Position, &Node) {
        let (index, start) = self.node_at(pos);
        (start, &self.nodes[index])
    }

    /// First node matching `predicate`, with its start offset.
    pub fn find_first<F>(&self, mut predicate: F) -> Option<(Position, &Node)>
    where
        F: FnMut(&Node) -> bool,
    {
        self.iter().find(|(_, node)| predicate(node))
    }

    /// Locate a placeholder by identity.
    pub fn find_placeholder(&self, id: PlaceholderId) -> Option<(Position, &Placeholder)> {
        self.iter().find_map(|(start, node)| match node {
            Node::Placeholder(p) if p.id == id => Some((start, p)),
            _ => None,
        })
    }

    pub fn placeholders(&self) -> impl Iterator<Item = (Position, &Placeholder)> + '_ {
        self.iter()
            .filter_map(|(start, node)| node.as_placeholder().map(|p| (start, p)))
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Set the selection, clamped into the document.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamped(self.cursor_limit());
    }

    /// Last position a cursor may occupy: the end of the final block's
    /// content, or the document end when it finishes on a placeholder.
    pub fn cursor_limit(&self) -> Position {
        match self.nodes.last() {
            Some(Node::TextBlock(_)) => self.size() - 1,
            _ => self.size(),
        }
    }

    /// Plain text view: blocks joined with `'\n'`, placeholders showing the
    /// text they stand in for. An empty block closing the document is the
    /// spot the cursor types into, not content, and is left out.
    pub fn text(&self) -> String {
        let nodes = match self.nodes.split_last() {
            Some((Node::TextBlock(last), rest)) if last.is_empty() && !rest.is_empty() => rest,
            _ => &self.nodes[..],
        };
        nodes
            .iter()
            .map(Node::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// No placeholders and nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.nodes.iter().all(|node| match node {
            Node::TextBlock(block) => block.chars().all(|(c, _)| c.is_whitespace()),
            Node::Placeholder(_) => false,
        })
    }

    /// Text of `start..end`, with every block boundary rendered as
    /// `line_break`. Placeholders contribute nothing.
    pub fn text_between(&self, start: Position, end: Position, line_break: &str) -> String {
        let end = end.min(self.size());
        let mut out = String::new();
        if start >= end {
            return out;
        }
        for (node_start, node) in self.iter() {
            if node_start + node.size() <= start {
                continue;
            }
            if node_start >= end {
                break;
            }
            let Node::TextBlock(block) = node else {
                continue;
            };
            let in_range = |pos: Position| pos >= start && pos < end;
            for (k, (c, _)) in block.chars().enumerate() {
                if in_range(node_start + k) {
                    out.push(c);
                }
            }
            if in_range(node_start + block.len_chars()) {
                out.push_str(line_break);
            }
        }
        out
    }

    /// Apply an edit atomically and return its position map.
    ///
    /// Structural fix-ups are folded into the replaced range, so the returned
    /// map is exact:
    /// - a placeholder always starts a block (a boundary is inserted before
    ///   it when it would land mid-block),
    /// - text directly before a placeholder or the document end is closed
    ///   with a boundary,
    /// - deleting everything leaves one empty block.
    pub fn apply(&mut self, edit: Edit) -> Result<PositionMap, EditError> {
        let size = self.size();
        if edit.from > edit.to {
            return Err(EditError::InvertedRange {
                start: edit.from,
                end: edit.to,
            });
        }
        if edit.to > size {
            return Err(EditError::OutOfBounds {
                start: edit.from,
                end: edit.to,
                size,
            });
        }

        let (first, span_start) = self.node_at(edit.from);
        let (last, _) = self.node_at(edit.to);
        let units = flatten(&self.nodes[first..=last]);
        let (before, rest) = units.split_at(edit.from - span_start);
        let after = &rest[edit.to - edit.from..];

        let mut inserted = build_units(edit.pieces, before.last(), after.first());
        let covers_document = first == 0 && last + 1 == self.nodes.len();
        if covers_document && before.is_empty() && after.is_empty() && inserted.is_empty() {
            inserted.push(Unit::Break);
        }

        let map = PositionMap::single(edit.from, edit.to - edit.from, inserted.len());
        let rebuilt = parse(
            before
                .iter()
                .cloned()
                .chain(inserted)
                .chain(after.iter().cloned()),
        );
        trace!(
            from = edit.from,
            to = edit.to,
            replaced_nodes = last + 1 - first,
            new_nodes = rebuilt.len(),
            "applied edit"
        );
        self.nodes.splice(first..=last, rebuilt);

        self.selection = Selection::new(
            map.map(self.selection.anchor, Assoc::After),
            map.map(self.selection.head, Assoc::After),
        )
        .clamped(self.cursor_limit());
        Ok(map)
    }

    /// Index and start offset of the node owning `pos`. The document end
    /// belongs to the last node.
    fn node_at(&self, pos: Position) -> (usize, Position) {
        let mut start = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            let end = start + node.size();
            if pos < end || i + 1 == self.nodes.len() {
                return (i, start);
            }
            start = end;
        }
        (0, 0)
    }
}

fn flatten(nodes: &[Node]) -> Vec<Unit> {
    let mut units = Vec::new();
    for node in nodes {
        match node {
            Node::TextBlock(block) => {
                units.extend(block.chars().map(|(c, marks)| Unit::Char(c, marks)));
                units.push(Unit::Break);
            }
            Node::Placeholder(p) => units.push(Unit::Placeholder(p.clone())),
        }
    }
    units
}

/// Turn edit pieces into units, adding the boundaries a placeholder or the
/// following content requires.
fn build_units(pieces: Vec<Piece>, prev: Option<&Unit>, next: Option<&Unit>) -> Vec<Unit> {
    let mut out = Vec::new();
    let mut open = matches!(prev, Some(Unit::Char(..)));
    let mut inherited = match prev {
        Some(Unit::Char(_, marks)) => *marks,
        _ => Marks::empty(),
    };

    for piece in pieces {
        match piece {
            Piece::Text { text, marks } => {
                let marks = marks.unwrap_or(inherited);
                for c in text.chars() {
                    if c == '\n' {
                        out.push(Unit::Break);
                        open = false;
                    } else {
                        out.push(Unit::Char(c, marks));
                        open = true;
                    }
                }
                inherited = marks;
            }
            Piece::Break => {
                out.push(Unit::Break);
                open = false;
            }
            Piece::Placeholder(p) => {
                if open {
                    out.push(Unit::Break);
                }
                out.push(Unit::Placeholder(p));
                open = false;
            }
        }
    }

    if open && matches!(next, None | Some(Unit::Placeholder(_))) {
        out.push(Unit::Break);
    }
    out
}

fn parse(units: impl Iterator<Item = Unit>) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut block: Option<TextBlock> = None;
    for unit in units {
        match unit {
            Unit::Char(c, marks) => block.get_or_insert_with(TextBlock::new).push(c, marks),
            Unit::Break => nodes.push(Node::TextBlock(block.take().unwrap_or_default())),
            Unit::Placeholder(p) => {
                debug_assert!(block.is_none(), "placeholder inside an open block");
                nodes.push(Node::Placeholder(p));
            }
        }
    }
    debug_assert!(block.is_none(), "document ends inside an open block");
    nodes
}

impl fmt::Display for Document {
    /// One line per node: `¶ text` for blocks, `◌ #id "original"` for
    /// placeholders.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match node {
                Node::TextBlock(block) if block.is_empty() => write!(f, "¶")?,
                Node::TextBlock(block) => write!(f, "¶ {}", block.text())?,
                Node::Placeholder(p) => write!(f, "◌ {} {:?}", p.id, p.original)?,
            }
        }
        Ok(())
    }
}
