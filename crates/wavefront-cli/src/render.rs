//! Plain-text view of the engine with a frontier indicator.
//!
//! Each laid-out row gets a two-column gutter:
//! - first column: `│` for rows above the frontier, `▸` for the frontier row
//! - second column: `*` for the row holding the cursor

use std::fmt::Write;

use wavefront_core::{RowKind, WavefrontEngine, WrapLayout};

pub fn render(engine: &WavefrontEngine<WrapLayout>) -> String {
    let doc = engine.document();
    let state = engine.state();
    let tolerance = engine.config().tolerance;
    let head = doc.selection().head;

    let rows = engine.layout().rows(doc);
    let frontier_row = rows
        .iter()
        .position(|row| (row.top - state.frontier_visual_y).abs() < tolerance);

    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        let edge = match frontier_row {
            Some(f) if f == i => '▸',
            _ if row.top + row.height <= state.frontier_visual_y + tolerance => '│',
            _ => ' ',
        };
        let (cursor, body) = match &row.kind {
            RowKind::Text { range, text } => {
                let here = range.contains(&head);
                (if here { '*' } else { ' ' }, text.clone())
            }
            RowKind::Placeholder { at, id } => {
                let original = doc
                    .find_placeholder(*id)
                    .map(|(_, p)| p.original.chars().count())
                    .unwrap_or_default();
                let here = *at == head;
                (
                    if here { '*' } else { ' ' },
                    format!("◌ {id} transforming {original} chars"),
                )
            }
        };
        let line = format!("{edge}{cursor} {body}");
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}
