//! Template Cleanup: strips leftover marker paragraphs and marker-only table rows.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Block, Cell, Container, Row};

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[[A-Za-z][A-Za-z0-9_]*(?:\.[A-Za-z][A-Za-z0-9_]*)*\]$").expect("marker pattern")
});

/// Whether `text` is a single region/table marker such as `[Educations]`.
pub fn is_marker_text(text: &str) -> bool {
    MARKER_RE.is_match(text.trim())
}

fn is_marker_block(block: &Block) -> bool {
    block.as_paragraph().is_some_and(|p| is_marker_text(&p.text()))
}

fn is_marker_row(row: &Row) -> bool {
    let texts: Vec<String> = row.cells.iter().map(Cell::text).collect();
    texts.iter().any(|t| is_marker_text(t))
        && texts.iter().all(|t| t.trim().is_empty() || is_marker_text(t))
}

/// Removes every marker-only paragraph and row, recursing into table cells.
/// Returns the number of paragraphs and rows removed; a second call returns 0.
pub fn remove_markers<C: Container + ?Sized>(container: &mut C) -> usize {
    clean_blocks(container.blocks_mut())
}

fn clean_blocks(blocks: &mut Vec<Block>) -> usize {
    let before = blocks.len();
    blocks.retain(|b| !is_marker_block(b));
    let mut removed = before - blocks.len();

    for block in blocks.iter_mut() {
        if let Block::Table(table) = block {
            let rows_before = table.rows.len();
            table.rows.retain(|r| !is_marker_row(r));
            removed += rows_before - table.rows.len();

            for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                removed += clean_blocks(&mut cell.blocks);
            }
        }
    }
    removed
}
