//! Paragraph/Table Scanner: locates marked regions and templated tables.
//!
//! A region is the run of blocks between two identical marker paragraphs:
//!
//! ```text
//! [Educations]                          <- open
//! {Education.Title} ({Education.Year})  <- content (zero or more blocks)
//! [Educations]                          <- close
//! ```
//!
//! A templated table is the first table after a `[Name]` marker paragraph.

use std::ops::Range;

use crate::document::{Block, Paragraph};
use crate::template::TemplateError;

/// Marker token for a region or table name: `[Name]`.
fn marker(name: &str) -> String {
    format!("[{name}]")
}

/// Whether `paragraph` consists of exactly the marker for `name` (surrounding whitespace ignored).
pub fn is_marker_for(paragraph: &Paragraph, name: &str) -> bool {
    paragraph.text().trim() == marker(name)
}

fn block_is_marker(block: &Block, name: &str) -> bool {
    block.as_paragraph().is_some_and(|p| is_marker_for(p, name))
}

/// Indices of the opening and closing marker blocks of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpan {
    pub open: usize,
    pub close: usize,
}

impl RegionSpan {
    /// Half-open range of the content blocks, markers excluded.
    pub fn content(&self) -> Range<usize> {
        self.open + 1..self.close
    }

    /// Half-open range covering both markers and the content.
    pub fn whole(&self) -> Range<usize> {
        self.open..self.close + 1
    }
}

/// Finds the first `[name]` … `[name]` region in `blocks`.
///
/// Returns `Ok(None)` when the opening marker is absent and
/// `Err(UnclosedRegion)` when no closing marker follows it.
pub fn find_region(blocks: &[Block], name: &str) -> Result<Option<RegionSpan>, TemplateError> {
    let Some(open) = blocks.iter().position(|b| block_is_marker(b, name)) else {
        return Ok(None);
    };

    let mut close = open + 1;
    while close < blocks.len() {
        if block_is_marker(&blocks[close], name) {
            return Ok(Some(RegionSpan { open, close }));
        }
        close += 1;
    }

    Err(TemplateError::UnclosedRegion {
        name: name.to_string(),
    })
}

/// A `[name]` marker paragraph and the table it introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkedTable {
    pub marker: usize,
    pub table: usize,
}

/// Finds the `[name]` marker and the first table block after it.
pub fn find_marked_table(blocks: &[Block], name: &str) -> Option<MarkedTable> {
    let marker = blocks.iter().position(|b| block_is_marker(b, name))?;
    let table = blocks[marker + 1..]
        .iter()
        .position(|b| matches!(b, Block::Table(_)))?;
    Some(MarkedTable {
        marker,
        table: marker + 1 + table,
    })
}
