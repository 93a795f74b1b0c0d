//! Document tree types.
//!
//! The tree mirrors what a DOCX body holds and nothing more: top-level blocks are
//! paragraphs or tables, tables hold rows of cells, and cells hold blocks again.
//! All types are plain owned data, so `Clone` is a deep structural copy.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Runs and paragraphs
// ────────────────────────────────────────────────────────────────────────────

/// Character-level formatting of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFormatting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_pt: Option<f32>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    /// Hex RGB, e.g. `"2E5395"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A span of text sharing one formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default)]
    pub formatting: RunFormatting,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            formatting: RunFormatting::default(),
        }
    }

    #[cfg(test)]
    pub fn formatted(text: impl Into<String>, formatting: RunFormatting) -> Self {
        Self {
            text: text.into(),
            formatting,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Both,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// Paragraph-level properties copied verbatim when a paragraph is cloned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    pub alignment: Alignment,
    pub indentation_before: f32,
    pub indentation_after: f32,
    pub line_spacing: f32,
    pub line_spacing_before: f32,
    pub line_spacing_after: f32,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub properties: ParagraphProperties,
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Paragraph {
    #[cfg(test)]
    /// A paragraph holding a single unformatted run.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            properties: ParagraphProperties::default(),
            runs: vec![Run::new(text)],
        }
    }

    #[cfg(test)]
    pub fn with_runs(runs: Vec<Run>) -> Self {
        Self {
            properties: ParagraphProperties::default(),
            runs,
        }
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tables
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Cell {
    #[cfg(test)]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![Block::Paragraph(Paragraph::from_text(text))],
        }
    }

    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    /// Column widths in points; empty means auto-fit.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_widths: Vec<f32>,
    pub rows: Vec<Row>,
}

impl Table {
    #[cfg(test)]
    /// Builds a table of single-paragraph cells.
    pub fn from_text_rows(rows: &[&[&str]]) -> Self {
        Self {
            style_id: None,
            column_widths: Vec::new(),
            rows: rows
                .iter()
                .map(|cells| Row {
                    cells: cells.iter().map(|text| Cell::from_text(*text)).collect(),
                })
                .collect(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Blocks, containers, document
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        }
    }

    /// Plain text; table cells are joined with tabs and rows with newlines.
    pub fn text(&self) -> String {
        match self {
            Block::Paragraph(p) => p.text(),
            Block::Table(t) => t
                .rows
                .iter()
                .map(|row| {
                    row.cells
                        .iter()
                        .map(Cell::text)
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Every paragraph inside this block, depth-first, including table cells.
    pub fn paragraphs_mut(&mut self) -> Box<dyn Iterator<Item = &mut Paragraph> + '_> {
        match self {
            Block::Paragraph(p) => Box::new(std::iter::once(p)),
            Block::Table(t) => Box::new(
                t.rows
                    .iter_mut()
                    .flat_map(|row| row.cells.iter_mut())
                    .flat_map(|cell| cell.blocks.iter_mut())
                    .flat_map(Block::paragraphs_mut),
            ),
        }
    }

    pub fn paragraphs(&self) -> Box<dyn Iterator<Item = &Paragraph> + '_> {
        match self {
            Block::Paragraph(p) => Box::new(std::iter::once(p)),
            Block::Table(t) => Box::new(
                t.rows
                    .iter()
                    .flat_map(|row| row.cells.iter())
                    .flat_map(|cell| cell.blocks.iter())
                    .flat_map(Block::paragraphs),
            ),
        }
    }
}

/// Anything that owns an ordered list of blocks: the document body or a table cell.
pub trait Container {
    fn blocks(&self) -> &[Block];
    fn blocks_mut(&mut self) -> &mut Vec<Block>;

    fn paragraphs_mut(&mut self) -> Box<dyn Iterator<Item = &mut Paragraph> + '_> {
        Box::new(self.blocks_mut().iter_mut().flat_map(Block::paragraphs_mut))
    }

    fn paragraphs(&self) -> Box<dyn Iterator<Item = &Paragraph> + '_> {
        Box::new(self.blocks().iter().flat_map(Block::paragraphs))
    }
}

impl Container for Cell {
    fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub body: Vec<Block>,
}

impl Document {
    pub fn new(body: Vec<Block>) -> Self {
        Self { body }
    }

    #[cfg(test)]
    /// One plain paragraph per line. Handy for fixtures.
    pub fn from_lines(lines: &[&str]) -> Self {
        Self {
            body: lines
                .iter()
                .map(|line| Block::Paragraph(Paragraph::from_text(*line)))
                .collect(),
        }
    }

    /// Text of every top-level block, in order.
    pub fn lines(&self) -> Vec<String> {
        self.body.iter().map(Block::text).collect()
    }
}

impl Container for Document {
    fn blocks(&self) -> &[Block] {
        &self.body
    }

    fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.body
    }
}
