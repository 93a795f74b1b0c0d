//! DOCX encoding: maps `docx-rs` packages to the document tree and back.
//!
//! Reading keeps the parsed package next to the editable body. Styles, numbering,
//! headers, footers and section settings live in the package and are written back
//! untouched; only the body is rebuilt from the (filled) tree.
//!
//! Property values are read through `docx-rs`' serde output, so an attribute the
//! tree does not model is dropped rather than rejected.

use std::io::Cursor;

use docx_rs::{
    read_docx, AlignmentType, BreakType, DocumentChild, Docx, LineSpacing, ParagraphChild,
    RunChild, RunFonts, TableCellContent, TableChild, TableRowChild,
};
use serde_json::Value;
use tracing::debug;

use crate::document::model::{
    Alignment, Block, Cell, Direction, Document, Paragraph, ParagraphProperties, Row, Run,
    RunFormatting, Table,
};
use crate::errors::AppError;

/// MIME type of generated documents.
pub const CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// File extension of generated documents, without the dot.
pub const FILE_EXTENSION: &str = "docx";

const TWIPS_PER_POINT: f32 = 20.0;

/// A parsed template: the editable body plus the package it was read from.
pub struct Template {
    pub document: Document,
    package: Docx,
}

impl Template {
    /// Wraps a body in a fresh package with default styles.
    #[cfg(test)]
    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            package: Docx::new(),
        }
    }

    /// Writes the current body into the package and zips it.
    pub fn to_bytes(self) -> Result<Vec<u8>, AppError> {
        let Template {
            document,
            mut package,
        } = self;

        let mut body = std::mem::replace(&mut package.document, docx_rs::Document::new());
        body.children.clear();
        for block in &document.body {
            body = match block {
                Block::Paragraph(p) => body.add_paragraph(write_paragraph(p)),
                Block::Table(t) => body.add_table(write_table(t)),
            };
        }
        package.document = body;

        let mut cursor = Cursor::new(Vec::new());
        package
            .build()
            .pack(&mut cursor)
            .map_err(|e| AppError::Document(format!("docx-rs pack error: {e:?}")))?;
        Ok(cursor.into_inner())
    }
}

/// Parses a `.docx` package.
pub fn from_bytes(bytes: &[u8]) -> Result<Template, AppError> {
    let package =
        read_docx(bytes).map_err(|e| AppError::Document(format!("docx-rs parse error: {e:?}")))?;

    let mut body = Vec::with_capacity(package.document.children.len());
    let mut skipped = 0usize;
    for child in &package.document.children {
        match child {
            DocumentChild::Paragraph(p) => body.push(Block::Paragraph(read_paragraph(p))),
            DocumentChild::Table(t) => body.push(Block::Table(read_table(t))),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, "Body elements without a tree counterpart were dropped");
    }

    Ok(Template {
        document: Document::new(body),
        package,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// docx-rs → tree
// ────────────────────────────────────────────────────────────────────────────

fn read_paragraph(paragraph: &docx_rs::Paragraph) -> Paragraph {
    let runs = paragraph
        .children
        .iter()
        .filter_map(|child| match child {
            ParagraphChild::Run(run) => Some(read_run(run)),
            _ => None,
        })
        .collect();

    Paragraph {
        properties: read_paragraph_properties(&paragraph.property),
        runs,
    }
}

fn read_run(run: &docx_rs::Run) -> Run {
    let mut text = String::new();
    for child in &run.children {
        match child {
            RunChild::Text(t) => text.push_str(&unescape(&t.text)),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }

    Run {
        text,
        formatting: read_run_formatting(&run.run_property),
    }
}

fn read_run_formatting(property: &docx_rs::RunProperty) -> RunFormatting {
    let Ok(value) = serde_json::to_value(property) else {
        return RunFormatting::default();
    };

    RunFormatting {
        font_family: value
            .pointer("/fonts/ascii")
            .and_then(Value::as_str)
            .map(str::to_string),
        size_pt: number(&value, "sz").map(|half_points| half_points as f32 / 2.0),
        bold: flag(&value, "bold"),
        italic: flag(&value, "italic"),
        underline: string(&value, "underline").is_some_and(|u| u != "none"),
        color: string(&value, "color")
            .filter(|c| !c.eq_ignore_ascii_case("auto"))
            .map(str::to_string),
    }
}

fn read_paragraph_properties(property: &docx_rs::ParagraphProperty) -> ParagraphProperties {
    let Ok(value) = serde_json::to_value(property) else {
        return ParagraphProperties::default();
    };

    let alignment = match string(&value, "alignment") {
        Some("center") => Alignment::Center,
        Some("right" | "end") => Alignment::Right,
        Some("both" | "justified" | "distribute") => Alignment::Both,
        _ => Alignment::Left,
    };
    let points = |pointer: &str| {
        value
            .pointer(pointer)
            .and_then(Value::as_f64)
            .map_or(0.0, |twips| twips as f32 / TWIPS_PER_POINT)
    };

    ParagraphProperties {
        style_id: string(&value, "style").map(str::to_string),
        alignment,
        indentation_before: points("/indent/start"),
        indentation_after: points("/indent/end"),
        line_spacing: points("/lineSpacing/line"),
        line_spacing_before: points("/lineSpacing/before"),
        line_spacing_after: points("/lineSpacing/after"),
        direction: if flag(&value, "bidi") {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        },
    }
}

// Row and cell child enums have a single variant in current docx-rs releases.
#[allow(irrefutable_let_patterns)]
fn read_table(table: &docx_rs::Table) -> Table {
    let mut rows = Vec::with_capacity(table.rows.len());
    for child in &table.rows {
        let TableChild::TableRow(row) = child else {
            continue;
        };
        let mut cells = Vec::with_capacity(row.cells.len());
        for child in &row.cells {
            if let TableRowChild::TableCell(cell) = child {
                cells.push(read_cell(cell));
            }
        }
        rows.push(Row { cells });
    }

    let style_id = serde_json::to_value(&table.property)
        .ok()
        .and_then(|v| string(&v, "style").map(str::to_string));

    Table {
        style_id,
        column_widths: table
            .grid
            .iter()
            .map(|twips| *twips as f32 / TWIPS_PER_POINT)
            .collect(),
        rows,
    }
}

fn read_cell(cell: &docx_rs::TableCell) -> Cell {
    let blocks = cell
        .children
        .iter()
        .filter_map(|content| match content {
            TableCellContent::Paragraph(p) => Some(Block::Paragraph(read_paragraph(p))),
            TableCellContent::Table(t) => Some(Block::Table(read_table(t))),
            _ => None,
        })
        .collect();
    Cell { blocks }
}

/// Boolean toggles serialize either bare or as `{ "val": bool }`.
fn flag(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Object(o)) => o.get("val").and_then(Value::as_bool).unwrap_or(true),
        _ => false,
    }
}

fn number(value: &Value, key: &str) -> Option<f64> {
    let v = value.get(key)?;
    v.as_f64().or_else(|| v.get("val").and_then(Value::as_f64))
}

fn string<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    let v = value.get(key)?;
    v.as_str().or_else(|| v.get("val").and_then(Value::as_str))
}

fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// ────────────────────────────────────────────────────────────────────────────
// tree → docx-rs
// ────────────────────────────────────────────────────────────────────────────

fn twips(points: f32) -> i32 {
    (points * TWIPS_PER_POINT).round() as i32
}

fn write_paragraph(paragraph: &Paragraph) -> docx_rs::Paragraph {
    let props = &paragraph.properties;
    let mut out = docx_rs::Paragraph::new();

    for run in &paragraph.runs {
        out = out.add_run(write_run(run));
    }
    if let Some(style) = &props.style_id {
        out = out.style(style);
    }

    out = out.align(match props.alignment {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::Right => AlignmentType::Right,
        Alignment::Both => AlignmentType::Both,
    });

    if props.indentation_before != 0.0 || props.indentation_after != 0.0 {
        out = out.indent(
            Some(twips(props.indentation_before)),
            None,
            Some(twips(props.indentation_after)),
            None,
        );
    }

    if props.line_spacing != 0.0 || props.line_spacing_before != 0.0 || props.line_spacing_after != 0.0 {
        let mut spacing = LineSpacing::new()
            .before(twips(props.line_spacing_before).max(0) as _)
            .after(twips(props.line_spacing_after).max(0) as _);
        if props.line_spacing != 0.0 {
            spacing = spacing.line(twips(props.line_spacing) as _);
        }
        out = out.line_spacing(spacing);
    }
    out
}

fn write_run(run: &Run) -> docx_rs::Run {
    let mut out = docx_rs::Run::new();

    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            out = out.add_break(BreakType::TextWrapping);
        }
        for (j, piece) in line.split('\t').enumerate() {
            if j > 0 {
                out = out.add_tab();
            }
            if !piece.is_empty() {
                out = out.add_text(piece);
            }
        }
    }

    let f = &run.formatting;
    if f.bold {
        out = out.bold();
    }
    if f.italic {
        out = out.italic();
    }
    if f.underline {
        out = out.underline("single");
    }
    if let Some(size) = f.size_pt {
        out = out.size((size * 2.0).round() as usize);
    }
    if let Some(color) = &f.color {
        out = out.color(color.as_str());
    }
    if let Some(font) = &f.font_family {
        out = out.fonts(
            RunFonts::new()
                .ascii(font.as_str())
                .hi_ansi(font.as_str())
                .cs(font.as_str())
                .east_asia(font.as_str()),
        );
    }
    out
}

fn write_table(table: &Table) -> docx_rs::Table {
    let rows = table
        .rows
        .iter()
        .map(|row| docx_rs::TableRow::new(row.cells.iter().map(write_cell).collect()))
        .collect();

    let mut out = docx_rs::Table::new(rows);
    if !table.column_widths.is_empty() {
        out = out.set_grid(
            table
                .column_widths
                .iter()
                .map(|w| twips(*w).max(0) as usize)
                .collect(),
        );
    }
    if let Some(style) = &table.style_id {
        out = out.style(style.as_str());
    }
    out
}

fn write_cell(cell: &Cell) -> docx_rs::TableCell {
    let mut out = docx_rs::TableCell::new();
    // Word rejects cells without a paragraph.
    if cell.blocks.is_empty() {
        return out.add_paragraph(docx_rs::Paragraph::new());
    }
    for block in &cell.blocks {
        out = match block {
            Block::Paragraph(p) => out.add_paragraph(write_paragraph(p)),
            Block::Table(t) => out.add_table(write_table(t)),
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(document: Document) -> Document {
        let bytes = Template::from_document(document).to_bytes().unwrap();
        from_bytes(&bytes).unwrap().document
    }

    #[test]
    fn test_round_trip_keeps_text_and_structure() {
        let mut table = Table::from_text_rows(&[&["{Category.Name}", "{Category.Tools}"]]);
        table.column_widths = vec![150.0, 300.0];
        let doc = Document::new(vec![
            Block::Paragraph(Paragraph::from_text("{LastName} {FirstName}")),
            Block::Paragraph(Paragraph::from_text("[Stacks.Table]")),
            Block::Table(table),
            Block::Paragraph(Paragraph::from_text("Задачи:\n• Rust\tGo")),
        ]);

        let decoded = round_trip(doc);

        assert_eq!(
            decoded.lines(),
            vec![
                "{LastName} {FirstName}",
                "[Stacks.Table]",
                "{Category.Name}\t{Category.Tools}",
                "Задачи:\n• Rust\tGo",
            ]
        );
        let Block::Table(table) = &decoded.body[2] else {
            panic!("expected table");
        };
        assert_eq!(table.column_widths, vec![150.0, 300.0]);
    }

    #[test]
    fn test_round_trip_keeps_run_formatting() {
        let doc = Document::new(vec![Block::Paragraph(Paragraph::with_runs(vec![
            Run::formatted(
                "Title",
                RunFormatting {
                    bold: true,
                    size_pt: Some(14.0),
                    ..RunFormatting::default()
                },
            ),
            Run::new(" & body"),
        ]))]);

        let decoded = round_trip(doc);

        let p = decoded.body[0].as_paragraph().unwrap();
        assert_eq!(p.text(), "Title & body");
        assert!(p.runs[0].formatting.bold);
        assert_eq!(p.runs[0].formatting.size_pt, Some(14.0));
        assert!(!p.runs[1].formatting.bold);
    }

    #[test]
    fn test_empty_cell_survives_encoding() {
        let mut table = Table::from_text_rows(&[&["a", "b"]]);
        table.rows[0].cells[1].blocks.clear();
        let decoded = round_trip(Document::new(vec![Block::Table(table)]));
        assert_eq!(decoded.lines(), vec!["a\t"]);
    }

    #[test]
    fn test_garbage_is_a_document_error() {
        let err = from_bytes(b"not a document").err().unwrap();
        assert!(matches!(err, AppError::Document(_)));
    }
}
