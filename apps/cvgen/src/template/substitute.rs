//! Text Substitution Engine: fills scalar placeholders from a `FieldMap`.
//!
//! # Dialect rules
//! - `<<Path>>`: replaced with the value, even when empty.
//! - `{Path}`: replaced with the value; an empty or whitespace-only value removes the token.
//! - `{Path[i]}`: replaced with the i-th character, or removed when out of range or empty.
//! - Unknown paths are never an error: the token stays as literal text, unless the
//!   caller asked to drop unresolved tokens under an item prefix (replicated regions).
//!
//! Item copies (region blocks, table rows) go through `fill_item`, which can also drop
//! label paragraphs and rows whose item fields all came out blank.

use std::ops::AddAssign;

use crate::document::{Block, Container, Paragraph, Row};
use crate::placeholder::{Dialect, FieldMap, PlaceholderToken};

/// Resolves one token against `fields` using `dialect` rules. `None` means "miss".
pub fn resolve_token(token: &PlaceholderToken, fields: &FieldMap, dialect: Dialect) -> Option<String> {
    let value = fields.lookup(&token.path)?;
    let resolved = match (dialect, token.index) {
        (Dialect::Angle, _) => value.into_owned(),
        (Dialect::Brace, None) if value.trim().is_empty() => String::new(),
        (Dialect::Brace, None) => value.into_owned(),
        (Dialect::Brace, Some(i)) => value.chars().nth(i).map(String::from).unwrap_or_default(),
    };
    Some(resolved)
}

/// Substitutes every placeholder of `dialect` in one paragraph. Misses stay literal.
/// Returns the replacement count.
pub fn substitute_paragraph(paragraph: &mut Paragraph, fields: &FieldMap, dialect: Dialect) -> usize {
    paragraph.replace_matches(dialect.pattern(), |caps| {
        let token = PlaceholderToken::from_captures(caps)?;
        resolve_token(&token, fields, dialect)
    })
}

/// Item-field tally of one filled paragraph, row or block list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFill {
    /// Placeholders under the item prefix.
    pub tokens: usize,
    /// Those that resolved to non-blank text.
    pub filled: usize,
}

impl ItemFill {
    /// Referenced item fields, none of which had a value.
    pub fn is_blank(&self) -> bool {
        self.tokens > 0 && self.filled == 0
    }
}

impl AddAssign for ItemFill {
    fn add_assign(&mut self, other: Self) {
        self.tokens += other.tokens;
        self.filled += other.filled;
    }
}

fn fill_item_paragraph(paragraph: &mut Paragraph, fields: &FieldMap, dialect: Dialect, prefix: &str) -> ItemFill {
    let mut fill = ItemFill::default();
    paragraph.replace_matches(dialect.pattern(), |caps| {
        let token = PlaceholderToken::from_captures(caps)?;
        let under = token.is_under(prefix);
        let value = resolve_token(&token, fields, dialect);
        if under {
            fill.tokens += 1;
            if value.as_deref().is_some_and(|v| !v.trim().is_empty()) {
                fill.filled += 1;
            }
        }
        match value {
            None if under => Some(String::new()),
            other => other,
        }
    });
    fill
}

/// Fills one item copy. Tokens under `prefix` that do not resolve are removed.
/// With `drop_empty`, paragraphs and table rows that reference item fields only
/// to find them all blank are removed, and so is a table left without rows.
pub fn fill_item(
    blocks: &mut Vec<Block>,
    fields: &FieldMap,
    dialect: Dialect,
    prefix: &str,
    drop_empty: bool,
) -> ItemFill {
    let mut total = ItemFill::default();
    blocks.retain_mut(|block| {
        let (fill, emptied) = match block {
            Block::Paragraph(p) => (fill_item_paragraph(p, fields, dialect, prefix), false),
            Block::Table(t) => {
                let fill = fill_item_rows(&mut t.rows, fields, dialect, prefix, drop_empty);
                (fill, t.rows.is_empty())
            }
        };
        total += fill;
        !(drop_empty && (fill.is_blank() || emptied))
    });
    total
}

/// Row-wise `fill_item`: a row is judged by the item fields of all its cells.
pub fn fill_item_rows(
    rows: &mut Vec<Row>,
    fields: &FieldMap,
    dialect: Dialect,
    prefix: &str,
    drop_empty: bool,
) -> ItemFill {
    let mut total = ItemFill::default();
    rows.retain_mut(|row| {
        let mut fill = ItemFill::default();
        for cell in row.cells.iter_mut() {
            fill += fill_item(&mut cell.blocks, fields, dialect, prefix, drop_empty);
        }
        total += fill;
        !(drop_empty && fill.is_blank())
    });
    total
}

/// Substitutes placeholders throughout a container; misses are left untouched.
pub fn substitute_container<C: Container + ?Sized>(
    container: &mut C,
    fields: &FieldMap,
    dialect: Dialect,
) -> usize {
    container
        .paragraphs_mut()
        .map(|p| substitute_paragraph(p, fields, dialect))
        .sum()
}

/// Replaces a literal string everywhere in the container.
pub fn replace_literal<C: Container + ?Sized>(container: &mut C, search: &str, replacement: &str) -> usize {
    container
        .paragraphs_mut()
        .map(|p| p.replace_text(search, replacement))
        .sum()
}

/// Removes an empty section: a paragraph whose trimmed text equals `label`
/// (case-insensitive) immediately followed by a paragraph that is blank or
/// holds nothing but `list_placeholder`. Only the first such pair is removed.
pub fn collapse_empty_section<C: Container + ?Sized>(
    container: &mut C,
    label: &str,
    list_placeholder: Option<&str>,
) -> bool {
    let label = label.trim().to_lowercase();
    let blocks = container.blocks_mut();

    let is_empty_body = |block: &Block| {
        block.as_paragraph().is_some_and(|p| {
            p.is_blank() || list_placeholder.is_some_and(|ph| p.text().trim() == ph)
        })
    };

    let found = blocks.windows(2).position(|pair| {
        pair[0]
            .as_paragraph()
            .is_some_and(|p| p.text().trim().to_lowercase() == label)
            && is_empty_body(&pair[1])
    });

    match found {
        Some(i) => {
            blocks.drain(i..i + 2);
            true
        }
        None => false,
    }
}
