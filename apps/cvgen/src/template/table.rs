//! Table substitution: clones a single style-template row once per group.
//!
//! The template table sits after a `[Name]` marker and carries exactly one style row,
//! e.g. `{Category.Name} | {Category.Tools}`. For each group the style row is cloned
//! (cell paragraphs keep their formatting), filled, and appended. The style row, the
//! marker paragraph and a `{Name}` placeholder paragraph between marker and table are
//! removed afterwards. A table left without rows is removed.

use tracing::{debug, warn};

use crate::document::{Block, Container};
use crate::placeholder::{Dialect, FieldMap, PlaceholderToken};
use crate::template::scanner::find_marked_table;
use crate::template::substitute::fill_item_rows;
use crate::template::TemplateError;

/// Which table to fill and how its rows address their items.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec<'a> {
    /// Marker name without brackets: `Stacks.Table`.
    pub marker: &'a str,
    /// Placeholder prefix of row fields: `Category` for `{Category.Name}`.
    pub item_prefix: &'a str,
    /// Leave out rows whose item fields are all blank.
    pub drop_empty: bool,
}

/// Fills the table introduced by `[marker]`. Returns the number of rows appended.
pub fn fill_table<C: Container + ?Sized>(
    container: &mut C,
    spec: TableSpec<'_>,
    rows: &[FieldMap],
    dialect: Dialect,
) -> Result<usize, TemplateError> {
    let marker = spec.marker;
    let blocks = container.blocks_mut();

    let Some(found) = find_marked_table(blocks, marker) else {
        return Err(TemplateError::MissingTable {
            name: marker.to_string(),
        });
    };

    let placeholder = PlaceholderToken::new(marker).render(dialect);
    let stale: Vec<usize> = (found.marker + 1..found.table)
        .filter(|&i| {
            blocks[i]
                .as_paragraph()
                .is_some_and(|p| p.text().trim() == placeholder)
        })
        .collect();

    let mut appended = 0;
    let keep_table = match &mut blocks[found.table] {
        Block::Table(table) => {
            if table.rows.is_empty() {
                warn!(marker, "Templated table has no style row; skipping");
                return Ok(0);
            }

            let style_row = table.rows.remove(0);
            for fields in rows {
                let mut filled = vec![style_row.clone()];
                fill_item_rows(&mut filled, fields, dialect, spec.item_prefix, spec.drop_empty);
                appended += filled.len();
                table.rows.extend(filled);
            }
            !table.rows.is_empty()
        }
        Block::Paragraph(_) => return Ok(0),
    };

    if !keep_table {
        blocks.remove(found.table);
    }
    for i in stale.into_iter().rev() {
        blocks.remove(i);
    }
    blocks.remove(found.marker);

    debug!(marker, groups = rows.len(), appended, "Filled templated table");
    Ok(appended)
}
