//! Block Replicator: expands a `[Name]` … `[Name]` region once per collection item.
//!
//! # Contract
//! - N = 0: the region, its markers, and every top-level paragraph whose text equals the
//!   region heading (e.g. "Образование") are removed.
//! - N ≥ 1: N structural copies of the region content are spliced where the template was,
//!   in input order. Each copy is filled from its own item field map; run formatting and
//!   paragraph properties come along with the clone.
//! - With `drop_empty`, label paragraphs and table rows whose item fields are all blank
//!   are left out of that item's copy.
//! - The unfilled template blocks and both markers never survive.

use tracing::{debug, warn};

use crate::document::{Block, Container};
use crate::placeholder::{Dialect, FieldMap};
use crate::template::scanner::find_region;
use crate::template::substitute::fill_item;
use crate::template::TemplateError;

/// Which region to expand and how its items are addressed.
#[derive(Debug, Clone, Copy)]
pub struct RegionSpec<'a> {
    /// Marker name without brackets: `Educations`.
    pub name: &'a str,
    /// Placeholder prefix of item fields: `Education` for `{Education.Title}`.
    pub item_prefix: &'a str,
    /// Section heading removed together with an empty region.
    pub heading: Option<&'a str>,
    pub drop_empty: bool,
}

/// Outcome of one replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replication {
    /// Region expanded into `copies` copies (zero when the collection was empty).
    Expanded { copies: usize, headings_removed: usize },
    /// The opening marker was not found; nothing changed.
    MarkerMissing,
}

/// Expands the region described by `spec` once per entry of `items`.
pub fn replicate_region<C: Container + ?Sized>(
    container: &mut C,
    spec: RegionSpec<'_>,
    items: &[FieldMap],
    dialect: Dialect,
) -> Result<Replication, TemplateError> {
    let blocks = container.blocks_mut();

    let Some(span) = find_region(blocks, spec.name)? else {
        warn!(region = spec.name, "Region marker not found in template; skipping");
        return Ok(Replication::MarkerMissing);
    };

    let template: Vec<Block> = blocks[span.content()].to_vec();

    let mut copies: Vec<Block> = Vec::with_capacity(template.len() * items.len());
    for item in items {
        let mut copy = template.clone();
        fill_item(&mut copy, item, dialect, spec.item_prefix, spec.drop_empty);
        copies.extend(copy);
    }

    blocks.splice(span.whole(), copies);

    let headings_removed = match (items.is_empty(), spec.heading) {
        (true, Some(heading)) => remove_headings(blocks, heading),
        _ => 0,
    };

    debug!(
        region = spec.name,
        items = items.len(),
        template_blocks = template.len(),
        headings_removed,
        "Replicated region"
    );

    Ok(Replication::Expanded {
        copies: items.len(),
        headings_removed,
    })
}

fn remove_headings(blocks: &mut Vec<Block>, heading: &str) -> usize {
    let before = blocks.len();
    blocks.retain(|b| !b.as_paragraph().is_some_and(|p| p.text().trim() == heading.trim()));
    before - blocks.len()
}
