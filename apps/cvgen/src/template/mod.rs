// Template engine: region scanning, block replication, placeholder substitution,
// table row cloning and marker cleanup. Everything here is synchronous and edits
// one exclusively owned document; no I/O happens in this module.

pub mod cleanup;
pub mod replicator;
pub mod scanner;
pub mod substitute;
pub mod table;

use thiserror::Error;

pub use cleanup::remove_markers;
pub use replicator::{replicate_region, RegionSpec, Replication};
pub use substitute::{collapse_empty_section, replace_literal, substitute_container};
pub use table::{fill_table, TableSpec};

/// Template-authoring defects detected while filling a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("region [{name}] has an opening marker but no closing [{name}] marker")]
    UnclosedRegion { name: String },

    #[error("no table follows the [{name}] marker")]
    MissingTable { name: String },
}
