//! Placeholder Resolver: flattens an object graph into a `FieldMap`.
//!
//! Types opt in by implementing `FieldSource`, an explicit table of
//! `(name, accessor result)` pairs. Nested objects are walked depth-first and their
//! leaves stored under dotted paths (`Staff.Grade`).
//!
//! # Rules
//! - An object already visited in this walk is skipped, so graphs with
//!   back-references terminate. Identity is the address plus the vtable: a struct and
//!   its first field share an address but are different objects.
//! - A field whose accessor fails is logged and left out; the walk continues.
//! - Lists are kept as lists and joined with `", "` when rendered.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, warn};

use crate::placeholder::field_map::{FieldMap, FieldText};

/// Failure to read a single field.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct FieldError(pub String);

/// A field value as exposed by its owner.
pub enum FieldValue<'a> {
    Text(String),
    List(Vec<String>),
    Object(&'a dyn FieldSource),
    /// Absent optional value; rendered as an empty string.
    Empty,
}

impl<'a> FieldValue<'a> {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn optional(value: Option<impl Into<String>>) -> Self {
        value.map_or(FieldValue::Empty, |v| FieldValue::Text(v.into()))
    }
}

pub type FieldAccess<'a> = Result<FieldValue<'a>, FieldError>;

/// Explicit field registration for a data type.
pub trait FieldSource {
    /// Every readable named field of `self`. Order is irrelevant to callers.
    fn fields(&self) -> Vec<(&'static str, FieldAccess<'_>)>;
}

impl FieldMap {
    /// Flattens `root` with top-level field names as paths (`FirstName`, `Staff.Grade`).
    pub fn resolve(root: &dyn FieldSource) -> FieldMap {
        Self::resolve_prefixed(root, "")
    }

    /// Flattens `root` under `prefix` (`Education.Title` for prefix `Education`).
    pub fn resolve_prefixed(root: &dyn FieldSource, prefix: &str) -> FieldMap {
        let mut map = FieldMap::new();
        let mut visited = HashSet::new();
        fill(root, prefix, &mut map, &mut visited);
        debug!(fields = map.len(), prefix, "Resolved field map");
        map
    }
}

/// Wide pointer to a visited object; hashes and compares address and vtable.
type Identity<'a> = *const (dyn FieldSource + 'a);

fn fill<'a>(
    source: &'a dyn FieldSource,
    prefix: &str,
    map: &mut FieldMap,
    visited: &mut HashSet<Identity<'a>>,
) {
    if !visited.insert(std::ptr::from_ref(source)) {
        debug!(prefix, "Skipping already visited object");
        return;
    }

    for (name, access) in source.fields() {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };

        match access {
            Ok(FieldValue::Text(text)) => map.insert(path, FieldText::Text(text)),
            Ok(FieldValue::List(items)) => map.insert(path, FieldText::List(items)),
            Ok(FieldValue::Empty) => map.insert(path, FieldText::Text(String::new())),
            Ok(FieldValue::Object(child)) => fill(child, &path, map, visited),
            Err(e) => warn!("Error getting value of {path}: {e}"),
        }
    }
}
