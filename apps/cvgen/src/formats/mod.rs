//! Client formats: declarative descriptions of how one client's template is filled.
//!
//! Each format names its template file, the placeholder dialect the template is
//! written in, and an ordered list of steps. Bundled formats live in `layouts/`
//! at the crate root; deployments may add or override formats from a directory.

pub mod registry;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Locale;
use crate::placeholder::{Dialect, PlaceholderToken};

pub use registry::{FormatInfo, LayoutRegistry};

fn default_uncategorized_label() -> String {
    "Прочее".to_string()
}

/// One client format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateLayout {
    /// Lookup key used by `cvgen export --format`.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Template file name, relative to the templates directory.
    pub template: String,
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default)]
    pub locale: Locale,
    /// Render the recruiting system's `Неизвестно` filler as empty text.
    #[serde(default)]
    pub blank_unknown: bool,
    #[serde(default = "default_uncategorized_label")]
    pub uncategorized_label: String,
    /// Field paths (`About`, `Work.Tasks`) whose multi-line values become bullet lists.
    #[serde(default)]
    pub bullets: Vec<String>,
    pub steps: Vec<LayoutStep>,
}

/// A single fill operation. Steps run in the order listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum LayoutStep {
    /// Replaces `placeholder` with `prefix` + the value of `field`, or with nothing
    /// when the value is empty. Must precede `fields` for the same placeholder.
    Labeled {
        placeholder: String,
        prefix: String,
        field: String,
    },
    /// Substitutes every root candidate field.
    Fields,
    /// Expands a `[name]` … `[name]` region once per item.
    Region {
        name: String,
        collection: Collection,
        item_prefix: String,
        #[serde(default)]
        heading: Option<String>,
        /// Leave out label paragraphs and rows whose item fields are all blank.
        #[serde(default)]
        drop_empty: bool,
    },
    /// Clones the style row of the table after `[marker]` once per item.
    Table {
        marker: String,
        collection: Collection,
        item_prefix: String,
        #[serde(default)]
        drop_empty: bool,
    },
    /// Drops a section heading whose body turned out empty.
    CollapseSection {
        label: String,
        #[serde(default)]
        placeholder: Option<String>,
    },
    /// Removes leftover `[Name]` markers.
    Cleanup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Degrees only.
    Educations,
    /// Courses and certificates only.
    AdditionalEducations,
    AllEducations,
    Works,
    /// Works ordered by end date, ongoing projects first.
    RecentWorks,
    SkillCategories,
}

impl TemplateLayout {
    /// Rejects layouts that could never produce a sensible document.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.trim().is_empty() {
            return Err(AppError::Validation("layout id must not be empty".to_string()));
        }
        if self.template.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "layout '{}' does not name a template",
                self.id
            )));
        }
        if self.template.contains("..") || Path::new(&self.template).is_absolute() {
            return Err(AppError::Validation(format!(
                "layout '{}' template must stay inside the templates directory",
                self.id
            )));
        }

        for step in &self.steps {
            match step {
                LayoutStep::Region { item_prefix, .. } | LayoutStep::Table { item_prefix, .. }
                    if item_prefix.trim().is_empty() =>
                {
                    return Err(AppError::Validation(format!(
                        "layout '{}' has a collection step without item_prefix",
                        self.id
                    )));
                }
                LayoutStep::Labeled { placeholder, .. } => self.check_placeholder(placeholder)?,
                LayoutStep::CollapseSection {
                    placeholder: Some(placeholder),
                    ..
                } => self.check_placeholder(placeholder)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Step placeholders must be complete tokens of the layout's dialect.
    fn check_placeholder(&self, placeholder: &str) -> Result<(), AppError> {
        if PlaceholderToken::parse(placeholder.trim(), self.dialect).is_none() {
            return Err(AppError::Validation(format!(
                "layout '{}' step placeholder '{placeholder}' is not a {:?} placeholder",
                self.id, self.dialect
            )));
        }
        Ok(())
    }
}
