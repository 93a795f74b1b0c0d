use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::formats::TemplateLayout;

const BUILTIN_LAYOUTS: [(&str, &str); 7] = [
    ("mosbirja.json", include_str!("../../layouts/mosbirja.json")),
    ("bk.json", include_str!("../../layouts/bk.json")),
    ("itfb.json", include_str!("../../layouts/itfb.json")),
    ("stratosphere.json", include_str!("../../layouts/stratosphere.json")),
    ("digimatics.json", include_str!("../../layouts/digimatics.json")),
    ("godigital.json", include_str!("../../layouts/godigital.json")),
    ("sspsoft.json", include_str!("../../layouts/sspsoft.json")),
];

/// Public description of an export format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// All known formats, in registration order. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: Vec<TemplateLayout>,
}

impl LayoutRegistry {
    /// Registry holding the formats bundled with the binary.
    pub fn builtin() -> Result<Self, AppError> {
        let mut registry = Self::default();
        for (file, json) in BUILTIN_LAYOUTS {
            let layout: TemplateLayout = serde_json::from_str(json)
                .with_context(|| format!("bundled layout {file} is malformed"))?;
            registry.register(layout)?;
        }
        Ok(registry)
    }

    /// Adds or replaces a format. Replacing keeps the original position.
    pub fn register(&mut self, layout: TemplateLayout) -> Result<(), AppError> {
        layout.validate()?;
        match self.position(&layout.id) {
            Some(i) => {
                debug!(format = %layout.id, "Overriding layout");
                self.layouts[i] = layout;
            }
            None => self.layouts.push(layout),
        }
        Ok(())
    }

    /// Registers every `*.json` layout in `dir`, in file name order.
    pub async fn load_dir(&mut self, dir: &Path) -> Result<usize, AppError> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let raw = tokio::fs::read(path).await?;
            let layout: TemplateLayout = serde_json::from_slice(&raw)
                .with_context(|| format!("layout {} is malformed", path.display()))?;
            self.register(layout)?;
        }

        info!(dir = %dir.display(), loaded = paths.len(), "Loaded layouts");
        Ok(paths.len())
    }

    /// Case-insensitive lookup by format id.
    pub fn get(&self, id: &str) -> Option<&TemplateLayout> {
        self.position(id).map(|i| &self.layouts[i])
    }

    pub fn formats(&self) -> Vec<FormatInfo> {
        self.layouts
            .iter()
            .map(|l| FormatInfo {
                id: l.id.clone(),
                name: l.name.clone(),
                description: l.description.clone(),
            })
            .collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.layouts
            .iter()
            .position(|l| l.id.eq_ignore_ascii_case(id.trim()))
    }
}
