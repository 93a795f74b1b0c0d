//! Export service: exports one CV in one client format.
//!
//! Resolves the layout, loads its template through the `TemplateStore`, then fills
//! and encodes the document inside `tokio::task::spawn_blocking`. The template is
//! parsed per call and owned by the blocking task, so calls never share documents.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::document::io;
use crate::errors::AppError;
use crate::export::generator::{generate, Diagnostic};
use crate::export::store::TemplateStore;
use crate::formats::{FormatInfo, LayoutRegistry};
use crate::models::Candidate;

/// A generated document ready to be written or streamed.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Bytes,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExportedDocument {
    /// Writes the document into `dir` under `file_name`. The bytes go to a
    /// temporary file in `dir` first, so readers never see a partial file.
    pub async fn write_into(&self, dir: &Path) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(dir).await?;

        let dir = dir.to_path_buf();
        let target = dir.join(&self.file_name);
        let bytes = self.bytes.clone();
        let destination = target.clone();

        tokio::task::spawn_blocking(move || -> Result<(), AppError> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&destination).map_err(|e| AppError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed writing document: {e}")))??;

        info!(path = %target.display(), bytes = self.bytes.len(), "Document written");
        Ok(target)
    }
}

#[derive(Clone)]
pub struct ExportService {
    store: Arc<dyn TemplateStore>,
    layouts: Arc<LayoutRegistry>,
}

impl ExportService {
    pub fn new(store: Arc<dyn TemplateStore>, layouts: Arc<LayoutRegistry>) -> Self {
        Self { store, layouts }
    }

    /// Every format this service can export to.
    pub fn formats(&self) -> Vec<FormatInfo> {
        self.layouts.formats()
    }

    /// Exports `candidate` in `format`, dated today.
    pub async fn export(&self, format: &str, candidate: Candidate) -> Result<ExportedDocument, AppError> {
        self.export_on(format, candidate, Local::now().date_naive()).await
    }

    pub async fn export_on(
        &self,
        format: &str,
        candidate: Candidate,
        today: NaiveDate,
    ) -> Result<ExportedDocument, AppError> {
        let layout = self
            .layouts
            .get(format)
            .ok_or_else(|| AppError::NotFound(format!("Unknown export format '{format}'")))?
            .clone();

        if candidate.first_name.trim().is_empty() || candidate.last_name.trim().is_empty() {
            return Err(AppError::Validation(
                "Candidate must have a first and last name".to_string(),
            ));
        }

        let template = self.store.load(&layout.template).await?;
        let file_name = file_name(&candidate, &layout.id);

        info!(format = %layout.id, candidate = %candidate.id, "Exporting CV");

        let (bytes, diagnostics) = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
            let mut template = template;
            let body = std::mem::take(&mut template.document);
            let generated = generate(body, &layout, &candidate, today)?;
            template.document = generated.document;
            Ok((template.to_bytes()?, generated.diagnostics))
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in export: {e}")))??;

        for diagnostic in &diagnostics {
            warn!(file = %file_name, severity = ?diagnostic.severity, "{}", diagnostic.message);
        }

        Ok(ExportedDocument {
            file_name,
            content_type: io::CONTENT_TYPE,
            bytes: Bytes::from(bytes),
            diagnostics,
        })
    }
}

/// `"<LastName> <FirstName> (<format>).docx"` with path separators removed.
fn file_name(candidate: &Candidate, format: &str) -> String {
    let name = format!(
        "{} {} ({format}).{}",
        candidate.last_name.trim(),
        candidate.first_name.trim(),
        io::FILE_EXTENSION
    );
    name.chars().filter(|c| !matches!(c, '/' | '\\')).collect()
}
