//! Template storage. Export code only sees the `TemplateStore` trait so tests and
//! other deployments can swap the filesystem for something else.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::document::io::{self, Template};
use crate::errors::AppError;

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Loads and parses the template named `template` (as written in a layout).
    async fn load(&self, template: &str) -> Result<Template, AppError>;
}

/// Reads templates from `<root>/<template>`.
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    root: PathBuf,
}

impl FsTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TemplateStore for FsTemplateStore {
    async fn load(&self, template: &str) -> Result<Template, AppError> {
        let path = self.root.join(template);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!(
                    "template {} does not exist",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), bytes = bytes.len(), "Template loaded");
        tokio::task::spawn_blocking(move || io::from_bytes(&bytes))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed parsing template: {e}")))?
    }
}
