mod config;
mod document;
mod errors;
mod export;
mod formats;
mod models;
mod placeholder;
mod template;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::document::{Container, Document};
use crate::export::{ExportService, FsTemplateStore, TemplateStore};
use crate::formats::LayoutRegistry;
use crate::models::Candidate;
use crate::placeholder::{token, Dialect};
use crate::template::cleanup::is_marker_text;

/// Fills client CV templates with candidate data.
#[derive(Debug, Parser)]
#[command(name = "cvgen", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every export format.
    Formats,
    /// Export one CV in a client format.
    Export {
        /// Format id, e.g. `mosbirja`.
        #[arg(long)]
        format: String,
        /// Candidate CV as JSON.
        #[arg(long)]
        cv: PathBuf,
        /// Output directory; defaults to OUTPUT_DIR.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show the placeholders and markers a template uses.
    Inspect {
        /// Template file name inside TEMPLATES_DIR.
        template: String,
        /// Also print the parsed block tree.
        #[arg(long)]
        tree: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting cvgen v{}", env!("CARGO_PKG_VERSION"));

    let mut layouts = LayoutRegistry::builtin()?;
    if let Some(dir) = &config.layouts_dir {
        layouts
            .load_dir(dir)
            .await
            .with_context(|| format!("Failed to load layouts from {}", dir.display()))?;
    }

    let store = Arc::new(FsTemplateStore::new(&config.templates_dir));
    let service = ExportService::new(store.clone(), Arc::new(layouts));

    match cli.command {
        Command::Formats => {
            let formats = service.formats();
            println!("{}", serde_json::to_string_pretty(&formats)?);
        }
        Command::Export { format, cv, out } => {
            let raw = tokio::fs::read(&cv)
                .await
                .with_context(|| format!("Failed to read CV {}", cv.display()))?;
            let candidate: Candidate = serde_json::from_slice(&raw)
                .with_context(|| format!("CV {} is not valid candidate JSON", cv.display()))?;

            let exported = match service.export(&format, candidate).await {
                Ok(exported) => exported,
                Err(e) => {
                    error!(code = e.code(), "Export failed: {e}");
                    return Err(e.into());
                }
            };
            info!(
                file = %exported.file_name,
                content_type = exported.content_type,
                bytes = exported.bytes.len(),
                "CV exported"
            );
            if !exported.diagnostics.is_empty() {
                warn!(
                    "{} template problem(s) while exporting; see log above",
                    exported.diagnostics.len()
                );
            }

            let dir = out.unwrap_or_else(|| config.output_dir.clone());
            let path = exported.write_into(&dir).await?;
            println!("{}", path.display());
        }
        Command::Inspect { template, tree } => {
            let loaded = match store.load(&template).await {
                Ok(loaded) => loaded,
                Err(e) => {
                    error!(code = e.code(), "Inspect failed: {e}");
                    return Err(e.into());
                }
            };
            let mut report = inspect(&loaded.document);
            if tree {
                report["tree"] = serde_json::to_value(&loaded.document)?;
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Outline, placeholders per dialect and markers of a parsed template.
fn inspect(document: &Document) -> serde_json::Value {
    let mut angle = BTreeSet::new();
    let mut brace = BTreeSet::new();
    let mut markers = Vec::new();

    for paragraph in document.paragraphs() {
        let text = paragraph.text();
        if is_marker_text(&text) {
            markers.push(text.trim().to_string());
        }
        for (dialect, found) in [(Dialect::Angle, &mut angle), (Dialect::Brace, &mut brace)] {
            found.extend(token::scan(&text, dialect).iter().map(|t| t.render(dialect)));
        }
    }

    json!({
        "outline": document.lines(),
        "placeholders": { "angle": angle, "brace": brace },
        "markers": markers,
    })
}
