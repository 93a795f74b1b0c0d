use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the template documents named by layouts.
    pub templates_dir: PathBuf,
    /// Extra layouts that add to or override the bundled ones.
    pub layouts_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            templates_dir: require_env("TEMPLATES_DIR")?.into(),
            layouts_dir: optional_env("LAYOUTS_DIR").map(PathBuf::from),
            output_dir: optional_env("OUTPUT_DIR")
                .unwrap_or_else(|| "out".to_string())
                .into(),
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
