use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 20 * 1024 * 1024;

/// Worker configuration loaded from environment variables (and `.env` if present).
/// Every setting has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Base directory for relative `schema_path` values.
    pub schema_dir: PathBuf,
    pub max_document_bytes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8090).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            schema_dir: std::env::var("SCHEMA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            max_document_bytes: parse_env("MAX_DOCUMENT_BYTES", DEFAULT_MAX_DOCUMENT_BYTES)
                .context("MAX_DOCUMENT_BYTES must be a byte count")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8090,
            rust_log: "info".to_string(),
            schema_dir: PathBuf::from("."),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for '{key}': {raw:?}")),
        Err(_) => Ok(default),
    }
}
