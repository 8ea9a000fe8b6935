use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Where the remote résumé table lives.
#[derive(Debug, Clone)]
pub enum RemoteBackend {
    /// Direct Postgres connection.
    Postgres { database_url: String },
    /// Hosted row API (PostgREST-style).
    Rest { base_url: String, api_key: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub remote: RemoteBackend,
    pub cache_dir: PathBuf,
    pub autosave_interval: Duration,
    pub pdf_command: String,
    pub export_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let remote = match std::env::var("REMOTE_REST_URL") {
            Ok(base_url) => RemoteBackend::Rest {
                base_url,
                api_key: require_env("REMOTE_REST_KEY")?,
            },
            Err(_) => RemoteBackend::Postgres {
                database_url: require_env("DATABASE_URL")?,
            },
        };

        let autosave_secs = std::env::var("AUTOSAVE_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("AUTOSAVE_INTERVAL_SECS must be a whole number of seconds")?;
        if autosave_secs == 0 {
            bail!("AUTOSAVE_INTERVAL_SECS must be greater than zero");
        }

        Ok(Config {
            remote,
            cache_dir: env_or("CACHE_DIR", ".vitae-cache").into(),
            autosave_interval: Duration::from_secs(autosave_secs),
            pdf_command: env_or("PDF_COMMAND", "wkhtmltopdf"),
            export_dir: env_or("EXPORT_DIR", "exports").into(),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
