//! Runtime configuration read from the environment (and `.env`)

use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 3002;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Request body limit; PDFs and signature images arrive base64 encoded
    pub max_upload_bytes: usize,
    /// Upsert the static catalog before serving
    pub seed_on_start: bool,
    pub cors_allow_any: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: "sqlite::memory:".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            seed_on_start: true,
            cors_allow_any: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT").unwrap_or(DEFAULT_PORT),
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| default_database_url()),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES").unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            seed_on_start: env_flag("SEED_ON_START").unwrap_or(true),
            cors_allow_any: env_flag("CORS_ALLOW_ANY").unwrap_or(true),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_database_url() -> String {
    let dir = platform_data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("esevai-api");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!("Could not create data directory {}: {}", dir.display(), e);
    }
    sqlite_url(&dir)
}

/// `rwc` so a fresh install creates the database file
fn sqlite_url(dir: &Path) -> String {
    format!("sqlite:{}?mode=rwc", dir.join("esevai.db").display())
}

/// Per-user application data directory, if one can be located
fn platform_data_dir() -> Option<PathBuf> {
    let home = || std::env::var_os("HOME").map(PathBuf::from);

    if cfg!(target_os = "windows") {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        home().map(|h| h.join("Library").join("Application Support"))
    } else {
        std::env::var_os("XDG_DATA_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| home().map(|h| h.join(".local").join("share")))
    }
}
