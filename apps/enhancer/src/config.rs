use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::{gemini, groq};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub groq_model: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    /// Directory the enhanced resume is exported into (one subdirectory per session).
    pub export_dir: PathBuf,
    pub session_ttl_secs: u64,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let max_upload_mb: usize = parse_env("MAX_UPLOAD_MB", 10)?;

        Ok(Config {
            groq_api_key: require_env("GROQ_API_KEY")?,
            groq_base_url: env_or("GROQ_BASE_URL", groq::DEFAULT_BASE_URL),
            groq_model: env_or("GROQ_MODEL", groq::DEFAULT_MODEL),
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_base_url: env_or("GEMINI_BASE_URL", gemini::DEFAULT_BASE_URL),
            gemini_model: env_or("GEMINI_MODEL", gemini::DEFAULT_MODEL),
            export_dir: PathBuf::from(env_or("EXPORT_DIR", ".")),
            session_ttl_secs: parse_env("SESSION_TTL_SECS", 3600)?,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

// API keys stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("groq_base_url", &self.groq_base_url)
            .field("groq_model", &self.groq_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("gemini_model", &self.gemini_model)
            .field("export_dir", &self.export_dir)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}
