use anyhow::{Context, Result};

use crate::stream::DEFAULT_MAX_LINE_BYTES;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the optimization backend, e.g. `http://localhost:8000/api`.
    pub optimizer_api_url: String,
    pub port: u16,
    pub rust_log: String,
    pub save_timeout_secs: u64,
    pub max_event_line_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            optimizer_api_url: require_env("OPTIMIZER_API_URL")?,
            port: env_or("PORT", "8090")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            save_timeout_secs: env_or("SAVE_TIMEOUT_SECS", "30")?,
            max_event_line_bytes: env_or(
                "MAX_EVENT_LINE_BYTES",
                &DEFAULT_MAX_LINE_BYTES.to_string(),
            )?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_setting(key, &std::env::var(key).unwrap_or_else(|_| default.to_string()))
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value: '{raw}'"))
}
