use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 60 * 60;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means offline mode: every quiz comes from fallback templates.
    pub anthropic_api_key: Option<String>,
    /// Overrides the messages endpoint, e.g. for a local proxy.
    pub anthropic_api_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on one question-source call.
    pub question_source_timeout: Duration,
    /// Sessions untouched for this long are discarded.
    pub session_idle_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let timeout_secs = seconds_env("QUESTION_SOURCE_TIMEOUT_SECS", DEFAULT_SOURCE_TIMEOUT_SECS)?;
        let idle_ttl_secs = seconds_env("SESSION_IDLE_TTL_SECS", DEFAULT_SESSION_IDLE_TTL_SECS)?;

        Ok(Config {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            anthropic_api_url: optional_env("ANTHROPIC_API_URL"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            question_source_timeout: Duration::from_secs(timeout_secs),
            session_idle_ttl: Duration::from_secs(idle_ttl_secs),
        })
    }
}

fn seconds_env(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(v) => v
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds")),
        Err(_) => Ok(default),
    }
}

/// Unset and blank values are both treated as missing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
