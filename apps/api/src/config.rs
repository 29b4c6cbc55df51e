use std::time::Duration;

use anyhow::{Context, Result};

use crate::editor::preview::{DEFAULT_DEBOUNCE, DEFAULT_LAYOUT_WIDTH};
use crate::editor::PreviewConfig;
use crate::llm_client::LlmSettings;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// AI text import is disabled when unset.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub preview_debounce: Duration,
    pub preview_layout_width: usize,
    /// Sessions untouched for this long are closed and their drafts dropped.
    pub session_idle_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub llm_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: parse_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            preview_debounce: Duration::from_millis(parse_env(
                "PREVIEW_DEBOUNCE_MS",
                DEFAULT_DEBOUNCE.as_millis() as u64,
            )?),
            preview_layout_width: parse_env("PREVIEW_LAYOUT_WIDTH", DEFAULT_LAYOUT_WIDTH)?,
            session_idle_ttl: Duration::from_secs(parse_env("SESSION_IDLE_TTL_SECS", 1800u64)?),
            session_sweep_interval: Duration::from_secs(parse_env(
                "SESSION_SWEEP_INTERVAL_SECS",
                60u64,
            )?),
            llm_model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-5".to_string()),
            llm_max_tokens: parse_env("LLM_MAX_TOKENS", 4096u32)?,
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 120u64)?),
        })
    }

    pub fn preview_config(&self) -> PreviewConfig {
        PreviewConfig {
            debounce: self.preview_debounce,
            layout_width: self.preview_layout_width,
        }
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            model: self.llm_model.clone(),
            max_tokens: self.llm_max_tokens,
            timeout: self.llm_timeout,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
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
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
