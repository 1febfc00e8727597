use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use game_persistence::connection::DEFAULT_DATABASE_URL;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub commentary_language: String,
    pub commentary_timeout_ms: u64,
    pub tick_interval_ms: u64,
    pub leaderboard_limit: u64,
    pub store_timeout_ms: u64,
    pub connection_timeout_seconds: u64,
    pub rate_limit_burst: u32,
    pub rate_limit_refill_ms: u64,
}

impl Config {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            gemini_api_key,
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
            commentary_language: env::var("COMMENTARY_LANGUAGE")
                .unwrap_or_else(|_| "Korean".to_string()),
            commentary_timeout_ms: parse_var("COMMENTARY_TIMEOUT_MS", 8000)?,
            tick_interval_ms: parse_var("TICK_INTERVAL_MS", 100)?,
            leaderboard_limit: parse_var("LEADERBOARD_LIMIT", 10)?,
            store_timeout_ms: parse_var("STORE_TIMEOUT_MS", 5000)?,
            connection_timeout_seconds: parse_var("CONNECTION_TIMEOUT_SECONDS", 300)?,
            rate_limit_burst: parse_var("RATE_LIMIT_BURST", 30)?,
            rate_limit_refill_ms: parse_var("RATE_LIMIT_REFILL_MS", 200)?,
        };

        if config.tick_interval_ms == 0 {
            anyhow::bail!("TICK_INTERVAL_MS must be greater than zero");
        }
        if config.rate_limit_refill_ms == 0 {
            anyhow::bail!("RATE_LIMIT_REFILL_MS must be greater than zero");
        }

        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn commentary_timeout(&self) -> Duration {
        Duration::from_millis(self.commentary_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }

    pub fn rate_limit_refill(&self) -> Duration {
        Duration::from_millis(self.rate_limit_refill_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-3-flash-preview".to_string(),
            commentary_language: "Korean".to_string(),
            commentary_timeout_ms: 8000,
            tick_interval_ms: 100,
            leaderboard_limit: 10,
            store_timeout_ms: 5000,
            connection_timeout_seconds: 300,
            rate_limit_burst: 30,
            rate_limit_refill_ms: 200,
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}
