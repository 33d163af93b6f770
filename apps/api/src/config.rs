use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every value has a default; malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub graphics_path: String,
    pub dictionary_path: String,
    pub renderer_url: String,
    pub renderer_timeout_secs: u64,
    /// Upper bound on tiles per request, checked before generation starts.
    pub max_tiles: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            graphics_path: env_or("GRAPHICS_PATH", "graphics.txt"),
            dictionary_path: env_or("DICTIONARY_PATH", "dictionary.txt"),
            renderer_url: env_or("RENDERER_URL", "http://html2pdf:5000/html2pdf"),
            renderer_timeout_secs: parse_env("RENDERER_TIMEOUT_SECS", 60)?,
            max_tiles: parse_env("MAX_TILES", 10_000)?,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
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
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
