//! Configuration Module
//!
//! Handles loading process-wide request and cache settings from environment variables.

use std::env;
use std::path::PathBuf;

/// Twelve hours, in milliseconds.
pub const DEFAULT_CACHE_MAX_AGE_MS: u64 = 12 * 60 * 60 * 1000;

/// Process-wide settings for the request helper.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory for cached responses
    pub cache_folder: PathBuf,
    /// Age in milliseconds after which a cached response is refreshed
    pub cache_max_age_ms: u64,
    /// Skip the response cache entirely
    pub cache_disabled: bool,
    /// Production mode: no caching, `wait` delays honored
    pub production: bool,
    /// File listing one proxy URL per line
    pub proxy_file: PathBuf,
    /// Append-only log of failed requests
    pub logs_file: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_FOLDER` - Cache directory (default: ./storage/request-cache/)
    /// - `CACHE_MAX_AGE_MS` - Freshness window in ms (default: 12 hours)
    /// - `CACHE_DISABLED` - `true`/`1` disables caching (default: false)
    /// - `APP_ENV` - `production` enables production mode
    /// - `PROXY_FILE` - Proxy list file (default: ./storage/proxy.txt)
    /// - `REQUEST_LOGS_FILE` - Failure log (default: ./storage/request-errors.json)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache_folder: env::var("CACHE_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_folder),
            cache_max_age_ms: env::var("CACHE_MAX_AGE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_max_age_ms),
            cache_disabled: env::var("CACHE_DISABLED")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.cache_disabled),
            production: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(defaults.production),
            proxy_file: env::var("PROXY_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.proxy_file),
            logs_file: env::var("REQUEST_LOGS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.logs_file),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_folder: PathBuf::from("./storage/request-cache/"),
            cache_max_age_ms: DEFAULT_CACHE_MAX_AGE_MS,
            cache_disabled: false,
            production: false,
            proxy_file: PathBuf::from("./storage/proxy.txt"),
            logs_file: PathBuf::from("./storage/request-errors.json"),
        }
    }
}
