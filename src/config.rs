//! Configuration management for Waymark.
//!
//! Loads configuration from environment variables (with .env support via
//! dotenvy). The surrounding service calls `init()` once at startup; the
//! services in this crate take their dependencies explicitly and only fall
//! back to these values for defaults.

use std::env;
use std::sync::OnceLock;

use crate::models::DEFAULT_TAG_COLOR;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite database path, or ":memory:" for an ephemeral store.
    pub path: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Color assigned to tags created implicitly during import.
    pub default_tag_color: String,
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env if present; ignore if missing
        let _ = dotenvy::dotenv();

        Self {
            database: DatabaseConfig {
                path: env_or("WAYMARK_DB_PATH", "./waymark.sqlite"),
                max_connections: env_or("WAYMARK_DB_MAX_CONNECTIONS", "10")
                    .parse()
                    .unwrap_or(10),
            },
            import: ImportConfig {
                default_tag_color: env_or("WAYMARK_DEFAULT_TAG_COLOR", DEFAULT_TAG_COLOR),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
