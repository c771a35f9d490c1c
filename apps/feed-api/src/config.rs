//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use feed_infra::DatabaseConfig;

/// Where uploaded images live and how large they may be.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Base directory stored image paths are resolved against.
    pub root: PathBuf,
    /// Sub-directory of `root` that new uploads are written to.
    pub dir: String,
    pub max_bytes: usize,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub run_migrations: bool,
    pub images: ImageConfig,
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parsed("DB_MAX_CONNECTIONS", 100),
            min_connections: parsed("DB_MIN_CONNECTIONS", 10),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT", 8080),
            database,
            run_migrations: flag("RUN_MIGRATIONS"),
            images: ImageConfig {
                root: env::var("IMAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(".")),
                dir: env::var("IMAGE_DIR").unwrap_or_else(|_| "images".to_string()),
                max_bytes: parsed("MAX_IMAGE_BYTES", 10 * 1024 * 1024),
            },
        }
    }
}
