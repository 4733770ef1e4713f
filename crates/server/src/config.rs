//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Directory with the built frontend, served at `/`.
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `TROUPE_ADDR` | Server bind address | `127.0.0.1:8080` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:troupe.db?mode=rwc` |
    /// | `TROUPE_STATIC_DIR` | Frontend directory | (none) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("TROUPE_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:troupe.db?mode=rwc".to_string());

        let static_dir = env::var("TROUPE_STATIC_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            addr,
            database_url,
            static_dir,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TROUPE_ADDR format")]
    InvalidAddr,
}
