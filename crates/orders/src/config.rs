//! Pipeline configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `ORDERS_MAX_DB_CONNECTIONS` - Connection pool capacity (default: 10)
//! - `ORDERS_EVENT_HISTORY_CAPACITY` - Event history ring size (default: 256)
//! - `ORDERS_LOW_STOCK_THRESHOLD` - Remaining count at or below which a
//!   `LowStock` event is emitted (default: 5)

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Order pipeline configuration.
#[derive(Debug, Clone)]
pub struct OrdersConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Connection pool capacity
    pub max_db_connections: u32,
    /// Event history ring buffer capacity
    pub event_history_capacity: usize,
    /// Remaining count at or below which `LowStock` fires
    pub low_stock_threshold: i32,
}

impl OrdersConfig {
    /// Load configuration from the environment.
    ///
    /// Reads a `.env` file first if one is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `DATABASE_URL` is missing or an optional
    /// variable fails to parse.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from already-set environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `DATABASE_URL` is missing or an optional
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = require_env("DATABASE_URL")?.into();

        Ok(Self {
            database_url,
            max_db_connections: parse_env("ORDERS_MAX_DB_CONNECTIONS", 10)?,
            event_history_capacity: parse_env("ORDERS_EVENT_HISTORY_CAPACITY", 256)?,
            low_stock_threshold: parse_env("ORDERS_LOW_STOCK_THRESHOLD", 5)?,
        })
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    parse_value(name, std::env::var(name).ok(), default)
}

fn parse_value<T: std::str::FromStr>(
    name: &str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar(name.to_string(), raw)),
        None => Ok(default),
    }
}
