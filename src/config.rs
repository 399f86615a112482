//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// HS256 signing secret for access tokens
    pub secret: String,

    /// Access token lifetime in hours
    pub token_ttl_hours: i64,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Mount `GET /users` (lists every user, no ownership check)
    pub expose_user_directory: bool,

    /// Emit logs as JSON lines instead of the pretty formatter
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let secret = lookup("SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingEnv("SECRET"))?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let token_ttl_hours: i64 = lookup("TOKEN_TTL_HOURS")
            .unwrap_or_else(|| "24".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("TOKEN_TTL_HOURS"))?;

        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            return Err(ConfigError::InvalidValue("TOKEN_TTL_HOURS"));
        }

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let expose_user_directory = parse_flag(
            lookup("EXPOSE_USER_DIRECTORY"),
            "EXPOSE_USER_DIRECTORY",
        )?;

        let log_json = matches!(lookup("LOG_FORMAT").as_deref(), Some("json"));

        Ok(Self {
            database_url,
            database_max_connections,
            secret,
            token_ttl_hours,
            host,
            port,
            environment,
            expose_user_directory,
            log_json,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Ten years
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366 * 10;

fn parse_flag(value: Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(_) => Err(ConfigError::InvalidValue(key)),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
