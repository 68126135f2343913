//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;

use axum::http::HeaderValue;
use chrono::FixedOffset;
use level99_core::TicketConfig;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Seconds a session stays valid after login
    pub session_lifetime_secs: i64,

    /// Origin allowed to call the API with credentials (the React dev server)
    pub cors_origin: HeaderValue,

    /// Shown in ticket metadata
    pub store_name: String,

    /// Prefix for amounts on tickets
    pub currency_symbol: String,

    /// Add `Secure` to the session cookie (HTTPS deployments)
    pub secure_cookies: bool,

    /// Store-local offset for ticket dates
    pub utc_offset: FixedOffset,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    ///
    /// Unset keys fall back to defaults; set but malformed keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let session_lifetime_secs: i64 = get("L99_SESSION_LIFETIME_SECS", "28800") // 8 hours
            .parse()
            .map_err(|_| ConfigError::InvalidValue("L99_SESSION_LIFETIME_SECS".to_string()))?;
        if session_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("L99_SESSION_LIFETIME_SECS".to_string()));
        }

        let offset_minutes: i32 = get("L99_UTC_OFFSET_MINUTES", "0")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("L99_UTC_OFFSET_MINUTES".to_string()))?;
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or_else(|| ConfigError::InvalidValue("L99_UTC_OFFSET_MINUTES".to_string()))?;

        let config = ServerConfig {
            http_port: get("L99_HTTP_PORT", "8080")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("L99_HTTP_PORT".to_string()))?,

            database_path: PathBuf::from(get("L99_DB_PATH", "./level99.db")),

            session_lifetime_secs,

            cors_origin: HeaderValue::from_str(&get("L99_CORS_ORIGIN", "http://localhost:5173"))
                .map_err(|_| ConfigError::InvalidValue("L99_CORS_ORIGIN".to_string()))?,

            store_name: get("L99_STORE_NAME", "Level 99 Game Store"),

            currency_symbol: get("L99_CURRENCY_SYMBOL", "$"),

            secure_cookies: get("L99_SECURE_COOKIES", "false")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("L99_SECURE_COOKIES".to_string()))?,

            utc_offset,
        };

        Ok(config)
    }

    /// Ticket settings derived from the store settings.
    pub fn ticket_config(&self) -> TicketConfig {
        TicketConfig {
            store_name: self.store_name.clone(),
            currency_symbol: self.currency_symbol.clone(),
            utc_offset: self.utc_offset,
            ..TicketConfig::default()
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
