use std::time::Duration;
use thiserror::Error;

use crate::event::DEFAULT_WRITE_TIMEOUT;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime configuration read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Postgres connection string; None runs on in-memory storage
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Bound on a single event write to one listener
    pub write_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source
    ///
    /// `DATABASE_URL` wins over the `WSRS_DATABASE_*` component variables.
    /// The component variables must then be set together.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("WSRS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let database_url = match lookup("DATABASE_URL") {
            Some(url) => Some(url),
            None if lookup("WSRS_DATABASE_HOST").is_some() => {
                let var = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
                Some(format!(
                    "postgres://{}:{}@{}:{}/{}",
                    var("WSRS_DATABASE_USER")?,
                    var("WSRS_DATABASE_PASSWORD")?,
                    var("WSRS_DATABASE_HOST")?,
                    var("WSRS_DATABASE_PORT")?,
                    var("WSRS_DATABASE_NAME")?,
                ))
            }
            None => None,
        };

        let max_connections = match lookup("WSRS_DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "WSRS_DATABASE_MAX_CONNECTIONS",
                value,
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let write_timeout = match lookup("WSRS_WRITE_TIMEOUT_MS") {
            Some(value) => match value.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "WSRS_WRITE_TIMEOUT_MS",
                        value,
                    })
                }
            },
            None => DEFAULT_WRITE_TIMEOUT,
        };

        Ok(Self {
            bind_addr,
            database_url,
            max_connections,
            write_timeout,
        })
    }
}
