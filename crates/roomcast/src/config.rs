//! Process configuration.
//!
//! The configuration surface is deliberately small: a listen port and the
//! shared-store connection URL, both overridable via environment:
//!
//! - `PORT`             (default: 8080)
//! - `REDIS_URL`        (default: "redis://127.0.0.1:6379")
//! - `STORE_TIMEOUT_MS` (default: 5000)

use std::env;
use std::time::Duration;

use crate::RoomcastError;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on.
    pub port: u16,

    /// Connection URL of the shared store.
    pub store_url: String,

    /// Bound on a single shared-store round trip.
    pub store_timeout: Duration,
}

impl ServerConfig {
    /// Builds a config from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Result<Self, RoomcastError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| {
                RoomcastError::Config(format!(
                    "PORT must be a port number, got {raw:?}"
                ))
            })?,
            Err(_) => 8080,
        };

        let store_url = env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let store_timeout = match env::var("STORE_TIMEOUT_MS") {
            Ok(raw) => {
                let millis = raw.parse::<u64>().map_err(|_| {
                    RoomcastError::Config(format!(
                        "STORE_TIMEOUT_MS must be milliseconds, got {raw:?}"
                    ))
                })?;
                Duration::from_millis(millis)
            }
            Err(_) => Duration::from_secs(5),
        };

        Ok(Self {
            port,
            store_url,
            store_timeout,
        })
    }

    /// The `addr:port` string the transport binds to.
    pub fn socket_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            store_url: "redis://127.0.0.1:6379".to_string(),
            store_timeout: Duration::from_secs(5),
        }
    }
}
