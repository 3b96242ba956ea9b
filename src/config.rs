use std::env;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::core::RUPEE;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("APP_PORT must be a port number, got '{0}'")]
    InvalidPort(String),
    #[error("APP_HOST must be an IP address or 'localhost', got '{0}'")]
    InvalidHost(String),
    #[error("APP_CURRENCY_SYMBOL must not be empty")]
    EmptyCurrencySymbol,
}

/// Top-level configuration, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub currency_symbol: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match lookup("APP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => 8080,
        };
        let log_level = lookup("APP_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let currency_symbol = lookup("APP_CURRENCY_SYMBOL").unwrap_or_else(|| RUPEE.to_string());
        if currency_symbol.trim().is_empty() {
            return Err(ConfigError::EmptyCurrencySymbol);
        }

        Ok(Self {
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            currency_symbol,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
            currency_symbol: RUPEE.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
