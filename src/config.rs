mod cors;
mod environment;
mod server;

pub use cors::{parse_allowed_origins, CorsConfig};
pub use environment::Environment;
pub use server::ServerConfig;

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Default port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 5000;

/// Default bind host when `HOST` is unset (all interfaces).
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default request body limit, matching the usual 100kb JSON parser limit.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 100 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub environment: Environment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `config/.env` is read first, then `.env`; variables already present in
    /// the process environment always win.
    pub fn from_env() -> AppResult<Self> {
        if Path::new("config/.env").exists() {
            dotenvy::from_path("config/.env").ok();
        }
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::Configuration(format!("Invalid PORT: {}", raw)))?,
            None => DEFAULT_PORT,
        };
        let body_limit_bytes = match lookup("BODY_LIMIT_BYTES") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                AppError::Configuration(format!("Invalid BODY_LIMIT_BYTES: {}", raw))
            })?,
            None => DEFAULT_BODY_LIMIT_BYTES,
        };

        let environment = lookup("NODE_ENV")
            .map(|raw| Environment::from_label(&raw))
            .unwrap_or_default();

        let allowed_origins = lookup("FRONTEND_URL")
            .map(|raw| parse_allowed_origins(&raw))
            .unwrap_or_default();

        let config = Config {
            server: ServerConfig {
                host,
                port,
                body_limit_bytes,
            },
            cors: CorsConfig { allowed_origins },
            environment,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        self.server.validate().map_err(AppError::Configuration)?;

        for origin in self.cors.invalid_origins() {
            tracing::warn!(
                origin = %origin,
                "FRONTEND_URL entry is not a valid origin and will only match verbatim"
            );
        }

        Ok(())
    }

    /// Socket address string the listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
