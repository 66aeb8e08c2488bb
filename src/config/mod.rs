/// Configuration management for the mail sender node
///
/// Reads service, orchestrator and SparkPost settings from environment variables.
/// Every variable has a default except the SparkPost API key.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PROXEUS_URL: &str = "http://127.0.0.1:1323";
pub const DEFAULT_SERVICE_PORT: u16 = 8013;
pub const DEFAULT_SERVICE_NAME: &str = "Email Sender";
pub const DEFAULT_JWT_SECRET: &str = "my secret";
pub const DEFAULT_REGISTER_RETRY_INTERVAL: u64 = 5;
pub const DEFAULT_SPARKPOST_BASE_URL: &str = "https://api.sparkpost.com";

/// Errors raised while reading the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} needs to be configured")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Parent orchestrator configuration
    pub proxeus: ProxeusConfig,
    /// Email provider configuration
    pub sparkpost: SparkPostConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, always all interfaces
    pub host: String,
    /// Server port number
    pub port: u16,
    /// Public URL announced to the orchestrator
    pub public_url: String,
    /// Human readable node name, also used as the node's registration id
    pub service_name: String,
    /// HS256 secret shared with the orchestrator
    pub jwt_secret: String,
}

/// Orchestrator (Proxeus) connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxeusConfig {
    /// Base URL of the Proxeus instance
    pub url: String,
    /// Delay between two registration attempts, in seconds; never zero
    pub register_retry_interval: u64,
}

/// SparkPost settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparkPostConfig {
    pub api_key: String,
    pub base_url: String,
    /// Sender used when a node config has no `EmailFrom`
    pub default_from: String,
}

impl ProxeusConfig {
    pub fn register_retry_interval(&self) -> Duration {
        Duration::from_secs(self.register_retry_interval)
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    ///
    /// Empty values are treated like unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let port = match get("SERVICE_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "SERVICE_PORT",
                value: raw.clone(),
            })?,
            None => DEFAULT_SERVICE_PORT,
        };

        let register_retry_interval = get("REGISTER_RETRY_INTERVAL")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|seconds| *seconds > 0)
            .unwrap_or(DEFAULT_REGISTER_RETRY_INTERVAL);

        let api_key = get("PROXEUS_SPARKPOST_API_KEY")
            .ok_or(ConfigError::Missing("PROXEUS_SPARKPOST_API_KEY"))?;

        Ok(Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port,
                public_url: get("SERVICE_URL")
                    .unwrap_or_else(|| format!("http://localhost:{}", port)),
                service_name: get("SERVICE_NAME")
                    .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
                jwt_secret: get("SERVICE_SECRET")
                    .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            },
            proxeus: ProxeusConfig {
                url: get("PROXEUS_INSTANCE_URL")
                    .unwrap_or_else(|| DEFAULT_PROXEUS_URL.to_string()),
                register_retry_interval,
            },
            sparkpost: SparkPostConfig {
                api_key,
                base_url: get("PROXEUS_SPARKPOST_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_SPARKPOST_BASE_URL.to_string()),
                default_from: get("PROXEUS_EMAIL_DEFAULT_FROM").unwrap_or_default(),
            },
        })
    }
}
