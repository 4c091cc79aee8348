//! Configuration loading and representation.

use std::net::SocketAddr;

use thiserror::Error;

use pharmstock_inventory::ExpiryHorizon;

pub const BIND_ADDR_VAR: &str = "PHARMSTOCK_BIND_ADDR";
pub const EXPIRY_HORIZON_VAR: &str = "PHARMSTOCK_EXPIRY_HORIZON_DAYS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Process configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Horizon used when a caller asks for near-expiration alerts without one.
    pub expiry_horizon: ExpiryHorizon,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.trim().parse().map_err(|e| ConfigError::Invalid {
            key: BIND_ADDR_VAR,
            reason: format!("{e}"),
        })?;

        let expiry_horizon = match get(EXPIRY_HORIZON_VAR) {
            None => ExpiryHorizon::default(),
            Some(raw) => {
                let days: i64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                    key: EXPIRY_HORIZON_VAR,
                    reason: format!("{e}"),
                })?;
                ExpiryHorizon::days(days).map_err(|e| ConfigError::Invalid {
                    key: EXPIRY_HORIZON_VAR,
                    reason: e.to_string(),
                })?
            }
        };

        Ok(Self {
            bind_addr,
            expiry_horizon,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            expiry_horizon: ExpiryHorizon::default(),
        }
    }
}
