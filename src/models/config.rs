//! Service configuration
//!
//! Loaded from the process environment (after `.env` has been applied by
//! `dotenvy` in the binary). Defaults live in utils/constants.rs.

use alloy_primitives::Address;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{
    DEFAULT_GAS_PRICE_TTL_MS, DEFAULT_GAS_REFRESH_INTERVAL_MS, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_RPC_MAX_RETRIES, DEFAULT_RPC_TIMEOUT_SECS, UNISWAP_V2_FACTORY_MAINNET,
};

/// JSON-RPC endpoint URL (required)
pub const ENV_RPC_URI: &str = "ETH_RPC_URI";
/// Uniswap V2 factory address
pub const ENV_FACTORY_ADDRESS: &str = "UNISWAP_V2_FACTORY_ADDRESS";
/// Gas price cache TTL in milliseconds
pub const ENV_GAS_TTL_MS: &str = "GAS_PRICE_CACHE_TTL_MS";
/// Background refresh period in milliseconds
pub const ENV_GAS_REFRESH_MS: &str = "GAS_PRICE_REFRESH_INTERVAL_MS";
/// RPC timeout in seconds
pub const ENV_RPC_TIMEOUT_SECS: &str = "RPC_TIMEOUT_SECS";
/// Attempts per RPC call
pub const ENV_RPC_MAX_RETRIES: &str = "RPC_MAX_RETRIES";
/// Bind host
pub const ENV_HOST: &str = "APP_HOST";
/// Bind port (APP_PORT first, then the platform-provided PORT)
pub const ENV_PORT: &str = "APP_PORT";
pub const ENV_PORT_FALLBACK: &str = "PORT";

/// JSON-RPC client settings
#[derive(Debug, Clone)]
pub struct RpcSettings {
    pub url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

/// Full service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rpc: RpcSettings,
    pub factory_address: Address,
    pub gas_price_ttl: Duration,
    pub gas_refresh_interval: Duration,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> AppResult<Self> {
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        info!(
            "⚙️ Config loaded: factory={}, gas_ttl={}ms, refresh={}ms",
            config.factory_address,
            config.gas_price_ttl.as_millis(),
            config.gas_refresh_interval.as_millis()
        );
        Ok(config)
    }

    /// Build from an arbitrary key lookup (environment, map in tests, ...)
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let url = get(ENV_RPC_URI).ok_or_else(|| AppError::missing_env(ENV_RPC_URI))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::invalid_config(ENV_RPC_URI, "expected an http(s) URL"));
        }

        let factory_address = match get(ENV_FACTORY_ADDRESS) {
            Some(raw) => Address::from_str(&raw)
                .map_err(|e| AppError::invalid_config(ENV_FACTORY_ADDRESS, e.to_string()))?,
            None => UNISWAP_V2_FACTORY_MAINNET,
        };

        let ttl_ms = parse_or(get(ENV_GAS_TTL_MS), ENV_GAS_TTL_MS, DEFAULT_GAS_PRICE_TTL_MS)?;
        let refresh_ms = parse_or(
            get(ENV_GAS_REFRESH_MS),
            ENV_GAS_REFRESH_MS,
            DEFAULT_GAS_REFRESH_INTERVAL_MS,
        )?;
        if refresh_ms == 0 {
            return Err(AppError::invalid_config(ENV_GAS_REFRESH_MS, "must be greater than 0"));
        }

        let timeout_secs = parse_or(get(ENV_RPC_TIMEOUT_SECS), ENV_RPC_TIMEOUT_SECS, DEFAULT_RPC_TIMEOUT_SECS)?;
        let max_retries = parse_or(get(ENV_RPC_MAX_RETRIES), ENV_RPC_MAX_RETRIES, DEFAULT_RPC_MAX_RETRIES)?;
        if max_retries == 0 {
            return Err(AppError::invalid_config(ENV_RPC_MAX_RETRIES, "must be at least 1"));
        }

        let host = get(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(ENV_PORT) {
            Some(raw) => parse_or(Some(raw), ENV_PORT, DEFAULT_PORT)?,
            None => parse_or(get(ENV_PORT_FALLBACK), ENV_PORT_FALLBACK, DEFAULT_PORT)?,
        };

        Ok(Self {
            rpc: RpcSettings {
                url,
                timeout: Duration::from_secs(timeout_secs),
                max_retries,
            },
            factory_address,
            gas_price_ttl: Duration::from_millis(ttl_ms),
            gas_refresh_interval: Duration::from_millis(refresh_ms),
            host,
            port,
        })
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> AppResult<T>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|e| AppError::invalid_config(key, format!("{:?}: {}", value, e))),
        None => Ok(default),
    }
}
