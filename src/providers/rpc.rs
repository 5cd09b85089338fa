//! JSON-RPC Client Module
//!
//! Thin JSON-RPC 2.0 client over `reqwest`:
//! 1. Gzip compression and a fixed User-Agent
//! 2. Bounded exponential backoff with jitter on retryable failures
//! 3. Rate-limit (HTTP 429 / -32005) detection
//! 4. Nullable results for calls where `null` is a valid answer
//!
//! Uses constants from utils/constants.rs

use alloy_primitives::{Address, Bytes, U256};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::config::RpcSettings;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{
    RETRY_JITTER_PERCENT, RPC_BASE_RETRY_MS, RPC_MAX_RETRY_MS, USER_AGENT as USER_AGENT_CONST,
};

/// Block header fields needed for fee estimation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFees {
    pub base_fee_per_gas: Option<U256>,
}

/// JSON-RPC provider with retry logic
#[derive(Clone)]
pub struct RpcProvider {
    /// Endpoint URL
    url: String,
    /// HTTP client with custom headers (gzip enabled)
    client: reqwest::Client,
    /// Attempts per call
    max_retries: u32,
}

impl RpcProvider {
    /// Create a provider from config
    pub fn new(settings: &RpcSettings) -> AppResult<Self> {
        let client = Self::build_client(settings.timeout)?;
        let provider = Self {
            url: settings.url.clone(),
            client,
            max_retries: settings.max_retries.max(1),
        };
        info!("✅ JSON-RPC provider ready ({})", provider.masked_url());
        Ok(provider)
    }

    /// Build HTTP client with custom headers
    fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::with_source(ErrorCode::RpcConnectionFailed, "Failed to build HTTP client", e))
    }

    /// Execute a JSON-RPC call whose result must be non-null
    pub async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        self.call_optional(method, params).await?.ok_or_else(|| {
            AppError::new(ErrorCode::RpcInvalidResponse, format!("No result in response for {}", method))
        })
    }

    /// Execute a JSON-RPC call where a `null` result is meaningful
    pub async fn call_optional<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<Option<T>> {
        let payload = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };
        self.call_with_retry(&payload).await
    }

    /// Exponential backoff with jitter; only retryable codes are retried
    async fn call_with_retry<T: for<'de> Deserialize<'de>>(
        &self,
        payload: &RpcRequest<'_>,
    ) -> AppResult<Option<T>> {
        let mut attempt = 0;
        loop {
            match self.execute_call::<T>(payload).await {
                Ok(result) => return Ok(result),
                Err(e) if e.code.is_retryable() && attempt + 1 < self.max_retries => {
                    if e.code == ErrorCode::RpcRateLimited {
                        warn!("⏳ Rate limited on {}, backing off (attempt {}/{})",
                            payload.method, attempt + 1, self.max_retries);
                    }
                    let delay = Self::backoff_delay(attempt);
                    debug!("⏳ Retry {} in {}ms: {}", payload.method, delay.as_millis(), e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Delay before retry number `attempt + 1`
    fn backoff_delay(attempt: u32) -> Duration {
        let base_delay = RPC_BASE_RETRY_MS.saturating_mul(1 << attempt.min(16));
        let capped_delay = base_delay.min(RPC_MAX_RETRY_MS);

        let jitter_range = (capped_delay * RETRY_JITTER_PERCENT) / 100;
        let jitter: i64 = rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
        Duration::from_millis((capped_delay as i64 + jitter).max(50) as u64)
    }

    /// Execute single RPC call
    async fn execute_call<T: for<'de> Deserialize<'de>>(
        &self,
        payload: &RpcRequest<'_>,
    ) -> AppResult<Option<T>> {
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::rpc_rate_limited());
        }
        if !status.is_success() {
            return Err(AppError::new(ErrorCode::RpcError, format!("HTTP error: {}", status))
                .with_detail("method", payload.method));
        }

        let json: RpcResponse<T> = response.json().await.map_err(|e| {
            AppError::with_source(ErrorCode::RpcInvalidResponse, "Failed to parse response", e)
        })?;

        if let Some(error) = json.error {
            let code = if error.is_rate_limit() {
                ErrorCode::RpcRateLimited
            } else {
                ErrorCode::RpcError
            };
            return Err(AppError::new(code, format!("RPC error: {} (code: {})", error.message, error.code))
                .with_detail("method", payload.method));
        }

        Ok(json.result)
    }

    /// `eth_call` against the latest block
    pub async fn eth_call(&self, to: Address, data: Bytes) -> AppResult<Bytes> {
        let params = serde_json::json!([{ "to": to, "data": data }, "latest"]);
        self.call::<Bytes>("eth_call", params).await
    }

    /// `eth_gasPrice` (some nodes answer `null`)
    pub async fn gas_price(&self) -> AppResult<Option<U256>> {
        self.call_optional("eth_gasPrice", serde_json::json!([])).await
    }

    /// `eth_maxPriorityFeePerGas`
    pub async fn max_priority_fee_per_gas(&self) -> AppResult<U256> {
        self.call("eth_maxPriorityFeePerGas", serde_json::json!([])).await
    }

    /// Base fee of the latest block, `None` before London or on non-1559 chains
    pub async fn latest_base_fee(&self) -> AppResult<Option<U256>> {
        let block: Option<BlockFees> = self
            .call_optional("eth_getBlockByNumber", serde_json::json!(["latest", false]))
            .await?;
        Ok(block.and_then(|b| b.base_fee_per_gas))
    }

    /// Get RPC URL (masked for logging)
    pub fn masked_url(&self) -> String {
        mask_url(&self.url)
    }
}

/// Hide path and query (API keys usually live there)
fn mask_url(url: &str) -> String {
    match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            match rest.find('/') {
                Some(path_start) if path_start + 1 < rest.len() => {
                    format!("{}/***HIDDEN***", &url[..scheme_end + 3 + path_start])
                }
                _ => url.to_string(),
            }
        }
        None => url.to_string(),
    }
}

/// JSON-RPC request structure
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: serde_json::Value,
    id: u64,
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<RpcError>,
    #[allow(dead_code)]
    id: serde_json::Value,
}

/// JSON-RPC error structure
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// Check if this is a rate limit error (HTTP 429 equivalent or code -32005)
    pub fn is_rate_limit(&self) -> bool {
        self.code == -32005 || self.message.to_lowercase().contains("rate limit")
    }
}
