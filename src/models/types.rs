//! Type definitions for the gas cache and quote engine
//! All core data structures shared between providers, core and API

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// One observation of the network gas price.
///
/// Immutable once created; the cache replaces it wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasSample {
    /// Gas price in wei
    pub value: U256,
    /// Wall-clock time of the observation (reported to clients)
    pub observed_at: DateTime<Utc>,
    /// Monotonic capture time (used for TTL decisions)
    pub captured: Instant,
}

impl GasSample {
    pub fn new(value: U256) -> Self {
        Self {
            value,
            observed_at: Utc::now(),
            captured: Instant::now(),
        }
    }

    /// Age of this sample
    pub fn age(&self) -> Duration {
        self.captured.elapsed()
    }

    /// Observation time in milliseconds since the Unix epoch
    pub fn timestamp_ms(&self) -> i64 {
        self.observed_at.timestamp_millis()
    }
}

/// Fee data as reported by the chain.
///
/// Any field may be absent depending on what the node supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeData {
    pub gas_price: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

/// Reserves of a constant-product pool in the pool's own token ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairReserves {
    /// The pool's canonical first token
    pub token0: Address,
    /// Balance of token0
    pub reserve0: U256,
    /// Balance of token1
    pub reserve1: U256,
}

/// Requested swap direction and input amount (smallest token unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteRequest {
    pub token_from: Address,
    pub token_to: Address,
    pub amount_in: U256,
}

/// Output of a constant-product quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub amount_out: U256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_sample_timestamp() {
        let sample = GasSample::new(U256::from(42u64));
        let now_ms = Utc::now().timestamp_millis();
        assert!(sample.timestamp_ms() <= now_ms);
        assert!(now_ms - sample.timestamp_ms() < 1_000);
        assert!(sample.age() < Duration::from_secs(1));
    }

    #[test]
    fn test_fee_data_camel_case() {
        let fee = FeeData {
            gas_price: Some(U256::from(7u64)),
            ..Default::default()
        };
        let json = serde_json::to_value(&fee).unwrap();
        assert!(json.get("gasPrice").is_some());
        assert!(json.get("maxFeePerGas").is_some());
    }
}
