//! Constants Module - Single Source of Truth
//!
//! Every default, protocol constant and conversion helper used across the
//! service is defined here. No hardcoded values in other modules.

use alloy_primitives::{address, Address, U256};

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "TradeOracle";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outgoing JSON-RPC requests
pub const USER_AGENT: &str = concat!("TradeOracle/", env!("CARGO_PKG_VERSION"));

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

// ============================================
// RPC CONSTANTS
// ============================================

/// Default timeout for RPC requests (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Default number of attempts per JSON-RPC call
pub const DEFAULT_RPC_MAX_RETRIES: u32 = 3;

/// Base retry delay in milliseconds
pub const RPC_BASE_RETRY_MS: u64 = 250;

/// Maximum retry delay in milliseconds
pub const RPC_MAX_RETRY_MS: u64 = 4_000;

/// Jitter percentage applied to retry delays
pub const RETRY_JITTER_PERCENT: u64 = 20;

// ============================================
// GAS PRICE CACHE
// ============================================

/// Default gas price cache TTL (milliseconds)
pub const DEFAULT_GAS_PRICE_TTL_MS: u64 = 3_000;

/// Default period of the background refresh trigger (milliseconds)
pub const DEFAULT_GAS_REFRESH_INTERVAL_MS: u64 = 1_000;

/// Priority fee assumed when the node cannot suggest one (1 gwei)
pub const DEFAULT_PRIORITY_FEE_WEI: u64 = 1_000_000_000;

// ============================================
// UNISWAP V2
// ============================================

/// Uniswap V2 factory on Ethereum mainnet
pub const UNISWAP_V2_FACTORY_MAINNET: Address =
    address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");

/// Swap fee numerator (0.3% fee => 997/1000 of input is traded)
pub const FEE_NUMERATOR: u64 = 997;

/// Swap fee denominator
pub const FEE_DENOMINATOR: u64 = 1_000;

// ============================================
// CONVERSION HELPERS
// ============================================

/// Convert wei to gwei (for human-readable logs only)
pub fn wei_to_gwei(wei: U256) -> f64 {
    let wei_f64: f64 = wei.to_string().parse().unwrap_or(0.0);
    wei_f64 / 1e9
}

/// Check a `0x`-prefixed, 40 hex digit address string
pub fn is_hex_address(value: &str) -> bool {
    match value.strip_prefix("0x") {
        Some(hex_part) => hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}
