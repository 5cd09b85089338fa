//! Trade Oracle Library
//!
//! Backend for an on-chain trading front end:
//! - Gas price cache with TTL-gated, single-flight refresh
//! - Uniswap V2 constant-product quotes from live pool reserves
//! - HTTP API exposing both

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{GasPriceCache, RefreshCoordinator, RefreshOutcome, TickOutcome, TradingService};
pub use models::{AppConfig, AppError, AppResult, ErrorCode, FeeData, GasSample, PairReserves, QuoteRequest, QuoteResult};
pub use providers::{ChainDataProvider, EthChainProvider, RpcProvider};
