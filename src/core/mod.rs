//! Core Module - Business Logic
//!
//! Gas price caching with single-flight refresh, the constant-product
//! quote engine, and the trading service that ties them to chain data.

pub mod coordinator;
pub mod gas_cache;
pub mod quote;
pub mod trading;

pub use coordinator::*;
pub use gas_cache::*;
pub use trading::*;
