//! Providers Module - External Data Sources
//!
//! JSON-RPC transport and the chain data provider built on it.

pub mod chain;
pub mod rpc;

pub use chain::*;
pub use rpc::*;
