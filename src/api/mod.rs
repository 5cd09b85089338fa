//! Trade Oracle HTTP API
//! Gas price and token return endpoints over the trading service

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;
pub mod validation;

pub use handlers::AppState;
pub use routes::create_router;
pub use types::*;
