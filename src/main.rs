//! Trade Oracle API Server
//!
//! Usage:
//!   cargo run --release
//!
//! Environment (a `.env` file is loaded if present):
//!   ETH_RPC_URI                    - JSON-RPC endpoint (required)
//!   UNISWAP_V2_FACTORY_ADDRESS     - Factory address (default: mainnet Uniswap V2)
//!   GAS_PRICE_CACHE_TTL_MS         - Gas price cache TTL (default: 3000)
//!   GAS_PRICE_REFRESH_INTERVAL_MS  - Background refresh period (default: 1000)
//!   APP_HOST / APP_PORT (or PORT)  - Listen address (default: 0.0.0.0:3000)
//!   RUST_LOG                       - Log filter (default: info)

use eyre::WrapErr;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use trade_oracle::api::{create_router, AppState};
use trade_oracle::models::AppConfig;
use trade_oracle::providers::{ChainDataProvider, EthChainProvider, RpcProvider};
use trade_oracle::utils::constants::{APP_NAME, APP_VERSION};
use trade_oracle::{GasPriceCache, RefreshCoordinator, TradingService};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let dotenv = dotenvy::dotenv();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("⚠️ Failed to load .env: {}", e);
        }
    }

    info!("🚀 {} v{} starting", APP_NAME, APP_VERSION);

    let config = AppConfig::from_env().wrap_err("Invalid configuration")?;

    // Chain access
    let rpc = RpcProvider::new(&config.rpc).wrap_err("Failed to create RPC provider")?;
    let provider: Arc<dyn ChainDataProvider> =
        Arc::new(EthChainProvider::new(rpc, config.factory_address));

    // Gas price cache + background refresh
    let gas_cache = Arc::new(GasPriceCache::new(provider.clone(), config.gas_price_ttl));
    let trading = Arc::new(TradingService::new(provider, gas_cache.clone()));
    trading.warm_up().await;

    let coordinator = Arc::new(RefreshCoordinator::new(gas_cache, config.gas_refresh_interval));
    let refresh_task = coordinator.spawn();

    // HTTP
    let state = Arc::new(AppState::new(trading));
    let app = create_router(state);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .wrap_err_with(|| format!("Invalid listen address {}", config.bind_address()))?;

    info!("📡 Listening on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  GET /gasPrice                                  - Cached gas price (wei)");
    info!("  GET /return/:fromToken/:toToken/:amountIn     - Uniswap V2 amountOut");
    info!("  GET /stats                                     - Gas cache statistics");
    info!("  GET /health                                    - Health check");
    info!("");

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Shutdown signal received, stopping gas price refresh...");
    refresh_task.abort();
    info!("👋 {} shutdown complete", APP_NAME);

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
