//! Trading service: gas price lookups and token return quotes

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use tracing::{debug, error, info, warn};

use crate::core::gas_cache::GasPriceCache;
use crate::core::quote;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{GasSample, QuoteRequest, QuoteResult};
use crate::providers::chain::ChainDataProvider;

pub struct TradingService {
    provider: Arc<dyn ChainDataProvider>,
    gas_cache: Arc<GasPriceCache>,
}

impl TradingService {
    pub fn new(provider: Arc<dyn ChainDataProvider>, gas_cache: Arc<GasPriceCache>) -> Self {
        Self { provider, gas_cache }
    }

    pub fn gas_cache(&self) -> &Arc<GasPriceCache> {
        &self.gas_cache
    }

    /// Best-effort first refresh at startup
    pub async fn warm_up(&self) {
        match self.gas_cache.refresh().await {
            Ok(outcome) => info!("✅ Gas price cache warmed up ({} wei)", outcome.sample().value),
            Err(e) => warn!("⚠️ Failed to initialize gas price cache: {}", e),
        }
    }

    /// Cached gas price (fetched only if nothing is cached yet)
    pub async fn gas_price(&self) -> AppResult<Arc<GasSample>> {
        self.gas_cache.read().await
    }

    /// Expected output of swapping `amount_in` of `token_from` into `token_to`
    pub async fn token_return(
        &self,
        token_from: Address,
        token_to: Address,
        amount_in: U256,
    ) -> AppResult<QuoteResult> {
        debug!(%token_from, %token_to, %amount_in, "Getting token return");

        let pair = self
            .provider
            .resolve_pair_address(token_from, token_to)
            .await
            .map_err(|e| {
                error!("❌ Failed to fetch pair contract address: {}", e);
                AppError::wrap(
                    ErrorCode::ProviderCallFailed,
                    "Failed to fetch pair contract address",
                    e,
                )
            })?;

        if pair.is_zero() {
            return Err(AppError::pair_not_found("No Uniswap V2 pair exists for these tokens")
                .with_detail("tokenFrom", token_from)
                .with_detail("tokenTo", token_to));
        }

        let reserves = self.provider.fetch_pair_reserves(pair).await.map_err(|e| {
            error!(%pair, "❌ Failed to fetch pair contract on-chain data: {}", e);
            AppError::wrap(
                ErrorCode::ProviderCallFailed,
                "Failed to fetch pair contract on-chain data",
                e,
            )
            .with_detail("pair", pair)
        })?;
        debug!(%pair, token0 = %reserves.token0, reserve0 = %reserves.reserve0, reserve1 = %reserves.reserve1, "Pair reserves fetched");

        let request = QuoteRequest {
            token_from,
            token_to,
            amount_in,
        };
        let result = quote::quote(&request, &reserves);
        debug!(amount_out = %result.amount_out, "Token return computed");

        Ok(result)
    }
}
