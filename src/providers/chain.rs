//! Chain data access for the cache and quote paths
//!
//! `ChainDataProvider` is the seam the core talks through; `EthChainProvider`
//! implements it over JSON-RPC with Uniswap V2 factory/pair calls.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use tracing::{debug, error};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{FeeData, PairReserves};
use crate::providers::rpc::RpcProvider;
use crate::utils::constants::DEFAULT_PRIORITY_FEE_WEI;

sol! {
    interface IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
    }

    interface IUniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function token0() external view returns (address);
    }
}

/// Source of on-chain data.
///
/// Every failure is reported as [`ErrorCode::ProviderCallFailed`].
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Current fee data; `gas_price` may be absent
    async fn fetch_fee_data(&self) -> AppResult<FeeData>;

    /// Pool address for the pair, the zero address when no pool exists
    async fn resolve_pair_address(&self, token_a: Address, token_b: Address) -> AppResult<Address>;

    /// Reserves and canonical token0 of a pool
    async fn fetch_pair_reserves(&self, pair: Address) -> AppResult<PairReserves>;
}

/// `ChainDataProvider` backed by an Ethereum JSON-RPC node
pub struct EthChainProvider {
    rpc: RpcProvider,
    factory: Address,
}

impl EthChainProvider {
    pub fn new(rpc: RpcProvider, factory: Address) -> Self {
        Self { rpc, factory }
    }

    async fn call_contract<C: SolCall>(&self, to: Address, call: C) -> AppResult<C::Return> {
        let output = self.rpc.eth_call(to, Bytes::from(call.abi_encode())).await?;
        C::abi_decode_returns(&output, true).map_err(|e| {
            AppError::new(
                ErrorCode::RpcInvalidResponse,
                format!("Failed to decode {} output: {}", C::SIGNATURE, e),
            )
        })
    }
}

#[async_trait]
impl ChainDataProvider for EthChainProvider {
    async fn fetch_fee_data(&self) -> AppResult<FeeData> {
        let fetch = async {
            let base_fee = self.rpc.latest_base_fee().await?;
            let gas_price = self.rpc.gas_price().await?;

            let (max_fee_per_gas, max_priority_fee_per_gas) = match base_fee {
                Some(base_fee) => {
                    let priority = match self.rpc.max_priority_fee_per_gas().await {
                        Ok(fee) => fee,
                        Err(e) => {
                            debug!("eth_maxPriorityFeePerGas unavailable, using default: {}", e);
                            U256::from(DEFAULT_PRIORITY_FEE_WEI)
                        }
                    };
                    let max_fee = base_fee
                        .saturating_mul(U256::from(2u64))
                        .saturating_add(priority);
                    (Some(max_fee), Some(priority))
                }
                None => (None, None),
            };

            Ok::<_, AppError>(FeeData {
                gas_price,
                max_fee_per_gas,
                max_priority_fee_per_gas,
            })
        };

        fetch.await.map_err(|e| {
            error!("❌ Fee data fetch failed: {}", e);
            AppError::wrap(ErrorCode::ProviderCallFailed, "Failed to fetch fee data", e)
        })
    }

    async fn resolve_pair_address(&self, token_a: Address, token_b: Address) -> AppResult<Address> {
        let call = IUniswapV2Factory::getPairCall {
            tokenA: token_a,
            tokenB: token_b,
        };
        let pair = self
            .call_contract(self.factory, call)
            .await
            .map_err(|e| AppError::wrap(ErrorCode::ProviderCallFailed, "Failed to get pair", e))?
            .pair;

        debug!(%token_a, %token_b, %pair, "Resolved pair address");
        Ok(pair)
    }

    async fn fetch_pair_reserves(&self, pair: Address) -> AppResult<PairReserves> {
        let reserves = self
            .call_contract(pair, IUniswapV2Pair::getReservesCall {})
            .await
            .map_err(|e| {
                AppError::wrap(ErrorCode::ProviderCallFailed, "Failed to get reserves", e)
                    .with_detail("pair", pair)
            })?;

        // pools order their tokens by address, independent of the caller's direction
        let token0 = self
            .call_contract(pair, IUniswapV2Pair::token0Call {})
            .await
            .map_err(|e| {
                AppError::wrap(ErrorCode::ProviderCallFailed, "Failed to get token0", e)
                    .with_detail("pair", pair)
            })?
            ._0;

        Ok(PairReserves {
            token0,
            reserve0: U256::from(reserves.reserve0.to::<u128>()),
            reserve1: U256::from(reserves.reserve1.to::<u128>()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use alloy_sol_types::SolValue;

    #[test]
    fn test_get_pair_calldata() {
        let call = IUniswapV2Factory::getPairCall {
            tokenA: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            tokenB: address!("6B175474E89094C44Da98b954EedeAC495271d0F"),
        };
        let data = call.abi_encode();
        assert_eq!(hex::encode(&data[..4]), "e6a43905");
        assert_eq!(data.len(), 4 + 64);
    }

    #[test]
    fn test_pair_selectors() {
        assert_eq!(hex::encode(IUniswapV2Pair::getReservesCall::SELECTOR), "0902f1ac");
        assert_eq!(hex::encode(IUniswapV2Pair::token0Call::SELECTOR), "0dfe1681");
    }

    #[test]
    fn test_decode_reserves() {
        let encoded = (U256::from(5_000u64), U256::from(10_000u64), U256::from(1_700_000_000u64)).abi_encode_params();
        let decoded = IUniswapV2Pair::getReservesCall::abi_decode_returns(&encoded, true).unwrap();
        assert_eq!(decoded.reserve0.to::<u128>(), 5_000);
        assert_eq!(decoded.reserve1.to::<u128>(), 10_000);
        assert_eq!(decoded.blockTimestampLast, 1_700_000_000);
    }
}
