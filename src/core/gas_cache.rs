//! Gas Price Cache
//!
//! Holds at most one `GasSample`. Reads never block on TTL: a present sample
//! is returned even when stale, and only an empty cache forces a fetch.
//!
//! Every refresh (on-demand or periodic) runs under one async mutex that
//! covers the whole check-age / fetch / write span, so concurrent callers
//! coalesce onto a single provider call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::GasSample;
use crate::providers::chain::ChainDataProvider;
use crate::utils::constants::wei_to_gwei;

/// Result of a refresh that did not fail
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// The provider was queried and the sample replaced
    Fetched(Arc<GasSample>),
    /// The current sample is younger than the TTL; nothing was fetched
    StillFresh(Arc<GasSample>),
}

impl RefreshOutcome {
    pub fn sample(&self) -> &Arc<GasSample> {
        match self {
            Self::Fetched(sample) | Self::StillFresh(sample) => sample,
        }
    }

    pub fn was_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }
}

/// Cache counters, exposed on `/stats`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub reads: u64,
    pub hits: u64,
    pub hit_rate: f64,
    pub provider_fetches: u64,
    pub refresh_failures: u64,
    pub skipped_refreshes: u64,
    pub ttl_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_age_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price_wei: Option<String>,
}

/// TTL-gated, single-flight cache of the network gas price
pub struct GasPriceCache {
    provider: Arc<dyn ChainDataProvider>,
    ttl: Duration,
    sample: RwLock<Option<Arc<GasSample>>>,
    /// In-flight guard for the check-and-write span of a refresh
    refresh_lock: Mutex<()>,
    reads: AtomicU64,
    hits: AtomicU64,
    provider_fetches: AtomicU64,
    refresh_failures: AtomicU64,
    skipped_refreshes: AtomicU64,
}

impl GasPriceCache {
    /// Create an empty cache; `ttl` is fixed for the cache's lifetime
    pub fn new(provider: Arc<dyn ChainDataProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            sample: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            reads: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            provider_fetches: AtomicU64::new(0),
            refresh_failures: AtomicU64::new(0),
            skipped_refreshes: AtomicU64::new(0),
        }
    }

    /// Current sample without side effects
    pub async fn current(&self) -> Option<Arc<GasSample>> {
        self.sample.read().await.clone()
    }

    /// Return the cached sample, fetching first only if the cache is empty
    pub async fn read(&self) -> AppResult<Arc<GasSample>> {
        self.reads.fetch_add(1, Ordering::Relaxed);

        if let Some(sample) = self.current().await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(wei = %sample.value, age_ms = sample.age().as_millis() as u64, "Gas price cache HIT");
            return Ok(sample);
        }

        debug!("Gas price cache is empty, refreshing");
        let outcome = self.refresh().await?;
        Ok(outcome.sample().clone())
    }

    /// Refresh if the sample is missing or at least `ttl` old, waiting for
    /// any refresh already in flight
    pub async fn refresh(&self) -> AppResult<RefreshOutcome> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Like [`refresh`](Self::refresh) but returns `None` immediately when
    /// another refresh holds the guard
    pub async fn try_refresh(&self) -> Option<AppResult<RefreshOutcome>> {
        let _guard = match self.refresh_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                self.skipped_refreshes.fetch_add(1, Ordering::Relaxed);
                debug!("Gas price refresh already in flight, skipping");
                return None;
            }
        };
        Some(self.refresh_locked().await)
    }

    async fn refresh_locked(&self) -> AppResult<RefreshOutcome> {
        if let Some(sample) = self.current().await {
            let age = sample.age();
            if age < self.ttl {
                debug!(
                    age_ms = age.as_millis() as u64,
                    ttl_ms = self.ttl.as_millis() as u64,
                    "Gas price cache is fresh, skipping fetch"
                );
                return Ok(RefreshOutcome::StillFresh(sample));
            }
        }

        self.provider_fetches.fetch_add(1, Ordering::Relaxed);
        let fee_data = match self.provider.fetch_fee_data().await {
            Ok(fee_data) => fee_data,
            Err(e) => {
                self.refresh_failures.fetch_add(1, Ordering::Relaxed);
                warn!("⚠️ Gas price fetch failed: {}", e);
                return Err(AppError::wrap(
                    ErrorCode::GasPriceUnavailable,
                    "Failed to fetch fee data",
                    e,
                ));
            }
        };

        let Some(value) = fee_data.gas_price else {
            self.refresh_failures.fetch_add(1, Ordering::Relaxed);
            warn!("⚠️ Fee data contained no gas price");
            return Err(AppError::gas_price_unavailable("Gas price is absent in fee data"));
        };

        let sample = Arc::new(GasSample::new(value));
        *self.sample.write().await = Some(sample.clone());
        info!("⛽ Gas price updated: {:.2} gwei", wei_to_gwei(value));

        Ok(RefreshOutcome::Fetched(sample))
    }

    /// Snapshot of the counters
    pub async fn stats(&self) -> CacheStats {
        let reads = self.reads.load(Ordering::Relaxed);
        let hits = self.hits.load(Ordering::Relaxed);
        let sample = self.current().await;

        CacheStats {
            reads,
            hits,
            hit_rate: if reads > 0 {
                hits as f64 / reads as f64 * 100.0
            } else {
                0.0
            },
            provider_fetches: self.provider_fetches.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            skipped_refreshes: self.skipped_refreshes.load(Ordering::Relaxed),
            ttl_ms: self.ttl.as_millis() as u64,
            sample_age_ms: sample.as_ref().map(|s| s.age().as_millis() as u64),
            gas_price_wei: sample.map(|s| s.value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{FeeData, PairReserves};
    use alloy_primitives::{Address, U256};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    /// Replays queued fee data results, then keeps answering `default_gas`
    struct ScriptedProvider {
        calls: AtomicUsize,
        script: std::sync::Mutex<VecDeque<AppResult<FeeData>>>,
        default_gas: u64,
    }

    impl ScriptedProvider {
        fn new(default_gas: u64) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: std::sync::Mutex::new(VecDeque::new()),
                default_gas,
            })
        }

        fn push(&self, result: AppResult<FeeData>) {
            self.script.lock().unwrap().push_back(result);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn fee(gas: u64) -> FeeData {
        FeeData {
            gas_price: Some(U256::from(gas)),
            ..Default::default()
        }
    }

    #[async_trait]
    impl ChainDataProvider for ScriptedProvider {
        async fn fetch_fee_data(&self) -> AppResult<FeeData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(fee(self.default_gas)))
        }

        async fn resolve_pair_address(&self, _: Address, _: Address) -> AppResult<Address> {
            Ok(Address::ZERO)
        }

        async fn fetch_pair_reserves(&self, _: Address) -> AppResult<PairReserves> {
            Err(AppError::provider_call_failed("not scripted"))
        }
    }

    fn cache(provider: &Arc<ScriptedProvider>, ttl: Duration) -> GasPriceCache {
        GasPriceCache::new(provider.clone(), ttl)
    }

    #[tokio::test]
    async fn test_empty_read_fetches_once() {
        let provider = ScriptedProvider::new(30_000_000_000);
        let cache = cache(&provider, Duration::from_secs(60));

        let sample = cache.read().await.unwrap();
        assert_eq!(sample.value, U256::from(30_000_000_000u64));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_reads_within_ttl_are_identical() {
        let provider = ScriptedProvider::new(7);
        let cache = cache(&provider, Duration::from_secs(60));

        let first = cache.read().await.unwrap();
        for _ in 0..5 {
            let again = cache.read().await.unwrap();
            assert_eq!(again.value, first.value);
            assert_eq!(again.observed_at, first.observed_at);
        }
        assert_eq!(provider.calls(), 1);

        let stats = cache.stats().await;
        assert_eq!(stats.reads, 6);
        assert_eq!(stats.hits, 5);
        assert_eq!(stats.provider_fetches, 1);
    }

    #[tokio::test]
    async fn test_stale_sample_is_still_served() {
        let provider = ScriptedProvider::new(11);
        let cache = cache(&provider, Duration::ZERO);

        let first = cache.read().await.unwrap();
        let second = cache.read().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_back_to_back_refresh_fetches_once() {
        let provider = ScriptedProvider::new(5);
        let cache = cache(&provider, Duration::from_secs(60));

        let first = cache.refresh().await.unwrap();
        let second = cache.refresh().await.unwrap();

        assert!(first.was_fetched());
        assert!(!second.was_fetched());
        assert!(Arc::ptr_eq(first.sample(), second.sample()));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_fetches() {
        let provider = ScriptedProvider::new(5);
        provider.push(Ok(fee(1)));
        provider.push(Ok(fee(2)));
        let cache = cache(&provider, Duration::ZERO);

        assert_eq!(cache.refresh().await.unwrap().sample().value, U256::from(1u64));
        assert_eq!(cache.refresh().await.unwrap().sample().value, U256::from(2u64));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_on_empty_cache() {
        let provider = ScriptedProvider::new(9);
        provider.push(Err(AppError::provider_call_failed("Failed to fetch fee data")));
        let cache = cache(&provider, Duration::from_secs(60));

        let err = cache.read().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GasPriceUnavailable);
        assert!(cache.current().await.is_none());

        // next read retries
        let sample = cache.read().await.unwrap();
        assert_eq!(sample.value, U256::from(9u64));
        assert_eq!(provider.calls(), 2);
        assert_eq!(cache.stats().await.refresh_failures, 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_sample() {
        let provider = ScriptedProvider::new(0);
        provider.push(Ok(fee(42)));
        provider.push(Err(AppError::provider_call_failed("node down")));
        let cache = cache(&provider, Duration::ZERO);

        cache.refresh().await.unwrap();
        let err = cache.refresh().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GasPriceUnavailable);

        let kept = cache.current().await.unwrap();
        assert_eq!(kept.value, U256::from(42u64));
    }

    #[tokio::test]
    async fn test_absent_gas_price_is_an_error() {
        let provider = ScriptedProvider::new(3);
        provider.push(Ok(FeeData::default()));
        let cache = cache(&provider, Duration::from_secs(60));

        let err = cache.refresh().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GasPriceUnavailable);
        assert!(err.message.contains("absent"));
        assert!(cache.current().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_reads_coalesce() {
        let provider = ScriptedProvider::new(77);
        let cache = Arc::new(cache(&provider, Duration::from_secs(60)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.read().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().value, U256::from(77u64));
        }
        assert_eq!(provider.calls(), 1);
    }
}
