//! Periodic gas price refresh.
//!
//! Each tick runs on its own task, owned by the loop's `JoinSet`, so aborting
//! the loop also cancels a tick still in flight. A tick that finds a refresh
//! in flight is skipped, and a failed refresh is logged and forgotten; the
//! guard is a mutex guard, so it is released on every exit path.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::core::gas_cache::{GasPriceCache, RefreshOutcome};

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another refresh held the guard
    Skipped,
    /// Sample younger than the TTL, nothing fetched
    Fresh,
    /// New sample stored
    Updated,
    /// Provider failed; previous sample kept
    Failed,
}

pub struct RefreshCoordinator {
    cache: Arc<GasPriceCache>,
    interval: Duration,
}

impl RefreshCoordinator {
    pub fn new(cache: Arc<GasPriceCache>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// One periodic refresh attempt; never returns an error
    pub async fn tick(&self) -> TickOutcome {
        match self.cache.try_refresh().await {
            None => TickOutcome::Skipped,
            Some(Ok(RefreshOutcome::StillFresh(_))) => TickOutcome::Fresh,
            Some(Ok(RefreshOutcome::Fetched(_))) => TickOutcome::Updated,
            Some(Err(e)) => {
                warn!("⚠️ Scheduled gas price refresh failed: {}", e);
                TickOutcome::Failed
            }
        }
    }

    /// Start the timer loop; abort the handle to stop it
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        info!("⏱️ Gas price refresh every {}ms", self.interval.as_millis());
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks = JoinSet::new();
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let this = self.clone();
                        ticks.spawn(async move {
                            let outcome = this.tick().await;
                            debug!(?outcome, "Gas price refresh tick");
                        });
                    }
                    Some(joined) = ticks.join_next() => {
                        if let Err(e) = joined {
                            warn!("⚠️ Gas price refresh tick panicked: {}", e);
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::{AppError, AppResult};
    use crate::models::types::{FeeData, PairReserves};
    use crate::providers::chain::ChainDataProvider;
    use alloy_primitives::{Address, U256};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// First fetch parks until `release` is notified
    struct GatedProvider {
        calls: AtomicUsize,
        fail_next: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    impl GatedProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_next: AtomicBool::new(false),
                entered: Notify::new(),
                release: Notify::new(),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChainDataProvider for GatedProvider {
        async fn fetch_fee_data(&self) -> AppResult<FeeData> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                self.entered.notify_one();
                self.release.notified().await;
            }
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(AppError::provider_call_failed("Failed to fetch fee data"));
            }
            Ok(FeeData {
                gas_price: Some(U256::from(100 + n as u64)),
                ..Default::default()
            })
        }

        async fn resolve_pair_address(&self, _: Address, _: Address) -> AppResult<Address> {
            Ok(Address::ZERO)
        }

        async fn fetch_pair_reserves(&self, _: Address) -> AppResult<PairReserves> {
            Err(AppError::provider_call_failed("unused"))
        }
    }

    fn coordinator(provider: &Arc<GatedProvider>, ttl: Duration) -> Arc<RefreshCoordinator> {
        let cache = Arc::new(GasPriceCache::new(provider.clone(), ttl));
        Arc::new(RefreshCoordinator::new(cache, Duration::from_millis(1_000)))
    }

    #[tokio::test]
    async fn test_tick_skipped_while_refresh_in_flight() {
        let provider = GatedProvider::new();
        let coordinator = coordinator(&provider, Duration::ZERO);

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.tick().await })
        };
        provider.entered.notified().await;

        assert_eq!(coordinator.tick().await, TickOutcome::Skipped);
        assert_eq!(provider.calls(), 1);

        provider.release.notify_one();
        assert_eq!(first.await.unwrap(), TickOutcome::Updated);

        // guard released after success
        assert_eq!(coordinator.tick().await, TickOutcome::Updated);
        assert_eq!(provider.calls(), 2);
        assert_eq!(coordinator.cache.stats().await.skipped_refreshes, 1);
    }

    #[tokio::test]
    async fn test_guard_released_after_failure() {
        let provider = GatedProvider::new();
        provider.fail_next.store(true, Ordering::SeqCst);
        provider.release.notify_one();
        let coordinator = coordinator(&provider, Duration::ZERO);

        assert_eq!(coordinator.tick().await, TickOutcome::Failed);
        assert!(coordinator.cache.current().await.is_none());

        assert_eq!(coordinator.tick().await, TickOutcome::Updated);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_fresh_sample_not_refetched() {
        let provider = GatedProvider::new();
        provider.release.notify_one();
        let coordinator = coordinator(&provider, Duration::from_secs(60));

        assert_eq!(coordinator.tick().await, TickOutcome::Updated);
        assert_eq!(coordinator.tick().await, TickOutcome::Fresh);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_on_demand_read_waits_for_scheduled_refresh() {
        let provider = GatedProvider::new();
        let coordinator = coordinator(&provider, Duration::from_secs(60));

        let scheduled = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.tick().await })
        };
        provider.entered.notified().await;

        let reader = {
            let cache = coordinator.cache.clone();
            tokio::spawn(async move { cache.read().await })
        };
        tokio::task::yield_now().await;

        provider.release.notify_one();
        assert_eq!(scheduled.await.unwrap(), TickOutcome::Updated);
        let sample = reader.await.unwrap().unwrap();

        assert_eq!(sample.value, U256::from(100u64));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_refreshes() {
        let provider = GatedProvider::new();
        provider.release.notify_one();
        let coordinator = coordinator(&provider, Duration::ZERO);

        let handle = coordinator.clone().spawn();
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(1_000)).await;
            tokio::task::yield_now().await;
        }
        handle.abort();

        assert!(provider.calls() >= 2);
        assert!(coordinator.cache.current().await.is_some());
    }

    #[tokio::test]
    async fn test_abort_cancels_in_flight_tick() {
        let provider = GatedProvider::new();
        let coordinator = coordinator(&provider, Duration::ZERO);

        let handle = coordinator.clone().spawn();
        provider.entered.notified().await;

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        // the parked tick was dropped with the loop: nothing stored, guard free
        assert_eq!(provider.calls(), 1);
        assert!(coordinator.cache.current().await.is_none());
        assert!(coordinator.cache.try_refresh().await.is_some());
    }
}
