//! Refresh cycles and the timer that repeats them

use crate::core::snapshot::{PriceBaseline, PriceSnapshot};
use crate::core::{CommodityProvider, CycleError, RateProvider, SnapshotCache};
use crate::providers::MockGenerator;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{error, info, warn};

/// Aborts the fetch tasks of a cycle that is dropped before they finish.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

pub struct RefreshScheduler {
    rate_provider: Arc<dyn RateProvider>,
    commodity_provider: Arc<dyn CommodityProvider>,
    cache: Arc<SnapshotCache>,
    target_currency: String,
    mock: MockGenerator,
    // Held for the whole cycle so forced and timed refreshes never overlap.
    cycle_lock: tokio::sync::Mutex<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(
        rate_provider: Arc<dyn RateProvider>,
        commodity_provider: Arc<dyn CommodityProvider>,
        cache: Arc<SnapshotCache>,
        target_currency: &str,
    ) -> Self {
        Self {
            rate_provider,
            commodity_provider,
            cache,
            target_currency: target_currency.to_string(),
            mock: MockGenerator::new(),
            cycle_lock: tokio::sync::Mutex::new(()),
            task: Mutex::new(None),
        }
    }

    /// Runs one refresh and returns the snapshot served afterwards.
    ///
    /// If the cycle cannot build a valid snapshot, the previous one stays in
    /// the cache and is returned.
    pub async fn run_cycle(&self) -> Arc<PriceSnapshot> {
        let _guard = self.cycle_lock.lock().await;
        match self.try_cycle().await {
            Ok(snapshot) => {
                info!(
                    gold_gram_usd = snapshot.gold.gram_usd,
                    silver_gram_usd = snapshot.silver.gram_usd,
                    oil_usd = snapshot.oil.usd,
                    rate = snapshot.usd_to_target_rate,
                    source = %snapshot.source,
                    method = %snapshot.method,
                    "Prices refreshed"
                );
                snapshot
            }
            Err(e) => {
                error!(error = %e, "Refresh cycle aborted, keeping previous snapshot");
                self.cache.read()
            }
        }
    }

    async fn try_cycle(&self) -> Result<Arc<PriceSnapshot>, CycleError> {
        let rate_provider = Arc::clone(&self.rate_provider);
        let rate_task = tokio::spawn(async move { rate_provider.fetch_rate().await });
        let commodity_provider = Arc::clone(&self.commodity_provider);
        let commodity_task =
            tokio::spawn(async move { commodity_provider.fetch_commodities().await });
        let _fetches = AbortOnDrop(vec![rate_task.abort_handle(), commodity_task.abort_handle()]);

        let (rate, quote) = futures::future::join(rate_task, commodity_task).await;
        let rate = rate.unwrap_or_else(|e| {
            warn!(error = %e, "Exchange rate task failed, using default rate");
            self.rate_provider.default_rate()
        });
        let quote = quote.unwrap_or_else(|e| {
            warn!(error = %e, "Commodity task failed, using synthetic prices");
            self.mock.synthesize()
        });

        let baseline = self.cache.baseline();
        let snapshot = PriceSnapshot::assemble(&quote, rate, &self.target_currency, &baseline)?;
        // Synthetic readings become the baseline too.
        let next_baseline = PriceBaseline::from_quote(&quote);
        Ok(self.cache.replace(snapshot, next_baseline))
    }

    /// Runs the first cycle before returning, then repeats it every
    /// `interval` on a background task. The timer re-arms only after a cycle
    /// finishes. Calling `start` again replaces the running loop.
    pub async fn start(self: &Arc<Self>, interval: Duration) -> Arc<PriceSnapshot> {
        let first = self.run_cycle().await;

        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                scheduler.run_cycle().await;
            }
        });

        let previous = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        info!(interval_secs = interval.as_secs(), "Auto-refresh scheduled");
        first
    }

    /// Cancels the repeating task. A cycle already in flight is dropped at
    /// its next await point along with its pending fetches; the cache keeps
    /// whatever was last published.
    pub fn stop(&self) {
        let handle = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
            info!("Auto-refresh stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
