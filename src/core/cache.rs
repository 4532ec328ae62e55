use crate::core::snapshot::{PriceBaseline, PriceSnapshot};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Everything the cache publishes in one swap.
#[derive(Debug, Clone)]
pub struct CachedPrices {
    pub snapshot: Arc<PriceSnapshot>,
    pub baseline: PriceBaseline,
    /// When the last refresh cycle replaced the contents; `None` while the
    /// seed is still being served.
    pub replaced_at: Option<DateTime<Utc>>,
}

/// Holds the current snapshot and its baseline.
///
/// Writers publish a new `Arc` through a watch channel, so a reader gets
/// either the old pair or the new pair, never a mix.
pub struct SnapshotCache {
    tx: watch::Sender<Arc<CachedPrices>>,
}

impl SnapshotCache {
    pub fn new(seed: PriceSnapshot, baseline: PriceBaseline) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(CachedPrices {
            snapshot: Arc::new(seed),
            baseline,
            replaced_at: None,
        }));
        Self { tx }
    }

    pub fn read(&self) -> Arc<PriceSnapshot> {
        Arc::clone(&self.tx.borrow().snapshot)
    }

    pub fn baseline(&self) -> PriceBaseline {
        self.tx.borrow().baseline
    }

    pub fn replaced_at(&self) -> Option<DateTime<Utc>> {
        self.tx.borrow().replaced_at
    }

    /// Reads snapshot, baseline and replacement time from the same generation.
    pub fn entry(&self) -> Arc<CachedPrices> {
        Arc::clone(&*self.tx.borrow())
    }

    pub fn replace(&self, snapshot: PriceSnapshot, baseline: PriceBaseline) -> Arc<PriceSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.tx.send_replace(Arc::new(CachedPrices {
            snapshot: Arc::clone(&snapshot),
            baseline,
            replaced_at: Some(Utc::now()),
        }));
        debug!(last_update = %snapshot.last_update, "Cache REPLACE");
        snapshot
    }

    /// Receiver that wakes on every [`SnapshotCache::replace`].
    pub fn subscribe(&self) -> watch::Receiver<Arc<CachedPrices>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SnapshotCache {
        let seed = PriceSnapshot::seed(15500.0, "IDR").unwrap();
        SnapshotCache::new(seed, PriceBaseline::seed())
    }

    #[test]
    fn test_read_before_any_refresh_returns_seed() {
        let cache = seeded();
        let snapshot = cache.read();
        assert_eq!(snapshot.gold.gram_usd, 62.71);
        assert_eq!(snapshot.usd_to_target_rate, 15500.0);
        assert!(cache.replaced_at().is_none());
        assert_eq!(cache.baseline(), PriceBaseline::seed());
    }

    #[test]
    fn test_replace_swaps_snapshot_and_baseline_together() {
        let cache = seeded();
        let held = cache.read();

        let mut next = PriceSnapshot::seed(16000.0, "IDR").unwrap();
        next.gold.gram_usd = 64.0;
        next.gold.gram_idr = 1_024_000;
        let baseline = next.baseline();
        cache.replace(next, baseline);

        // Readers holding the old Arc keep a consistent old view.
        assert_eq!(held.usd_to_target_rate, 15500.0);

        let entry = cache.entry();
        assert_eq!(entry.snapshot.usd_to_target_rate, 16000.0);
        assert_eq!(entry.baseline.gold_gram_usd, 64.0);
        assert!(entry.replaced_at.is_some());
    }

    #[tokio::test]
    async fn test_subscribers_see_replacements() {
        let cache = seeded();
        let mut rx = cache.subscribe();

        let next = PriceSnapshot::seed(15000.0, "IDR").unwrap();
        let baseline = next.baseline();
        cache.replace(next, baseline);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().snapshot.usd_to_target_rate, 15000.0);
    }
}
