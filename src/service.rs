//! The surface consumers talk to: current prices, forced refresh, liveness

use crate::core::config::{AppConfig, RATE_TIMEOUT};
use crate::core::quote::QuoteSource;
use crate::core::snapshot::{PriceBaseline, PriceSnapshot};
use crate::core::{CommodityProvider, CurrencyRateSource, RateProvider, SnapshotCache};
use crate::providers::{
    ExchangeRateApiProvider, FallbackCommodityProvider, FallbackRateProvider, FrankfurterProvider,
};
use crate::scheduler::RefreshScheduler;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub uptime_secs: u64,
    /// Time of the last successful cache replacement.
    pub last_update: Option<DateTime<Utc>>,
    pub source: QuoteSource,
    pub api_key_set: bool,
}

pub struct PriceService {
    cache: Arc<SnapshotCache>,
    scheduler: Arc<RefreshScheduler>,
    api_key_set: bool,
    started_at: Instant,
}

impl PriceService {
    pub fn new(
        rate_provider: Arc<dyn RateProvider>,
        commodity_provider: Arc<dyn CommodityProvider>,
        target_currency: &str,
        api_key_set: bool,
    ) -> Result<Self> {
        let seed = PriceSnapshot::seed(rate_provider.default_rate(), target_currency)
            .context("Failed to build seed snapshot")?;
        let cache = Arc::new(SnapshotCache::new(seed, PriceBaseline::seed()));
        let scheduler = Arc::new(RefreshScheduler::new(
            rate_provider,
            commodity_provider,
            Arc::clone(&cache),
            target_currency,
        ));
        Ok(Self {
            cache,
            scheduler,
            api_key_set,
            started_at: Instant::now(),
        })
    }

    /// Wires the real upstream providers described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let providers = &config.providers;
        let sources: Vec<Arc<dyn CurrencyRateSource>> = vec![
            Arc::new(
                FrankfurterProvider::new(
                    &providers.frankfurter.base_url,
                    providers.frankfurter.timeout_or(RATE_TIMEOUT),
                )
                .context("Failed to create Frankfurter client")?,
            ),
            Arc::new(
                ExchangeRateApiProvider::new(
                    &providers.exchangerate_api.base_url,
                    providers.exchangerate_api.timeout_or(RATE_TIMEOUT),
                )
                .context("Failed to create ExchangeRate-API client")?,
            ),
        ];
        let rate_provider = Arc::new(FallbackRateProvider::new(
            sources,
            &config.target_currency,
            config.default_rate,
        ));

        let commodity_provider = FallbackCommodityProvider::from_config(config)
            .context("Failed to create commodity price client")?;
        let api_key_set = commodity_provider.has_credential();

        Self::new(
            rate_provider,
            Arc::new(commodity_provider),
            &config.target_currency,
            api_key_set,
        )
    }

    pub fn current(&self) -> Arc<PriceSnapshot> {
        self.cache.read()
    }

    pub async fn refresh(&self) -> Arc<PriceSnapshot> {
        self.scheduler.run_cycle().await
    }

    /// Runs the readiness cycle and keeps refreshing every `interval`.
    pub async fn start(&self, interval: Duration) -> Arc<PriceSnapshot> {
        self.scheduler.start(interval).await
    }

    pub fn stop(&self) {
        self.scheduler.stop();
    }

    pub fn health(&self) -> HealthStatus {
        let entry = self.cache.entry();
        HealthStatus {
            status: "healthy",
            uptime_secs: self.started_at.elapsed().as_secs(),
            last_update: entry.replaced_at,
            source: entry.snapshot.source,
            api_key_set: self.api_key_set,
        }
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }
}
