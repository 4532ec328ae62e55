//! Currency conversion abstractions

use crate::core::error::FetchError;
use async_trait::async_trait;

/// One upstream source of exchange rates.
#[async_trait]
pub trait CurrencyRateSource: Send + Sync {
    fn name(&self) -> &str;

    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, FetchError>;
}

/// Always yields a usable USD rate for the configured target currency.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rate(&self) -> f64;

    /// Rate substituted when a fetch cannot complete at all.
    fn default_rate(&self) -> f64;
}
