//! Provider abstractions for commodity quotes

use crate::core::error::FetchError;
use crate::core::quote::CommodityQuote;
use async_trait::async_trait;

/// One strategy in a commodity fallback chain. May fail.
#[async_trait]
pub trait QuoteTier: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_quote(&self) -> Result<CommodityQuote, FetchError>;
}

/// Produces a commodity quote no matter what, degrading to synthetic data.
#[async_trait]
pub trait CommodityProvider: Send + Sync {
    async fn fetch_commodities(&self) -> CommodityQuote;
}
