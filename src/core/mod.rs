//! Core business logic abstractions

pub mod cache;
pub mod change;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod price;
pub mod quote;
pub mod snapshot;

// Re-export main types for cleaner imports
pub use cache::SnapshotCache;
pub use currency::{CurrencyRateSource, RateProvider};
pub use error::{CycleError, FetchError};
pub use price::{CommodityProvider, QuoteTier};
pub use quote::{CommodityQuote, FetchMethod, QuoteSource};
pub use snapshot::{PriceBaseline, PriceSnapshot};
