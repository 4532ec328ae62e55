//! Commodity quote types and unit conversion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Grams in one troy ounce.
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1034768;

/// Rounds `value` to `places` decimal digits.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Converts a per-troy-ounce price to a per-gram price rounded to 3 decimals.
pub fn ounce_to_gram(ounce_price: f64) -> f64 {
    round_to(ounce_price / GRAMS_PER_TROY_OUNCE, 3)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteSource {
    Live,
    Mock,
}

impl Display for QuoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                QuoteSource::Live => "CommodityPriceAPI",
                QuoteSource::Mock => "Mock Data",
            }
        )
    }
}

/// Which strategy of the commodity chain produced a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMethod {
    QueryParameter,
    Header,
    V1Endpoint,
    Unknown,
}

impl Display for FetchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FetchMethod::QueryParameter => "query-parameter",
                FetchMethod::Header => "header",
                FetchMethod::V1Endpoint => "v1-endpoint",
                FetchMethod::Unknown => "unknown",
            }
        )
    }
}

/// One reading of gold, silver and oil in USD, consumed once by a refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityQuote {
    pub success: bool,
    pub gold_gram_usd: f64,
    pub gold_ounce_usd: f64,
    pub silver_gram_usd: f64,
    pub silver_ounce_usd: f64,
    pub oil_usd: f64,
    pub timestamp: DateTime<Utc>,
    pub source: QuoteSource,
    pub method: FetchMethod,
}

impl CommodityQuote {
    /// Builds a live quote from per-ounce metal prices and a per-barrel oil price.
    pub fn live(
        gold_ounce_usd: f64,
        silver_ounce_usd: f64,
        oil_usd: f64,
        timestamp: DateTime<Utc>,
        method: FetchMethod,
    ) -> Self {
        Self {
            success: true,
            gold_gram_usd: ounce_to_gram(gold_ounce_usd),
            gold_ounce_usd,
            silver_gram_usd: ounce_to_gram(silver_ounce_usd),
            silver_ounce_usd,
            oil_usd,
            timestamp,
            source: QuoteSource::Live,
            method,
        }
    }
}
