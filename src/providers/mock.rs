use crate::core::quote::{CommodityQuote, FetchMethod, QuoteSource, ounce_to_gram, round_to};
use chrono::Utc;
use rand::Rng;
use tracing::info;

pub const REFERENCE_GOLD_OUNCE_USD: f64 = 1950.75;
pub const REFERENCE_SILVER_OUNCE_USD: f64 = 23.42;
pub const REFERENCE_OIL_USD: f64 = 78.30;

const GOLD_JITTER: f64 = 10.0;
const SILVER_JITTER: f64 = 0.25;
const OIL_JITTER: f64 = 1.0;

/// Synthesizes plausible quotes around fixed reference prices.
///
/// The jitter is for display only; output never tracks the live baseline.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        MockGenerator
    }

    pub fn synthesize(&self) -> CommodityQuote {
        self.synthesize_with(&mut rand::rng())
    }

    pub fn synthesize_with<R: Rng>(&self, rng: &mut R) -> CommodityQuote {
        info!("Using synthetic commodity prices");

        let gold_ounce = round_to(
            REFERENCE_GOLD_OUNCE_USD + rng.random_range(-GOLD_JITTER..=GOLD_JITTER),
            2,
        );
        let silver_ounce = round_to(
            REFERENCE_SILVER_OUNCE_USD + rng.random_range(-SILVER_JITTER..=SILVER_JITTER),
            2,
        );
        let oil = round_to(
            REFERENCE_OIL_USD + rng.random_range(-OIL_JITTER..=OIL_JITTER),
            2,
        );

        CommodityQuote {
            success: false,
            gold_gram_usd: ounce_to_gram(gold_ounce),
            gold_ounce_usd: gold_ounce,
            silver_gram_usd: ounce_to_gram(silver_ounce),
            silver_ounce_usd: silver_ounce,
            oil_usd: oil,
            timestamp: Utc::now(),
            source: QuoteSource::Mock,
            method: FetchMethod::Unknown,
        }
    }
}
