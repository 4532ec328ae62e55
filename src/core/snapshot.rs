//! The published price snapshot and the baseline it is compared against

use crate::core::change::percent_change;
use crate::core::error::CycleError;
use crate::core::quote::{CommodityQuote, FetchMethod, GRAMS_PER_TROY_OUNCE, QuoteSource, round_to};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SEED_GOLD_GRAM_USD: f64 = 62.71;
pub const SEED_SILVER_GRAM_USD: f64 = 0.753;
pub const SEED_OIL_USD: f64 = 78.30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalPrice {
    pub gram_usd: f64,
    pub gram_idr: i64,
    pub ounce_usd: f64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OilPrice {
    pub usd: f64,
    pub idr: i64,
    pub change_pct: f64,
}

/// Complete, self-consistent set of prices served to readers.
///
/// The `*_idr` fields carry amounts in `target_currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub gold: MetalPrice,
    pub silver: MetalPrice,
    pub oil: OilPrice,
    pub usd_to_target_rate: f64,
    pub target_currency: String,
    pub last_update: DateTime<Utc>,
    pub quoted_at: DateTime<Utc>,
    pub source: QuoteSource,
    pub success: bool,
    pub method: FetchMethod,
}

/// Raw USD readings from the previous cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBaseline {
    pub gold_gram_usd: f64,
    pub silver_gram_usd: f64,
    pub oil_usd: f64,
}

impl PriceBaseline {
    pub fn seed() -> Self {
        Self {
            gold_gram_usd: SEED_GOLD_GRAM_USD,
            silver_gram_usd: SEED_SILVER_GRAM_USD,
            oil_usd: SEED_OIL_USD,
        }
    }

    pub fn from_quote(quote: &CommodityQuote) -> Self {
        Self {
            gold_gram_usd: quote.gold_gram_usd,
            silver_gram_usd: quote.silver_gram_usd,
            oil_usd: quote.oil_usd,
        }
    }
}

fn checked_price(field: &'static str, value: f64) -> Result<f64, CycleError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CycleError::InvalidPrice { field, value })
    }
}

fn to_target(field: &'static str, usd: f64, rate: f64) -> Result<i64, CycleError> {
    let value = (usd * rate).round();
    if !value.is_finite() || value >= i64::MAX as f64 {
        return Err(CycleError::Overflow { field, value });
    }
    Ok(value as i64)
}

impl PriceSnapshot {
    /// Derives a snapshot from a fresh quote, the exchange rate, and the
    /// previous cycle's baseline.
    ///
    /// Fails without side effects on negative or non-finite prices or a
    /// non-positive rate.
    pub fn assemble(
        quote: &CommodityQuote,
        rate: f64,
        target_currency: &str,
        baseline: &PriceBaseline,
    ) -> Result<Self, CycleError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CycleError::InvalidRate(rate));
        }

        let gold_gram = checked_price("gold.gram_usd", quote.gold_gram_usd)?;
        let gold_ounce = checked_price("gold.ounce_usd", quote.gold_ounce_usd)?;
        let silver_gram = checked_price("silver.gram_usd", quote.silver_gram_usd)?;
        let silver_ounce = checked_price("silver.ounce_usd", quote.silver_ounce_usd)?;
        let oil = checked_price("oil.usd", quote.oil_usd)?;

        Ok(Self {
            gold: MetalPrice {
                gram_usd: gold_gram,
                gram_idr: to_target("gold.gram_idr", gold_gram, rate)?,
                ounce_usd: gold_ounce,
                change_pct: percent_change(gold_gram, Some(baseline.gold_gram_usd)),
            },
            silver: MetalPrice {
                gram_usd: silver_gram,
                gram_idr: to_target("silver.gram_idr", silver_gram, rate)?,
                ounce_usd: silver_ounce,
                change_pct: percent_change(silver_gram, Some(baseline.silver_gram_usd)),
            },
            oil: OilPrice {
                usd: oil,
                idr: to_target("oil.idr", oil, rate)?,
                change_pct: percent_change(oil, Some(baseline.oil_usd)),
            },
            usd_to_target_rate: rate,
            target_currency: target_currency.to_string(),
            last_update: Utc::now(),
            quoted_at: quote.timestamp,
            source: quote.source,
            success: quote.success,
            method: quote.method,
        })
    }

    /// The snapshot served before the first refresh completes.
    pub fn seed(rate: f64, target_currency: &str) -> Result<Self, CycleError> {
        let quote = CommodityQuote {
            success: false,
            gold_gram_usd: SEED_GOLD_GRAM_USD,
            gold_ounce_usd: round_to(SEED_GOLD_GRAM_USD * GRAMS_PER_TROY_OUNCE, 2),
            silver_gram_usd: SEED_SILVER_GRAM_USD,
            silver_ounce_usd: round_to(SEED_SILVER_GRAM_USD * GRAMS_PER_TROY_OUNCE, 2),
            oil_usd: SEED_OIL_USD,
            timestamp: Utc::now(),
            source: QuoteSource::Mock,
            method: FetchMethod::Unknown,
        };
        // The seed is its own baseline, so every change reads 0.
        Self::assemble(&quote, rate, target_currency, &PriceBaseline::from_quote(&quote))
    }

    /// Baseline for the next cycle: the raw values behind this snapshot.
    pub fn baseline(&self) -> PriceBaseline {
        PriceBaseline {
            gold_gram_usd: self.gold.gram_usd,
            silver_gram_usd: self.silver.gram_usd,
            oil_usd: self.oil.usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(gold_gram: f64, silver_gram: f64, oil: f64) -> CommodityQuote {
        CommodityQuote {
            success: true,
            gold_gram_usd: gold_gram,
            gold_ounce_usd: gold_gram * 31.1034768,
            silver_gram_usd: silver_gram,
            silver_ounce_usd: silver_gram * 31.1034768,
            oil_usd: oil,
            timestamp: Utc::now(),
            source: QuoteSource::Live,
            method: FetchMethod::QueryParameter,
        }
    }

    #[test]
    fn test_assemble_computes_changes_and_target_amounts() {
        let snapshot =
            PriceSnapshot::assemble(&quote(63.96, 0.753, 80.0), 16000.0, "IDR", &PriceBaseline::seed())
                .unwrap();

        assert_eq!(snapshot.gold.change_pct, 1.99);
        assert_eq!(snapshot.gold.gram_idr, 1_023_360);
        assert_eq!(snapshot.silver.gram_idr, 12_048);
        assert_eq!(snapshot.silver.change_pct, 0.0);
        assert_eq!(snapshot.oil.idr, 1_280_000);
        assert_eq!(snapshot.oil.change_pct, 2.17);
        assert_eq!(snapshot.method, FetchMethod::QueryParameter);
        assert!(snapshot.success);
    }

    #[test]
    fn test_seed_target_amounts_are_rounded() {
        let seed = PriceSnapshot::seed(15500.0, "IDR").unwrap();
        assert_eq!(seed.gold.gram_idr, (62.71f64 * 15500.0).round() as i64);
        assert_eq!(seed.silver.gram_idr, (0.753f64 * 15500.0).round() as i64);
        assert_eq!(seed.oil.idr, (78.30f64 * 15500.0).round() as i64);
        assert_eq!(seed.gold.change_pct, 0.0);
        assert_eq!(seed.source, QuoteSource::Mock);
        assert_eq!(seed.baseline(), PriceBaseline::seed());
    }

    #[test]
    fn test_assemble_rejects_bad_inputs() {
        let baseline = PriceBaseline::seed();
        assert!(matches!(
            PriceSnapshot::assemble(&quote(63.0, 0.7, 80.0), 0.0, "IDR", &baseline),
            Err(CycleError::InvalidRate(_))
        ));
        assert!(matches!(
            PriceSnapshot::assemble(&quote(-1.0, 0.7, 80.0), 15500.0, "IDR", &baseline),
            Err(CycleError::InvalidPrice { field: "gold.gram_usd", .. })
        ));
        assert!(PriceSnapshot::assemble(&quote(63.0, 0.7, f64::NAN), 15500.0, "IDR", &baseline).is_err());
    }

    #[test]
    fn test_target_amount_past_i64_range_overflows() {
        // 2^63 is the nearest f64 to i64::MAX and does not fit.
        let edge = 9_223_372_036_854_775_808.0;
        assert!(matches!(
            to_target("oil.usd", edge, 1.0),
            Err(CycleError::Overflow { field: "oil.usd", .. })
        ));
        assert_eq!(to_target("oil.usd", 78.3, 15500.0).unwrap(), 1_213_650);
    }
}
