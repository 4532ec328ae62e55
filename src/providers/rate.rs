use crate::core::{CurrencyRateSource, FetchError, RateProvider};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Body shape shared by the exchange-rate sources: `{"rates": {"IDR": 16000.0}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct RatesBody {
    rates: Option<HashMap<String, f64>>,
}

pub(crate) fn extract_rate(source_name: &str, body: RatesBody, to: &str) -> Result<f64, FetchError> {
    let rates = body
        .rates
        .ok_or_else(|| FetchError::malformed(source_name, "missing rates object"))?;
    let rate = rates
        .get(to)
        .copied()
        .ok_or_else(|| FetchError::malformed(source_name, format!("no {to} rate in response")))?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(FetchError::malformed(
            source_name,
            format!("{to} rate must be positive, got {rate}"),
        ));
    }
    Ok(rate)
}

/// Tries each source in order for the USD to target rate and falls back to
/// a fixed default when all of them fail.
pub struct FallbackRateProvider {
    sources: Vec<Arc<dyn CurrencyRateSource>>,
    target_currency: String,
    default_rate: f64,
}

impl FallbackRateProvider {
    pub fn new(
        sources: Vec<Arc<dyn CurrencyRateSource>>,
        target_currency: &str,
        default_rate: f64,
    ) -> Self {
        Self {
            sources,
            target_currency: target_currency.to_string(),
            default_rate,
        }
    }

    /// Like [`RateProvider::fetch_rate`] but reports exhaustion instead of
    /// substituting the default.
    pub async fn try_fetch_rate(&self) -> Result<f64, FetchError> {
        for source in &self.sources {
            match source.get_rate("USD", &self.target_currency).await {
                Ok(rate) => {
                    debug!(source = source.name(), rate, "Got exchange rate");
                    return Ok(rate);
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Exchange rate source failed");
                }
            }
        }
        Err(FetchError::AllSourcesExhausted {
            chain: "exchange rate".to_string(),
        })
    }
}

#[async_trait]
impl RateProvider for FallbackRateProvider {
    async fn fetch_rate(&self) -> f64 {
        match self.try_fetch_rate().await {
            Ok(rate) => rate,
            Err(e) => {
                warn!(error = %e, default = self.default_rate, "Using default exchange rate");
                self.default_rate
            }
        }
    }

    fn default_rate(&self) -> f64 {
        self.default_rate
    }
}
