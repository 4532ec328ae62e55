use crate::core::{CurrencyRateSource, FetchError};
use crate::providers::rate::{RatesBody, extract_rate};
use crate::providers::util::{build_url, get_json, http_client};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Primary exchange-rate source: `GET /latest?from=USD&to=IDR`.
pub struct FrankfurterProvider {
    base_url: String,
    client: Client,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        Ok(FrankfurterProvider {
            base_url: base_url.to_string(),
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl CurrencyRateSource for FrankfurterProvider {
    fn name(&self) -> &str {
        "frankfurter"
    }

    #[instrument(name = "FrankfurterRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, FetchError> {
        let url = build_url(
            self.name(),
            &self.base_url,
            "/latest",
            &[("from", from), ("to", to)],
        )?;
        debug!("Requesting currency rate from {}", url);

        let body: RatesBody = get_json(self.name(), self.client.get(url)).await?;
        extract_rate(self.name(), body, to)
    }
}
