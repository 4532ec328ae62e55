//! CommodityPriceAPI client and the tiered fallback chain built on it

use crate::core::config::{AppConfig, COMMODITY_TIMEOUT};
use crate::core::quote::{CommodityQuote, FetchMethod};
use crate::core::{CommodityProvider, FetchError, QuoteTier};
use crate::providers::mock::MockGenerator;
use crate::providers::util::{build_url, get_json, http_client};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const SYMBOLS: &str = "XAU,XAG,WTI";

#[derive(Debug, Deserialize)]
struct NestedRates {
    rates: Option<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RatesEnvelope {
    success: Option<bool>,
    message: Option<String>,
    rates: Option<HashMap<String, Value>>,
    data: Option<NestedRates>,
    timestamp: Option<i64>,
}

impl RatesEnvelope {
    /// Top-level `rates`, or `data.rates` when the top level has none.
    fn rates(&self) -> Option<&HashMap<String, Value>> {
        self.rates
            .as_ref()
            .or_else(|| self.data.as_ref().and_then(|d| d.rates.as_ref()))
    }
}

fn required_price(
    source_name: &str,
    rates: &HashMap<String, Value>,
    symbol: &str,
) -> Result<f64, FetchError> {
    let price = rates
        .get(symbol)
        .and_then(Value::as_f64)
        .ok_or_else(|| FetchError::malformed(source_name, format!("no numeric {symbol} rate")))?;
    if !price.is_finite() || price <= 0.0 {
        return Err(FetchError::malformed(
            source_name,
            format!("{symbol} rate must be positive, got {price}"),
        ));
    }
    Ok(price)
}

/// One way of authenticating against CommodityPriceAPI.
pub struct CommodityApiTier {
    base_url: String,
    api_key: String,
    client: Client,
    method: FetchMethod,
    name: String,
}

impl CommodityApiTier {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        method: FetchMethod,
    ) -> Result<Self, FetchError> {
        Ok(CommodityApiTier {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            client: http_client(timeout)?,
            method,
            name: format!("commodity-api/{method}"),
        })
    }

    /// Tiers in the order they are tried: query-parameter key, header key,
    /// legacy v1 endpoint.
    pub fn chain(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Vec<Arc<dyn QuoteTier>>, FetchError> {
        [
            FetchMethod::QueryParameter,
            FetchMethod::Header,
            FetchMethod::V1Endpoint,
        ]
        .into_iter()
        .map(|method| {
            Self::new(base_url, api_key, timeout, method)
                .map(|tier| Arc::new(tier) as Arc<dyn QuoteTier>)
        })
        .collect()
    }

    fn request(&self) -> Result<reqwest::RequestBuilder, FetchError> {
        let request = match self.method {
            FetchMethod::QueryParameter => {
                let url = build_url(
                    &self.name,
                    &self.base_url,
                    "/v2/rates/latest",
                    &[
                        ("apiKey", self.api_key.as_str()),
                        ("symbols", SYMBOLS),
                        ("base", "USD"),
                    ],
                )?;
                self.client.get(url)
            }
            FetchMethod::Header => {
                let url = build_url(
                    &self.name,
                    &self.base_url,
                    "/v2/rates/latest",
                    &[("symbols", SYMBOLS), ("base", "USD")],
                )?;
                self.client.get(url).header("x-api-key", &self.api_key)
            }
            FetchMethod::V1Endpoint => {
                let url = build_url(
                    &self.name,
                    &self.base_url,
                    "/v1/latest",
                    &[("apikey", self.api_key.as_str()), ("base", "USD")],
                )?;
                self.client.get(url)
            }
            FetchMethod::Unknown => {
                return Err(FetchError::malformed(&self.name, "no request shape for tier"));
            }
        };
        Ok(request)
    }

    fn quote_from(&self, envelope: RatesEnvelope) -> Result<CommodityQuote, FetchError> {
        // The v2 endpoint reports failures in-band; the v1 endpoint has no flag.
        let requires_flag = self.method != FetchMethod::V1Endpoint;
        if requires_flag && envelope.success != Some(true) {
            return Err(FetchError::AuthRejected {
                source_name: self.name.clone(),
                message: envelope
                    .message
                    .clone()
                    .unwrap_or_else(|| "response not marked successful".to_string()),
            });
        }

        let rates = envelope
            .rates()
            .ok_or_else(|| FetchError::malformed(&self.name, "missing rates object"))?;
        let gold = required_price(&self.name, rates, "XAU")?;
        let silver = required_price(&self.name, rates, "XAG")?;
        let oil = required_price(&self.name, rates, "WTI")?;

        let timestamp = if requires_flag {
            envelope
                .timestamp
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .unwrap_or_else(Utc::now)
        } else {
            Utc::now()
        };

        debug!(
            gold_ounce = gold,
            silver_ounce = silver,
            oil_barrel = oil,
            "Parsed commodity rates"
        );
        Ok(CommodityQuote::live(gold, silver, oil, timestamp, self.method))
    }
}

#[async_trait]
impl QuoteTier for CommodityApiTier {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "CommodityTierFetch", skip(self), fields(method = %self.method))]
    async fn fetch_quote(&self) -> Result<CommodityQuote, FetchError> {
        let request = self.request()?;
        let envelope: RatesEnvelope = get_json(&self.name, request).await?;
        self.quote_from(envelope)
    }
}

/// Walks the tiers strictly in order and ends in synthetic data.
pub struct FallbackCommodityProvider {
    tiers: Vec<Arc<dyn QuoteTier>>,
    mock: MockGenerator,
}

impl FallbackCommodityProvider {
    /// An empty `tiers` list means no credential is configured.
    pub fn new(tiers: Vec<Arc<dyn QuoteTier>>, mock: MockGenerator) -> Self {
        Self { tiers, mock }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let endpoint = &config.providers.commodity_api;
        let tiers = match config.api_key() {
            Some(key) => CommodityApiTier::chain(
                &endpoint.base_url,
                key,
                endpoint.timeout_or(COMMODITY_TIMEOUT),
            )?,
            None => Vec::new(),
        };
        Ok(Self::new(tiers, MockGenerator::new()))
    }

    pub fn has_credential(&self) -> bool {
        !self.tiers.is_empty()
    }

    /// Live tiers only; never falls through to synthetic data.
    pub async fn try_fetch_live(&self) -> Result<CommodityQuote, FetchError> {
        if self.tiers.is_empty() {
            return Err(FetchError::MissingCredential {
                source_name: "commodity-api".to_string(),
            });
        }

        for tier in &self.tiers {
            match tier.fetch_quote().await {
                Ok(quote) => {
                    info!(tier = tier.name(), "Commodity prices fetched");
                    return Ok(quote);
                }
                Err(e) => warn!(tier = tier.name(), error = %e, "Commodity tier failed"),
            }
        }
        Err(FetchError::AllSourcesExhausted {
            chain: "commodity".to_string(),
        })
    }
}

#[async_trait]
impl CommodityProvider for FallbackCommodityProvider {
    async fn fetch_commodities(&self) -> CommodityQuote {
        match self.try_fetch_live().await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(error = %e, "Falling back to synthetic commodity prices");
                self.mock.synthesize()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QuoteSource;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "test-key";

    const LIVE_BODY: &str = r#"{
        "success": true,
        "timestamp": 1715337600,
        "rates": {"XAU": 2361.25, "XAG": 28.35, "WTI": 78.91}
    }"#;

    fn provider_for(server: &MockServer) -> FallbackCommodityProvider {
        let tiers = CommodityApiTier::chain(&server.uri(), KEY, Duration::from_secs(2)).unwrap();
        FallbackCommodityProvider::new(tiers, MockGenerator::new())
    }

    async fn mount_query_tier(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/v2/rates/latest"))
            .and(query_param("apiKey", KEY))
            .and(query_param("symbols", SYMBOLS))
            .and(query_param("base", "USD"))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_header_tier(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/v2/rates/latest"))
            .and(header("x-api-key", KEY))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_v1_tier(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .and(query_param("apikey", KEY))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_query_parameter_tier_succeeds_first() {
        let server = MockServer::start().await;
        mount_query_tier(&server, ResponseTemplate::new(200).set_body_string(LIVE_BODY)).await;

        let quote = provider_for(&server).fetch_commodities().await;

        assert!(quote.success);
        assert_eq!(quote.source, QuoteSource::Live);
        assert_eq!(quote.method, FetchMethod::QueryParameter);
        assert_eq!(quote.gold_ounce_usd, 2361.25);
        assert_eq!(quote.gold_gram_usd, 75.916);
        assert_eq!(quote.silver_gram_usd, 0.911);
        assert_eq!(quote.oil_usd, 78.91);
        assert_eq!(quote.timestamp.timestamp(), 1715337600);
    }

    #[tokio::test]
    async fn test_success_false_on_http_200_moves_to_header_tier() {
        let server = MockServer::start().await;
        mount_query_tier(
            &server,
            ResponseTemplate::new(200)
                .set_body_string(r#"{"success": false, "message": "Invalid API key"}"#),
        )
        .await;
        mount_header_tier(&server, ResponseTemplate::new(200).set_body_string(LIVE_BODY)).await;

        let quote = provider_for(&server).fetch_commodities().await;
        assert_eq!(quote.method, FetchMethod::Header);
        assert!(quote.success);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].url.query().unwrap().contains("apiKey="));
        assert!(requests[1].headers.get("x-api-key").is_some());
    }

    #[tokio::test]
    async fn test_missing_success_flag_counts_as_failure() {
        let server = MockServer::start().await;
        mount_query_tier(
            &server,
            ResponseTemplate::new(200)
                .set_body_string(r#"{"rates": {"XAU": 2361.25, "XAG": 28.35, "WTI": 78.91}}"#),
        )
        .await;
        mount_header_tier(&server, ResponseTemplate::new(401)).await;
        mount_v1_tier(&server, ResponseTemplate::new(200).set_body_string(LIVE_BODY)).await;

        let quote = provider_for(&server).fetch_commodities().await;
        assert_eq!(quote.method, FetchMethod::V1Endpoint);
    }

    #[tokio::test]
    async fn test_v1_tier_accepts_nested_rates() {
        let server = MockServer::start().await;
        mount_query_tier(&server, ResponseTemplate::new(401)).await;
        mount_header_tier(&server, ResponseTemplate::new(403)).await;
        mount_v1_tier(
            &server,
            ResponseTemplate::new(200).set_body_string(
                r#"{"data": {"rates": {"XAU": 1989.5, "XAG": 23.42, "WTI": 80.1}}}"#,
            ),
        )
        .await;

        let quote = provider_for(&server).fetch_commodities().await;
        assert!(quote.success);
        assert_eq!(quote.method, FetchMethod::V1Endpoint);
        assert_eq!(quote.gold_gram_usd, 63.964);
        assert_eq!(quote.silver_gram_usd, 0.753);
        assert_eq!(quote.oil_usd, 80.1);
    }

    async fn failing_chain_server() -> MockServer {
        let server = MockServer::start().await;
        mount_query_tier(&server, ResponseTemplate::new(500)).await;
        mount_header_tier(&server, ResponseTemplate::new(200).set_body_string("not json")).await;
        mount_v1_tier(
            &server,
            ResponseTemplate::new(200).set_body_string(r#"{"rates": {"XAU": 1989.5}}"#),
        )
        .await;
        server
    }

    #[tokio::test]
    async fn test_all_tiers_failing_exhausts_chain_once() {
        let server = failing_chain_server().await;
        assert!(matches!(
            provider_for(&server).try_fetch_live().await,
            Err(FetchError::AllSourcesExhausted { .. })
        ));
    }

    #[tokio::test]
    async fn test_all_tiers_failing_yields_synthetic_quote() {
        let server = failing_chain_server().await;

        let quote = provider_for(&server).fetch_commodities().await;
        assert!(!quote.success);
        assert_eq!(quote.source, QuoteSource::Mock);
        assert_eq!(quote.method, FetchMethod::Unknown);
        assert_eq!(server.received_requests().await.map(|r| r.len()), Some(3));
    }

    #[tokio::test]
    async fn test_missing_credential_never_touches_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LIVE_BODY))
            .expect(0)
            .mount(&server)
            .await;

        let config = AppConfig {
            providers: crate::core::config::ProvidersConfig {
                commodity_api: crate::core::config::ProviderEndpoint {
                    base_url: server.uri(),
                    timeout_ms: None,
                },
                ..Default::default()
            },
            ..AppConfig::default()
        };
        let provider = FallbackCommodityProvider::from_config(&config).unwrap();
        assert!(!provider.has_credential());

        let quote = provider.fetch_commodities().await;
        assert_eq!(quote.source, QuoteSource::Mock);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slow_tier_times_out_and_advances() {
        let server = MockServer::start().await;
        mount_query_tier(
            &server,
            ResponseTemplate::new(200)
                .set_body_string(LIVE_BODY)
                .set_delay(Duration::from_millis(500)),
        )
        .await;
        mount_header_tier(&server, ResponseTemplate::new(200).set_body_string(LIVE_BODY)).await;

        let tiers = CommodityApiTier::chain(&server.uri(), KEY, Duration::from_millis(100)).unwrap();
        let provider = FallbackCommodityProvider::new(tiers, MockGenerator::new());

        let quote = provider.fetch_commodities().await;
        assert_eq!(quote.method, FetchMethod::Header);
    }
}
