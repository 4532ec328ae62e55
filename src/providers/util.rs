use crate::core::FetchError;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Builds a client whose every request is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent("metalwatch/0.1")
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::Transport {
            source_name: "http-client".to_string(),
            message: e.to_string(),
        })
}

/// Joins `path` onto `base_url` and appends `params` as a query string.
pub fn build_url(
    source_name: &str,
    base_url: &str,
    path: &str,
    params: &[(&str, &str)],
) -> Result<Url, FetchError> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    let parsed = if params.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, params)
    };
    parsed.map_err(|e| FetchError::malformed(source_name, format!("invalid URL '{raw}': {e}")))
}

/// Sends `request`, requires a 2xx status and decodes the JSON body as `T`.
pub async fn get_json<T: DeserializeOwned>(
    source_name: &str,
    request: RequestBuilder,
) -> Result<T, FetchError> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(source_name, e))?;

    let status = response.status();
    debug!(source = source_name, %status, "Received response");
    if !status.is_success() {
        return Err(FetchError::from_status(source_name, status));
    }

    let text = response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(source_name, e))?;

    serde_json::from_str(&text)
        .map_err(|e| FetchError::malformed(source_name, format!("failed to parse JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_params() {
        let url = build_url(
            "test",
            "http://localhost:1234/",
            "/v2/rates/latest",
            &[("symbols", "XAU,XAG,WTI"), ("base", "USD")],
        )
        .unwrap();
        assert_eq!(url.path(), "/v2/rates/latest");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("symbols".to_string(), "XAU,XAG,WTI".to_string()),
                ("base".to_string(), "USD".to_string())
            ]
        );
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        let err = build_url("test", "not a url", "/latest", &[]).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
    }
}
