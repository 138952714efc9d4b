use crate::config::Settings;
use crate::domain::{CurrencyName, DateKey, ExchangeSeries};
use crate::gateway::types::{decode_currencies, decode_observations, CurrencyRow, ObservationRow};
use crate::gateway::RateGateway;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CURRENCIES_PATH: &str = "/exchangerate";
const DEFAULT_OBSERVATIONS_PATH: &str = "/exchangerate/observations";

/// JSON provider: `GET {currencies_path}` returns `[{"name": ..}]`,
/// `GET {observations_path}?name=&start=&end=` returns `[{"date": .., "amount": ..}]`.
#[derive(Debug, Clone)]
pub struct HttpJsonRateGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    currencies_path: String,
    observations_path: String,
}

impl HttpJsonRateGateway {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_data_provider_base_url()?.to_string();
        let api_key = settings.data_provider_api_key.clone();

        let timeout_secs = std::env::var("DATA_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let currencies_path = env_path("DATA_PROVIDER_CURRENCIES_PATH", DEFAULT_CURRENCIES_PATH);
        let observations_path =
            env_path("DATA_PROVIDER_OBSERVATIONS_PATH", DEFAULT_OBSERVATIONS_PATH);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build data provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            currencies_path,
            observations_path,
        })
    }

    fn url(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn get_rows<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        let res = self
            .http
            .get(self.url(path))
            .headers(self.headers()?)
            .query(query)
            .send()
            .await
            .context("data provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read provider response")?;
        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("provider response is not valid JSON: {text}"))?;

        if !status.is_success() {
            anyhow::bail!("data provider HTTP {status}: {raw_json}");
        }

        parse_rows(raw_json)
    }
}

#[async_trait::async_trait]
impl RateGateway for HttpJsonRateGateway {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn list_currencies(&self) -> Result<BTreeSet<CurrencyName>> {
        let rows: Vec<CurrencyRow> = self.get_rows(&self.currencies_path, &[]).await?;
        Ok(decode_currencies(rows))
    }

    async fn list_observations(
        &self,
        currency: &str,
        start_date: &DateKey,
        end_date: &DateKey,
    ) -> Result<ExchangeSeries> {
        let query = [
            ("name", currency),
            ("start", start_date.as_str()),
            ("end", end_date.as_str()),
        ];
        let rows: Vec<ObservationRow> = self.get_rows(&self.observations_path, &query).await?;
        Ok(decode_observations(self.provider_name(), rows)?)
    }
}

fn env_path(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_rows<T: DeserializeOwned>(raw_json: Value) -> Result<Vec<T>> {
    anyhow::ensure!(
        raw_json.is_array(),
        "provider response must be a JSON array: {raw_json}"
    );
    serde_json::from_value::<Vec<T>>(raw_json).context("failed to parse provider rows")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway(base_url: &str) -> HttpJsonRateGateway {
        HttpJsonRateGateway {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
            api_key: Some("secret".to_string()),
            currencies_path: "exchangerate".to_string(),
            observations_path: DEFAULT_OBSERVATIONS_PATH.to_string(),
        }
    }

    #[test]
    fn joins_base_url_and_paths() {
        let gw = gateway("http://localhost:8080/");
        assert_eq!(gw.url("exchangerate"), "http://localhost:8080/exchangerate");
        assert_eq!(
            gw.url(DEFAULT_OBSERVATIONS_PATH),
            "http://localhost:8080/exchangerate/observations"
        );
    }

    #[test]
    fn sends_api_key_header() {
        let headers = gateway("http://localhost").headers().unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "secret");
    }

    #[test]
    fn parses_currency_rows() {
        let rows: Vec<CurrencyRow> =
            parse_rows(json!([{"name": "USD"}, {"name": "EUR"}, {"name": "USD"}])).unwrap();
        let names: Vec<_> = decode_currencies(rows).into_iter().collect();
        assert_eq!(names, ["EUR", "USD"]);
    }

    #[test]
    fn rejects_non_array_response() {
        let res = parse_rows::<CurrencyRow>(json!({"items": []}));
        assert!(res.is_err());
    }

    #[test]
    fn rejects_rows_missing_columns() {
        let res = parse_rows::<ObservationRow>(json!([{"date": "2024-01-01"}]));
        assert!(res.is_err());
    }
}
