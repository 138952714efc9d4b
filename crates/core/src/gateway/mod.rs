pub mod error;
pub mod http;
pub mod postgres;
pub mod types;

use crate::config::Settings;
use crate::domain::{CurrencyName, DateKey, ExchangeSeries};
use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Read-only view of the external exchange-rate provider.
///
/// Implementations return `Err` for provider failures so callers can tell "zero rows" apart from
/// "query failed"; both end up as empty data further up.
#[async_trait::async_trait]
pub trait RateGateway: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn list_currencies(&self) -> Result<BTreeSet<CurrencyName>>;

    /// Inclusive date range, ordered by date ascending.
    async fn list_observations(
        &self,
        currency: &str,
        start_date: &DateKey,
        end_date: &DateKey,
    ) -> Result<ExchangeSeries>;
}

/// Sorted currency names for the selection control. Provider failures degrade to an empty list.
pub async fn available_currencies(gateway: &dyn RateGateway) -> Vec<CurrencyName> {
    match gateway.list_currencies().await {
        Ok(names) => {
            tracing::debug!(provider = gateway.provider_name(), count = names.len(), "listed currencies");
            names.into_iter().collect()
        }
        Err(err) => {
            let error = format!("{err:#}");
            tracing::warn!(
                provider = gateway.provider_name(),
                %error,
                "currency listing failed; treating as no data"
            );
            Vec::new()
        }
    }
}

pub async fn connect(settings: &Settings) -> Result<Arc<dyn RateGateway>> {
    if settings.data_provider_base_url.is_some() {
        let gateway = http::HttpJsonRateGateway::from_settings(settings)?;
        tracing::info!(provider = gateway.provider_name(), "using HTTP exchange-rate provider");
        return Ok(Arc::new(gateway));
    }

    let gateway = postgres::PgRateGateway::connect(settings).await?;
    tracing::info!(provider = gateway.provider_name(), "using Postgres exchange-rate provider");
    Ok(Arc::new(gateway))
}
