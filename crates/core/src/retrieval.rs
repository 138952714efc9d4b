use crate::domain::{ExchangeSeries, MissingField, Selection};
use crate::gateway::RateGateway;
use std::sync::Arc;

/// Result of one load action. Only `Loaded` reaches the chart with data; the other variants carry
/// the reason the chart is empty.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Incomplete(MissingField),
    Loaded(ExchangeSeries),
    Failed { diagnostic: String },
}

impl LoadOutcome {
    pub fn into_series(self) -> ExchangeSeries {
        match self {
            Self::Loaded(series) => series,
            Self::Incomplete(_) | Self::Failed { .. } => ExchangeSeries::empty(),
        }
    }

    pub fn series(&self) -> Option<&ExchangeSeries> {
        match self {
            Self::Loaded(series) => Some(series),
            _ => None,
        }
    }
}

/// Validates a selection and fetches its series. Every call queries the provider afresh.
#[derive(Clone)]
pub struct RetrievalOrchestrator {
    gateway: Arc<dyn RateGateway>,
}

impl RetrievalOrchestrator {
    pub fn new(gateway: Arc<dyn RateGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &dyn RateGateway {
        self.gateway.as_ref()
    }

    pub async fn load(&self, selection: &Selection) -> LoadOutcome {
        let complete = match selection.require_complete() {
            Ok(complete) => complete,
            Err(missing) => {
                tracing::debug!(%missing, "selection incomplete; skipping provider query");
                return LoadOutcome::Incomplete(missing);
            }
        };

        let res = self
            .gateway
            .list_observations(complete.currency, complete.start_date, complete.end_date)
            .await;

        match res {
            Ok(series) => {
                tracing::info!(
                    provider = self.gateway.provider_name(),
                    currency = complete.currency,
                    start_date = %complete.start_date,
                    end_date = %complete.end_date,
                    observations = series.len(),
                    "exchange series loaded"
                );
                LoadOutcome::Loaded(series)
            }
            Err(err) => {
                let diagnostic = format!("{err:#}");
                tracing::warn!(
                    provider = self.gateway.provider_name(),
                    currency = complete.currency,
                    start_date = %complete.start_date,
                    end_date = %complete.end_date,
                    error = %diagnostic,
                    "exchange series query failed; treating as no data"
                );
                LoadOutcome::Failed { diagnostic }
            }
        }
    }

    pub async fn load_series(&self, selection: &Selection) -> ExchangeSeries {
        self.load(selection).await.into_series()
    }
}
