use crate::domain::{CurrencyName, ExchangeSeries, MissingField, Selection};
use crate::gateway::{self, RateGateway};
use crate::render::{render, ChartDescription, ChartState};
use crate::retrieval::{LoadOutcome, RetrievalOrchestrator};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    Skipped { missing: MissingField },
    Loaded { observations: usize },
    Failed,
}

impl From<&LoadOutcome> for LoadStatus {
    fn from(outcome: &LoadOutcome) -> Self {
        match outcome {
            LoadOutcome::Incomplete(missing) => Self::Skipped { missing: *missing },
            LoadOutcome::Loaded(series) => Self::Loaded {
                observations: series.len(),
            },
            LoadOutcome::Failed { .. } => Self::Failed,
        }
    }
}

struct PendingLoad {
    id: Uuid,
    handle: JoinHandle<LoadOutcome>,
}

/// State owned by one screen: the selection, the displayed series and its chart.
///
/// At most one load is pending. Triggering a new load aborts the pending one, so only the latest
/// trigger is ever applied.
pub struct Session {
    orchestrator: RetrievalOrchestrator,
    selection: Selection,
    series: ExchangeSeries,
    chart: ChartDescription,
    last_diagnostic: Option<String>,
    pending: Option<PendingLoad>,
}

impl Session {
    pub fn new(gateway: Arc<dyn RateGateway>) -> Self {
        Self {
            orchestrator: RetrievalOrchestrator::new(gateway),
            selection: Selection::default(),
            series: ExchangeSeries::empty(),
            chart: ChartDescription::empty(),
            last_diagnostic: None,
            pending: None,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn series(&self) -> &ExchangeSeries {
        &self.series
    }

    pub fn chart(&self) -> &ChartDescription {
        &self.chart
    }

    pub fn chart_state(&self) -> ChartState {
        self.chart.state
    }

    pub fn last_diagnostic(&self) -> Option<&str> {
        self.last_diagnostic.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub async fn currencies(&self) -> Vec<CurrencyName> {
        gateway::available_currencies(self.orchestrator.gateway()).await
    }

    /// Starts a load for a snapshot of the current selection.
    pub fn begin_load(&mut self) -> Uuid {
        if let Some(prev) = self.pending.take() {
            prev.handle.abort();
            tracing::debug!(load_id = %prev.id, "superseded pending load");
        }

        let id = Uuid::new_v4();
        let orchestrator = self.orchestrator.clone();
        let selection = self.selection.clone();
        let handle = tokio::spawn(async move { orchestrator.load(&selection).await });

        tracing::debug!(load_id = %id, "load started");
        self.pending = Some(PendingLoad { id, handle });
        id
    }

    /// Waits for the pending load and applies it. `None` when nothing is pending.
    pub async fn finish_load(&mut self) -> Option<LoadStatus> {
        let PendingLoad { id, handle } = self.pending.take()?;

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(load_id = %id, error = %err, "load task did not complete");
                LoadOutcome::Failed {
                    diagnostic: format!("load task did not complete: {err}"),
                }
            }
        };

        Some(self.apply(id, outcome))
    }

    pub async fn load(&mut self) -> LoadStatus {
        let id = self.begin_load();
        match self.finish_load().await {
            Some(status) => status,
            None => {
                // begin_load always leaves a pending load behind.
                tracing::error!(load_id = %id, "pending load vanished");
                LoadStatus::Failed
            }
        }
    }

    fn apply(&mut self, id: Uuid, outcome: LoadOutcome) -> LoadStatus {
        let status = LoadStatus::from(&outcome);

        self.last_diagnostic = match &outcome {
            LoadOutcome::Failed { diagnostic } => Some(diagnostic.clone()),
            _ => None,
        };

        let previous = self.chart.state;
        self.series = outcome.into_series();
        self.chart = render(&self.series);

        if previous != self.chart.state {
            tracing::info!(
                load_id = %id,
                from = ?previous,
                to = ?self.chart.state,
                "chart state changed"
            );
        }

        status
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurrencyName, DateKey, RateObservation};
    use crate::render::NO_DATA_TEXT;
    use crate::retrieval::testing::MemoryGateway;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn d(s: &str) -> DateKey {
        DateKey::parse(s).unwrap()
    }

    fn scenario_gateway() -> Arc<MemoryGateway> {
        Arc::new(MemoryGateway::with_rows(&[
            ("USD", "2024-01-01", 1.00),
            ("USD", "2024-01-02", 1.02),
            ("EUR", "2024-01-01", 0.90),
        ]))
    }

    fn select(session: &mut Session, currency: &str, start: &str, end: &str) {
        let sel = session.selection_mut();
        sel.set_currency(currency);
        sel.set_start_date(d(start));
        sel.set_end_date(d(end));
    }

    /// Blocks queries for "SLOW" until released; everything else answers immediately.
    struct GatedGateway {
        gate: Notify,
        completed: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RateGateway for GatedGateway {
        fn provider_name(&self) -> &'static str {
            "gated"
        }

        async fn list_currencies(&self) -> anyhow::Result<BTreeSet<CurrencyName>> {
            Ok(BTreeSet::new())
        }

        async fn list_observations(
            &self,
            currency: &str,
            start_date: &DateKey,
            _end_date: &DateKey,
        ) -> anyhow::Result<ExchangeSeries> {
            if currency == "SLOW" {
                self.gate.notified().await;
            }
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(ExchangeSeries::from_observations(vec![RateObservation::new(
                start_date.clone(),
                if currency == "SLOW" { 9.0 } else { 1.0 },
            )]))
        }
    }

    #[tokio::test]
    async fn starts_empty() {
        let session = Session::new(scenario_gateway());
        assert_eq!(session.chart_state(), ChartState::Empty);
        assert_eq!(session.chart().placeholder, Some(NO_DATA_TEXT));
        assert!(!session.is_loading());
        assert_eq!(session.selection(), &Selection::default());
    }

    #[tokio::test]
    async fn load_applies_series_and_chart() {
        let gw = scenario_gateway();
        let mut session = Session::new(gw.clone());
        select(&mut session, "USD", "2024-01-01", "2024-01-03");

        let status = session.load().await;
        assert_eq!(status, LoadStatus::Loaded { observations: 2 });
        assert_eq!(session.chart_state(), ChartState::Populated);
        assert_eq!(session.series().len(), 2);
        assert!((session.chart().y_axis.min - 0.50).abs() < 1e-9);
        assert!((session.chart().y_axis.max - 1.52).abs() < 1e-9);
        assert_eq!(session.chart().label_at(1.0), "2024-01-02");
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn populated_returns_to_empty_on_zero_rows_or_invalid_selection() {
        let gw = scenario_gateway();
        let mut session = Session::new(gw.clone());

        select(&mut session, "USD", "2024-01-01", "2024-01-03");
        session.load().await;
        assert_eq!(session.chart_state(), ChartState::Populated);

        select(&mut session, "USD", "2025-01-01", "2025-01-03");
        assert_eq!(session.load().await, LoadStatus::Loaded { observations: 0 });
        assert_eq!(session.chart_state(), ChartState::Empty);

        select(&mut session, "EUR", "2024-01-01", "2024-01-01");
        session.load().await;
        assert_eq!(session.chart_state(), ChartState::Populated);

        session.selection_mut().set_currency("");
        let status = session.load().await;
        assert_eq!(
            status,
            LoadStatus::Skipped {
                missing: MissingField::Currency
            }
        );
        assert_eq!(session.chart_state(), ChartState::Empty);
        assert!(session.series().is_empty());
        assert_eq!(gw.calls(), 3);
    }

    #[tokio::test]
    async fn failed_load_keeps_diagnostic_and_empties_chart() {
        let mut session = Session::new(Arc::new(MemoryGateway::failing()));
        select(&mut session, "USD", "2024-01-01", "2024-01-03");

        assert_eq!(session.load().await, LoadStatus::Failed);
        assert_eq!(session.chart_state(), ChartState::Empty);
        assert!(session
            .last_diagnostic()
            .is_some_and(|d| d.contains("provider unavailable")));
    }

    #[tokio::test]
    async fn currencies_are_sorted_for_the_selector() {
        let session = Session::new(scenario_gateway());
        assert_eq!(session.currencies().await, ["EUR", "USD"]);

        let failing = Session::new(Arc::new(MemoryGateway::failing()));
        assert!(failing.currencies().await.is_empty());
    }

    #[tokio::test]
    async fn finish_without_pending_load_is_none() {
        let mut session = Session::new(scenario_gateway());
        assert_eq!(session.finish_load().await, None);
    }

    #[tokio::test]
    async fn new_trigger_cancels_the_pending_load() {
        let gw = Arc::new(GatedGateway {
            gate: Notify::new(),
            completed: AtomicUsize::new(0),
        });
        let mut session = Session::new(gw.clone());

        select(&mut session, "SLOW", "2024-01-01", "2024-01-03");
        let first = session.begin_load();
        tokio::task::yield_now().await;
        assert!(session.is_loading());

        select(&mut session, "FAST", "2024-02-01", "2024-02-03");
        let second = session.begin_load();
        assert_ne!(first, second);

        // Releasing the gate after the abort must not let the stale result through.
        gw.gate.notify_waiters();
        let status = session.finish_load().await;
        assert_eq!(status, Some(LoadStatus::Loaded { observations: 1 }));
        assert_eq!(session.series().get(0).unwrap().rate, 1.0);
        assert_eq!(session.chart().label_at(0.0), "2024-02-01");
        assert_eq!(gw.completed.load(Ordering::SeqCst), 1);
        assert_eq!(session.finish_load().await, None);
    }
}
