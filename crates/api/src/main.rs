use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use divisas_core::domain::{DateKey, ExchangeSeries, Selection};
use divisas_core::render::{render, ChartDescription};
use divisas_core::retrieval::RetrievalOrchestrator;
use divisas_core::session::LoadStatus;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = divisas_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let orchestrator = match divisas_core::gateway::connect(&settings).await {
        Ok(gateway) => Some(RetrievalOrchestrator::new(gateway)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "exchange-rate provider unavailable; starting API in degraded mode");
            None
        }
    };

    let app = router(AppState { orchestrator });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/currencies", get(get_currencies))
        .route("/chart", get(get_chart))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    orchestrator: Option<RetrievalOrchestrator>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuery {
    currency: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiChart {
    selection: Selection,
    #[serde(flatten)]
    status: LoadStatus,
    series: ExchangeSeries,
    chart: ChartDescription,
}

async fn get_currencies(State(state): State<AppState>) -> Result<Json<Vec<String>>, StatusCode> {
    let Some(orchestrator) = &state.orchestrator else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let names = divisas_core::gateway::available_currencies(orchestrator.gateway()).await;
    Ok(Json(names))
}

async fn get_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ApiChart>, StatusCode> {
    let Some(orchestrator) = &state.orchestrator else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let selection = parse_selection(query).map_err(|e| {
        tracing::debug!(error = %e, "rejecting chart query");
        StatusCode::BAD_REQUEST
    })?;

    let outcome = orchestrator.load(&selection).await;
    let status = LoadStatus::from(&outcome);
    let series = outcome.into_series();
    let chart = render(&series);

    Ok(Json(ApiChart {
        selection,
        status,
        series,
        chart,
    }))
}

/// Absent or blank parameters leave the field unset; malformed dates are rejected. The currency is
/// kept verbatim because providers match it exactly.
fn parse_selection(query: ChartQuery) -> anyhow::Result<Selection> {
    Ok(Selection {
        currency: query.currency.filter(|s| !s.trim().is_empty()),
        start_date: non_blank(query.start)
            .map(|s| DateKey::parse(&s))
            .transpose()?,
        end_date: non_blank(query.end)
            .map(|s| DateKey::parse(&s))
            .transpose()?,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &divisas_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
