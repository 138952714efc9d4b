use crate::config::Settings;
use crate::domain::{CurrencyName, DateKey, ExchangeSeries};
use crate::gateway::types::{decode_currencies, decode_observations, CurrencyRow, ObservationRow};
use crate::gateway::RateGateway;
use anyhow::{Context, Result};
use std::collections::BTreeSet;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const LIST_CURRENCIES_SQL: &str = "SELECT DISTINCT name FROM exchange_rates ORDER BY name ASC";

// `date` is stored as canonical YYYY-MM-DD text, so the lexical range is the calendar range.
const LIST_OBSERVATIONS_SQL: &str = "SELECT date, amount \
     FROM exchange_rates \
     WHERE name = $1 AND date >= $2 AND date <= $3 \
     ORDER BY date ASC";

/// Reads the `exchange_rates (name, date, amount)` table. Never writes.
#[derive(Debug, Clone)]
pub struct PgRateGateway {
    pool: sqlx::PgPool,
}

impl PgRateGateway {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(settings: &Settings) -> Result<Self> {
        let db_url = settings.require_database_url()?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await
            .context("connect DATABASE_URL failed")?;

        Ok(Self::new(pool))
    }
}

#[async_trait::async_trait]
impl RateGateway for PgRateGateway {
    fn provider_name(&self) -> &'static str {
        "postgres"
    }

    async fn list_currencies(&self) -> Result<BTreeSet<CurrencyName>> {
        let rows = sqlx::query_as::<_, CurrencyRow>(LIST_CURRENCIES_SQL)
            .persistent(false)
            .fetch_all(&self.pool)
            .await
            .context("select currency names failed")?;

        Ok(decode_currencies(rows))
    }

    async fn list_observations(
        &self,
        currency: &str,
        start_date: &DateKey,
        end_date: &DateKey,
    ) -> Result<ExchangeSeries> {
        let t0 = std::time::Instant::now();
        let rows = sqlx::query_as::<_, ObservationRow>(LIST_OBSERVATIONS_SQL)
            .persistent(false)
            .bind(currency)
            .bind(start_date.as_str())
            .bind(end_date.as_str())
            .fetch_all(&self.pool)
            .await
            .with_context(|| {
                format!("select observations failed (currency={currency}, {start_date}..={end_date})")
            })?;

        tracing::debug!(
            currency,
            %start_date,
            %end_date,
            rows = rows.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "exchange_rates range query"
        );

        Ok(decode_observations(self.provider_name(), rows)?)
    }
}
