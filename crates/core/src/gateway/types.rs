use crate::domain::{CurrencyName, DateKey, ExchangeSeries, RateObservation};
use crate::gateway::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CurrencyRow {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ObservationRow {
    pub date: String,
    pub amount: f64,
}

pub fn decode_currencies(rows: Vec<CurrencyRow>) -> BTreeSet<CurrencyName> {
    let total = rows.len();
    let names: BTreeSet<CurrencyName> = rows
        .into_iter()
        .map(|row| row.name)
        .filter(|name| !name.trim().is_empty())
        .collect();

    if names.len() < total {
        tracing::debug!(rows = total, distinct = names.len(), "collapsed duplicate or blank currency names");
    }
    names
}

pub fn decode_observations(
    provider: &'static str,
    rows: Vec<ObservationRow>,
) -> Result<ExchangeSeries, GatewayError> {
    let mut out = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let date = DateKey::parse(&row.date).map_err(|e| {
            GatewayError::new(provider, "decode", format!("row {idx}: {e:#}"))
        })?;
        if !row.amount.is_finite() {
            return Err(GatewayError::new(
                provider,
                "decode",
                format!("row {idx} ({date}): amount is not finite ({})", row.amount),
            ));
        }
        out.push(RateObservation::new(date, row.amount));
    }
    Ok(ExchangeSeries::from_observations(out))
}
