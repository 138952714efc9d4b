use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

pub type CurrencyName = String;

/// Calendar date in canonical `YYYY-MM-DD` form.
///
/// Canonical keys sort lexically in chronological order, so `Ord` is derived on the string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(String);

impl DateKey {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let date = NaiveDate::parse_from_str(s.trim(), DATE_KEY_FORMAT)
            .with_context(|| format!("invalid date key (expected YYYY-MM-DD): {s:?}"))?;
        Ok(Self::from_date(date))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(DATE_KEY_FORMAT).to_string())
    }

    /// Month is 1-based.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> anyhow::Result<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .with_context(|| format!("invalid calendar date: {year:04}-{month:02}-{day:02}"))?;
        Ok(Self::from_date(date))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DateKey {
    type Error = anyhow::Error;

    fn try_from(value: String) -> anyhow::Result<Self> {
        let key = Self::parse(&value)?;
        anyhow::ensure!(key.0 == value, "date key is not canonical: {value:?}");
        Ok(key)
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateObservation {
    pub date: DateKey,
    pub rate: f64,
}

impl RateObservation {
    pub fn new(date: DateKey, rate: f64) -> Self {
        Self { date, rate }
    }
}

/// Observations for one currency, ordered by date ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExchangeSeries(Vec<RateObservation>);

impl ExchangeSeries {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_observations(mut observations: Vec<RateObservation>) -> Self {
        // Stable: same-date rows keep provider order.
        observations.sort_by(|a, b| a.date.cmp(&b.date));
        Self(observations)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RateObservation> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RateObservation> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[RateObservation] {
        &self.0
    }

    pub fn min_rate(&self) -> Option<f64> {
        self.0.iter().map(|o| o.rate).reduce(f64::min)
    }

    pub fn max_rate(&self) -> Option<f64> {
        self.0.iter().map(|o| o.rate).reduce(f64::max)
    }
}

impl<'a> IntoIterator for &'a ExchangeSeries {
    type Item = &'a RateObservation;
    type IntoIter = std::slice::Iter<'a, RateObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
