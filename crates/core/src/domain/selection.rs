use crate::domain::rate::{CurrencyName, DateKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// In-progress user choice. A query is only issued once every field is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub currency: Option<CurrencyName>,
    pub start_date: Option<DateKey>,
    pub end_date: Option<DateKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Currency,
    StartDate,
    EndDate,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Currency => "currency",
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompleteSelection<'a> {
    pub currency: &'a str,
    pub start_date: &'a DateKey,
    pub end_date: &'a DateKey,
}

impl Selection {
    pub fn new(
        currency: impl Into<CurrencyName>,
        start_date: DateKey,
        end_date: DateKey,
    ) -> Self {
        Self {
            currency: Some(currency.into()),
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    pub fn set_currency(&mut self, currency: impl Into<CurrencyName>) {
        self.currency = Some(currency.into());
    }

    pub fn set_start_date(&mut self, date: DateKey) {
        self.start_date = Some(date);
    }

    pub fn set_end_date(&mut self, date: DateKey) {
        self.end_date = Some(date);
    }

    pub fn clear_currency(&mut self) {
        self.currency = None;
    }

    pub fn clear_start_date(&mut self) {
        self.start_date = None;
    }

    pub fn clear_end_date(&mut self) {
        self.end_date = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Reports the first missing field. Blank currency names count as missing; any other name is
    /// passed on verbatim since providers match it exactly.
    pub fn require_complete(&self) -> Result<CompleteSelection<'_>, MissingField> {
        let currency = self
            .currency
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(MissingField::Currency)?;
        let start_date = self.start_date.as_ref().ok_or(MissingField::StartDate)?;
        let end_date = self.end_date.as_ref().ok_or(MissingField::EndDate)?;

        Ok(CompleteSelection {
            currency,
            start_date,
            end_date,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.require_complete().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> DateKey {
        DateKey::parse(s).unwrap()
    }

    #[test]
    fn starts_empty_and_reports_first_missing_field() {
        let mut sel = Selection::default();
        assert_eq!(sel.require_complete(), Err(MissingField::Currency));

        sel.set_currency("USD");
        assert_eq!(sel.require_complete(), Err(MissingField::StartDate));

        sel.set_start_date(d("2024-01-01"));
        assert_eq!(sel.require_complete(), Err(MissingField::EndDate));

        sel.set_end_date(d("2024-01-03"));
        let complete = sel.require_complete().unwrap();
        assert_eq!(complete.currency, "USD");
        assert_eq!(complete.start_date.as_str(), "2024-01-01");
        assert_eq!(complete.end_date.as_str(), "2024-01-03");
    }

    #[test]
    fn blank_currency_is_missing() {
        let sel = Selection::new("", d("2024-01-01"), d("2024-01-03"));
        assert_eq!(sel.require_complete(), Err(MissingField::Currency));

        let sel = Selection::new("   ", d("2024-01-01"), d("2024-01-03"));
        assert!(!sel.is_complete());
    }

    #[test]
    fn currency_is_passed_through_verbatim() {
        let sel = Selection::new(" EUR ", d("2024-01-01"), d("2024-01-03"));
        assert_eq!(sel.require_complete().unwrap().currency, " EUR ");
    }

    #[test]
    fn per_field_clearers_make_selection_incomplete() {
        let mut sel = Selection::new("USD", d("2024-01-01"), d("2024-01-03"));
        sel.clear_end_date();
        assert_eq!(sel.require_complete(), Err(MissingField::EndDate));
        assert_eq!(sel.currency.as_deref(), Some("USD"));

        sel.set_end_date(d("2024-01-03"));
        sel.clear_start_date();
        assert_eq!(sel.require_complete(), Err(MissingField::StartDate));

        sel.set_start_date(d("2024-01-01"));
        sel.clear_currency();
        assert_eq!(sel.require_complete(), Err(MissingField::Currency));
        assert!(sel.start_date.is_some() && sel.end_date.is_some());
    }

    #[test]
    fn clear_resets_every_field() {
        let mut sel = Selection::new("USD", d("2024-01-01"), d("2024-01-03"));
        sel.clear();
        assert_eq!(sel, Selection::default());
    }
}
