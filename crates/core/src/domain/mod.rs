pub mod rate;
pub mod selection;

pub use rate::{CurrencyName, DateKey, ExchangeSeries, RateObservation};
pub use selection::{CompleteSelection, MissingField, Selection};
