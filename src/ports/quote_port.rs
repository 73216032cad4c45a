//! Remote quote source port trait.

use crate::domain::error::TrendyError;
use crate::domain::measure::Span;
use chrono::NaiveDate;

pub trait QuotePort {
    /// Daily closing values for `symbol` over `[start, end]` from the remote provider.
    fn fetch_span(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
    -> Result<Span, TrendyError>;
}
