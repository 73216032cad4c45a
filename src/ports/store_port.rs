//! Persistent store port trait.
//!
//! The store is the system of record: one row per `(symbol, date)`. The
//! in-memory span on a [`Stock`](crate::domain::stock::Stock) and the remote
//! provider are caches and sources relative to it.

use crate::domain::error::TrendyError;
use crate::domain::measure::Span;
use chrono::NaiveDate;

pub trait StorePort {
    /// All stored measures for `symbol` dated within `[start, end]`, oldest first.
    fn get_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
    -> Result<Span, TrendyError>;

    /// Appends every measure in `span` as one transaction. Any row failure,
    /// including a duplicate `(symbol, date)`, leaves the store unchanged.
    fn insert(&self, symbol: &str, span: &Span) -> Result<(), TrendyError>;

    fn symbols(&self) -> Result<Vec<String>, TrendyError>;

    /// `(first date, last date, row count)` for `symbol`, or `None` if nothing is stored.
    fn coverage(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendyError>;

    /// Removes stored measures in `[start, end]`, returning how many rows went.
    fn delete_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
    -> Result<usize, TrendyError>;
}
