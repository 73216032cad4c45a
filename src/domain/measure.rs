//! Daily time-series model: [`Measure`] and [`Span`].
//!
//! A span is kept in ascending date order before any coverage or slicing
//! query. Sorting is lazy: the querying methods take `&mut self` and sort in
//! place when they find the measures out of order.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// One symbol's closing value on one calendar day.
///
/// Equality compares the value bit-for-bit and the calendar day only, so a
/// provider timestamp at noon equals the midnight row read back from a store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Measure {
    pub time: DateTime<Utc>,
    pub value: f32,
}

impl Measure {
    pub fn new(time: DateTime<Utc>, value: f32) -> Self {
        Self { time, value }
    }

    /// A measure stamped at midnight UTC of `date`.
    pub fn on(date: NaiveDate, value: f32) -> Self {
        Self {
            time: date.and_time(NaiveTime::MIN).and_utc(),
            value,
        }
    }

    /// The calendar day this measure falls on.
    pub fn date(&self) -> NaiveDate {
        self.time.date_naive()
    }
}

impl PartialEq for Measure {
    fn eq(&self, other: &Self) -> bool {
        self.value.to_bits() == other.value.to_bits() && self.date() == other.date()
    }
}

/// An ordered sequence of measures for a single symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Span(Vec<Measure>);

impl Span {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, measure: Measure) {
        self.0.push(measure);
    }

    pub fn is_sorted(&self) -> bool {
        self.0.is_sorted_by_key(|m| m.time)
    }

    /// Sorts ascending by time. Stable, so equal timestamps keep their order.
    pub fn sort(&mut self) {
        if !self.is_sorted() {
            self.0.sort_by_key(|m| m.time);
        }
    }

    /// First and last calendar day, sorting first if needed.
    pub fn bounds(&mut self) -> Option<(NaiveDate, NaiveDate)> {
        self.sort();
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => Some((first.date(), last.date())),
            _ => None,
        }
    }

    /// True when `date` lies between the first and last measure inclusive.
    ///
    /// This is a bounds check, not a completeness check: interior days with
    /// no stored measure (weekends, holidays) are still covered.
    pub fn covers(&mut self, date: NaiveDate) -> bool {
        match self.bounds() {
            Some((first, last)) => first <= date && date <= last,
            None => false,
        }
    }

    pub fn covers_range(&mut self, start: NaiveDate, end: NaiveDate) -> bool {
        self.covers(start) && self.covers(end)
    }

    /// Copies out the measures for `[start, end]`.
    ///
    /// The lower bound is the measure immediately before the first one dated
    /// strictly after `start`, so a start that falls between two measures
    /// pulls in its covering predecessor. The upper bound is exclusive at the
    /// first measure dated strictly after `end`.
    ///
    /// A reversed range (`start > end`) yields an empty span rather than an
    /// error.
    pub fn slice(&mut self, start: NaiveDate, end: NaiveDate) -> Span {
        self.sort();
        let after_start = self.0.partition_point(|m| m.date() <= start);
        let lo = after_start.saturating_sub(1);
        let hi = self.0.partition_point(|m| m.date() <= end).max(lo);
        Span(self.0[lo..hi].to_vec())
    }
}

impl Deref for Span {
    type Target = [Measure];

    fn deref(&self) -> &[Measure] {
        &self.0
    }
}

/// Positional equality: same length and every pair equal by day and value.
impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a == b)
    }
}

impl From<Vec<Measure>> for Span {
    fn from(measures: Vec<Measure>) -> Self {
        Self(measures)
    }
}

impl FromIterator<Measure> for Span {
    fn from_iter<I: IntoIterator<Item = Measure>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Span {
    type Item = Measure;
    type IntoIter = std::vec::IntoIter<Measure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Span {
    type Item = &'a Measure;
    type IntoIter = std::slice::Iter<'a, Measure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
