//! A stock symbol and its memoized span.

use crate::domain::measure::Span;
use serde::Serialize;

/// One symbol plus the span memoized by the last remote fetch.
///
/// The memoized span lives only as long as the `Stock`; durability across
/// queries belongs to the store. Not safe to share between concurrent
/// resolutions, which is why the resolver takes it by `&mut`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stock {
    pub symbol: String,
    pub span: Span,
}

impl Stock {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            span: Span::new(),
        }
    }
}
