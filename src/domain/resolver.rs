//! Tiered range resolution: memoized span, then store, then remote provider.
//!
//! Each call does at most one store read and at most one remote fetch, in
//! that order, and short-circuits on the first tier that answers. A store
//! read failure is returned as-is; it never falls through to the provider.

use crate::domain::error::TrendyError;
use crate::domain::measure::Span;
use crate::domain::stock::Stock;
use crate::ports::quote_port::QuotePort;
use crate::ports::store_port::StorePort;
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Which tier answered a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Memory,
    Store,
    Remote,
}

/// What happened to the span on its way back to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    /// Read from memory or the store; nothing to write.
    NotNeeded,
    Stored,
    /// The remote fetch succeeded but the backfill insert failed. The data
    /// is still returned, but the store does not hold it.
    Skipped { reason: String },
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub span: Span,
    pub tier: Tier,
    pub persistence: Persistence,
}

pub struct TieredResolver<'a> {
    store: &'a dyn StorePort,
    quotes: &'a dyn QuotePort,
}

impl<'a> TieredResolver<'a> {
    pub fn new(store: &'a dyn StorePort, quotes: &'a dyn QuotePort) -> Self {
        Self { store, quotes }
    }

    /// Daily closing values for `stock` over `[start, end]`.
    pub fn range(
        &self,
        stock: &mut Stock,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Span, TrendyError> {
        self.resolve(stock, start, end).map(|r| r.span)
    }

    /// Like [`range`](Self::range), also reporting the answering tier and
    /// whether a remote result reached the store.
    ///
    /// A reversed range (`start > end`) whose ends both fall inside the
    /// memoized span is answered from memory with an empty span. Outside the
    /// memo the same range reaches the provider, which reports `NoData`.
    pub fn resolve(
        &self,
        stock: &mut Stock,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Resolution, TrendyError> {
        if stock.span.covers_range(start, end) {
            debug!(symbol = %stock.symbol, %start, %end, "memoized span covers range");
            return Ok(Resolution {
                span: stock.span.slice(start, end),
                tier: Tier::Memory,
                persistence: Persistence::NotNeeded,
            });
        }

        let stored = self.store.get_range(&stock.symbol, start, end)?;
        if !stored.is_empty() {
            debug!(symbol = %stock.symbol, rows = stored.len(), "store hit");
            return Ok(Resolution {
                span: stored,
                tier: Tier::Store,
                persistence: Persistence::NotNeeded,
            });
        }

        debug!(symbol = %stock.symbol, %start, %end, "store miss, fetching remotely");
        self.populate(stock, start, end)
    }

    /// Fetches `[start, end]` from the provider, replaces the stock's
    /// memoized span with the result and backfills the store.
    pub fn populate(
        &self,
        stock: &mut Stock,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Resolution, TrendyError> {
        let span = self.quotes.fetch_span(&stock.symbol, start, end)?;
        stock.span = span.clone();

        let persistence = match self.store.insert(&stock.symbol, &span) {
            Ok(()) => Persistence::Stored,
            Err(e) => {
                warn!(
                    symbol = %stock.symbol,
                    error = %e,
                    "fetched span could not be persisted; returning it unsaved"
                );
                Persistence::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        Ok(Resolution {
            span,
            tier: Tier::Remote,
            persistence,
        })
    }
}
