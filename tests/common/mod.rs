#![allow(dead_code)]

use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use trendy::adapters::markit::RequestParams;
use trendy::domain::error::TrendyError;
pub use trendy::domain::measure::{Measure, Span};
use trendy::ports::quote_port::QuotePort;
use trendy::ports::store_port::StorePort;

pub const AMZN_30D: &str = include_str!("../fixtures/amzn_2011-05-20_30d.json");
pub const MSFT_300D: &str = include_str!("../fixtures/msft_2011-05-20_300d.json");
pub const START_EQUALS_END: &str = include_str!("../fixtures/start_equals_end.json");
pub const START_AFTER_END: &str = include_str!("../fixtures/start_after_end.json");

pub const REJECTION_TEXT: &str = "Could not determine the desired start and end points of chart.";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The fixed day the saved provider responses start from.
pub fn arbitrary_date() -> NaiveDate {
    date(2011, 5, 20)
}

/// NYSE holidays between the saved responses' first and last trading days.
const HOLIDAYS: [(i32, u32, u32); 8] = [
    (2011, 5, 30),
    (2011, 7, 4),
    (2011, 9, 5),
    (2011, 11, 24),
    (2011, 12, 26),
    (2012, 1, 2),
    (2012, 1, 16),
    (2012, 2, 20),
];

/// NYSE trading days in `[start, end]`; only holidays from 2011-05-20 to
/// 2012-03-15 are known.
pub fn trading_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .filter(|d| {
            !HOLIDAYS
                .iter()
                .any(|&(y, m, day)| date(y, m, day) == *d)
        })
        .collect()
}

const AMZN_CLOSES: [f32; 20] = [
    198.65, 196.22, 193.27, 192.26, 195.0, 194.13, 196.69, 192.395, 193.65, 188.32, 185.69,
    187.55, 188.05, 189.68, 186.53, 186.29, 189.96, 185.98, 183.65, 186.37,
];

/// Closing span carried by the saved AMZN response.
pub fn expected_amzn_span() -> Span {
    trading_days(arbitrary_date(), arbitrary_date() + Duration::days(30))
        .into_iter()
        .zip(AMZN_CLOSES)
        .map(|(d, v)| Measure::on(d, v))
        .collect()
}

/// `count` consecutive days from `start`, values increasing from `base`.
pub fn daily_span(start: NaiveDate, count: usize, base: f32) -> Span {
    (0..count)
        .map(|i| Measure::on(start + Duration::days(i as i64), base + i as f32))
        .collect()
}

/// In-memory store that counts calls and enforces `(symbol, date)` uniqueness.
pub struct MockStore {
    pub rows: RefCell<Vec<(String, Measure)>>,
    pub get_range_calls: Cell<usize>,
    pub inserts: RefCell<Vec<(String, Span)>>,
    pub read_error: Option<String>,
    pub write_error: Option<String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            rows: RefCell::new(Vec::new()),
            get_range_calls: Cell::new(0),
            inserts: RefCell::new(Vec::new()),
            read_error: None,
            write_error: None,
        }
    }

    pub fn with_span(self, symbol: &str, span: &Span) -> Self {
        self.rows
            .borrow_mut()
            .extend(span.iter().map(|m| (symbol.to_string(), *m)));
        self
    }

    pub fn failing_reads(mut self, reason: &str) -> Self {
        self.read_error = Some(reason.to_string());
        self
    }

    pub fn failing_writes(mut self, reason: &str) -> Self {
        self.write_error = Some(reason.to_string());
        self
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts.borrow().len()
    }

    pub fn stored(&self, symbol: &str) -> Span {
        let mut span: Span = self
            .rows
            .borrow()
            .iter()
            .filter(|(s, _)| s == symbol)
            .map(|(_, m)| *m)
            .collect();
        span.sort();
        span
    }
}

impl StorePort for MockStore {
    fn get_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Span, TrendyError> {
        self.get_range_calls.set(self.get_range_calls.get() + 1);
        if let Some(reason) = &self.read_error {
            return Err(TrendyError::DatabaseQuery {
                reason: reason.clone(),
            });
        }
        let mut span: Span = self
            .stored(symbol)
            .into_iter()
            .filter(|m| start <= m.date() && m.date() <= end)
            .collect();
        span.sort();
        Ok(span)
    }

    fn insert(&self, symbol: &str, span: &Span) -> Result<(), TrendyError> {
        self.inserts
            .borrow_mut()
            .push((symbol.to_string(), span.clone()));
        if let Some(reason) = &self.write_error {
            return Err(TrendyError::DatabaseQuery {
                reason: reason.clone(),
            });
        }
        let mut rows = self.rows.borrow_mut();
        for m in span {
            if rows.iter().any(|(s, r)| s == symbol && r.date() == m.date()) {
                return Err(TrendyError::DatabaseQuery {
                    reason: format!("duplicate key ({symbol}, {})", m.date()),
                });
            }
        }
        rows.extend(span.iter().map(|m| (symbol.to_string(), *m)));
        Ok(())
    }

    fn symbols(&self) -> Result<Vec<String>, TrendyError> {
        let mut symbols: Vec<String> = self.rows.borrow().iter().map(|(s, _)| s.clone()).collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn coverage(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendyError> {
        let mut span = self.stored(symbol);
        let len = span.len();
        Ok(span.bounds().map(|(first, last)| (first, last, len)))
    }

    fn delete_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, TrendyError> {
        let mut rows = self.rows.borrow_mut();
        let before = rows.len();
        rows.retain(|(s, m)| !(s == symbol && start <= m.date() && m.date() <= end));
        Ok(before - rows.len())
    }
}

#[derive(Debug, Clone)]
pub enum Reply {
    Span(Span),
    Rejection(String),
    NoData,
    Transport(String),
}

/// Quote source that replays one reply and counts fetches.
pub struct MockQuotes {
    pub reply: Reply,
    pub calls: RefCell<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl MockQuotes {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn returning(span: Span) -> Self {
        Self::new(Reply::Span(span))
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl QuotePort for MockQuotes {
    fn fetch_span(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Span, TrendyError> {
        self.calls
            .borrow_mut()
            .push((symbol.to_string(), start, end));
        match &self.reply {
            Reply::Span(span) => Ok(span.clone()),
            Reply::Rejection(message) => Err(TrendyError::ProviderRejection {
                message: message.clone(),
            }),
            Reply::NoData => Err(TrendyError::NoData {
                symbol: symbol.to_string(),
            }),
            Reply::Transport(reason) => Err(TrendyError::Transport {
                reason: reason.clone(),
            }),
        }
    }
}

struct StandInState {
    status: AtomicU16,
    hits: AtomicUsize,
}

/// Local stand-in for the chart API. Replays the saved responses for the
/// requests they were recorded for, or answers every request with a forced
/// status when one is set.
pub struct StandIn {
    pub base: String,
    state: Arc<StandInState>,
}

impl StandIn {
    pub fn start() -> Self {
        let state = Arc::new(StandInState {
            status: AtomicU16::new(200),
            hits: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/chart", get(chart))
            .route("/slow", get(slow))
            .with_state(state.clone());

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind stand-in");
                tx.send(listener.local_addr().expect("local addr"))
                    .expect("send addr");
                axum::serve(listener, app).await.expect("serve stand-in");
            });
        });
        let addr = rx.recv().expect("stand-in address");

        Self {
            base: format!("http://{addr}"),
            state,
        }
    }

    pub fn chart_url(&self) -> String {
        format!("{}/chart", self.base)
    }

    pub fn slow_url(&self) -> String {
        format!("{}/slow", self.base)
    }

    pub fn set_status(&self, status: u16) {
        self.state.status.store(status, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }
}

fn saved_body(symbol: &str, start: &str, end: &str) -> Option<&'static str> {
    match (symbol, start, end) {
        ("AMZN", "2011-05-20T00:00:00", "2011-06-19T00:00:00") => Some(AMZN_30D),
        ("MSFT", "2011-05-20T00:00:00", "2012-03-15T00:00:00") => Some(MSFT_300D),
        ("MSFT", "2011-05-20T00:00:00", "2011-05-20T00:00:00") => Some(START_EQUALS_END),
        ("MSFT", "2011-06-19T00:00:00", "2011-05-20T00:00:00") => Some(START_AFTER_END),
        _ => None,
    }
}

async fn chart(
    State(state): State<Arc<StandInState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let status = state.status.load(Ordering::SeqCst);
    if status != 200 {
        return StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response();
    }

    let Some(params) = query
        .get("parameters")
        .and_then(|p| serde_json::from_str::<RequestParams>(p).ok())
    else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };

    let body = saved_body(
        params.symbol().unwrap_or_default(),
        params.start_date.as_deref().unwrap_or_default(),
        params.end_date.as_deref().unwrap_or_default(),
    );

    match body {
        Some(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        None => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    }
}

async fn slow() -> &'static str {
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    "{}"
}
