//! Markit On Demand chart API adapter.
//!
//! Requests are a GET on a fixed endpoint with the whole parameter object
//! JSON-encoded into a single `parameters` query value. Responses are either
//! parallel `Dates`/`Positions` arrays plus per-series elements, or an
//! exception envelope.

pub mod iso_time;
pub mod request;
pub mod response;

pub use iso_time::IsoTime;
pub use request::{MarkitRequest, RequestParams};
pub use response::{DataSeries, Element, ElementKind, MarkitResponse, PriceField, SeriesData};

use crate::domain::error::TrendyError;
use crate::domain::measure::Span;
use crate::domain::settings::{markit_settings, MarkitSettings};
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;
use chrono::{NaiveDate, NaiveTime};
use std::time::Duration;
use tracing::{debug, warn};

pub struct MarkitAdapter {
    client: reqwest::blocking::Client,
    url: String,
}

impl MarkitAdapter {
    /// Adapter against `url` with a per-request deadline of `timeout`.
    ///
    /// Tests point `url` at a local stand-in server.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TrendyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrendyError::Transport {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_settings(settings: &MarkitSettings) -> Result<Self, TrendyError> {
        Self::new(settings.url.clone(), settings.timeout)
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrendyError> {
        Self::from_settings(&markit_settings(config)?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn build_request(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MarkitRequest, TrendyError> {
        MarkitRequest::new(
            &self.url,
            symbol,
            start.and_time(NaiveTime::MIN),
            end.and_time(NaiveTime::MIN),
        )
    }

    /// Issues `request` and decodes the answer. No retries.
    pub fn send(&self, request: &MarkitRequest) -> Result<MarkitResponse, TrendyError> {
        debug!(symbol = %request.symbol, url = %request.url, "requesting chart data");

        let resp = self
            .client
            .get(request.url.clone())
            .send()
            .map_err(|e| TrendyError::Transport {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TrendyError::Transport {
                reason: status.to_string(),
            });
        }

        let body = resp.text().map_err(|e| TrendyError::Transport {
            reason: format!("failed to read response body: {e}"),
        })?;

        let response = MarkitResponse::from_json(&body).inspect_err(|e| {
            warn!(symbol = %request.symbol, error = %e, "undecodable chart response");
        })?;

        response.check(&request.symbol)
    }
}

impl QuotePort for MarkitAdapter {
    fn fetch_span(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Span, TrendyError> {
        let request = self.build_request(symbol, start, end)?;
        let response = self.send(&request)?;
        Ok(response.span())
    }
}
