//! Chart API response model and span extraction.

use super::iso_time::IsoTime;
use crate::domain::error::TrendyError;
use crate::domain::measure::{Measure, Span};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Price,
    Volume,
    #[serde(other)]
    Other,
}

/// A requested series, and in a response the series data for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Element {
    pub symbol: String,
    #[serde(rename = "Type")]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(rename = "TimeStamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "DataSeries", default, skip_serializing_if = "Option::is_none")]
    pub data_series: Option<DataSeries>,
}

impl Element {
    pub fn requested(symbol: &str, kind: ElementKind, params: &[&str]) -> Self {
        Self {
            symbol: symbol.to_string(),
            kind,
            params: params.iter().map(|p| p.to_string()).collect(),
            currency: None,
            timestamp: None,
            data_series: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSeries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<SeriesData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<SeriesData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<SeriesData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<SeriesData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<SeriesData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesData {
    #[serde(default)]
    pub min: f32,
    #[serde(default)]
    pub max: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<IsoTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<IsoTime>,
    #[serde(default)]
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub pos: Vec<String>,
    #[serde(default)]
    pub priorities: Vec<String>,
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(default)]
    pub utcdates: Vec<String>,
}

/// Price sub-series selectable from the price element. Volume is carried by
/// its own element and is not exposed as a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

impl DataSeries {
    pub fn get(&self, field: PriceField) -> Option<&SeriesData> {
        match field {
            PriceField::Open => self.open.as_ref(),
            PriceField::High => self.high.as_ref(),
            PriceField::Low => self.low.as_ref(),
            PriceField::Close => self.close.as_ref(),
        }
    }
}

/// A decoded chart response. Either the data fields or the exception
/// envelope fields are populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarkitResponse {
    #[serde(default)]
    pub labels: Option<Labels>,
    #[serde(default)]
    pub positions: Option<Vec<f32>>,
    #[serde(default)]
    pub dates: Option<Vec<IsoTime>>,
    #[serde(default)]
    pub elements: Option<Vec<Element>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_exception: Option<serde_json::Value>,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl MarkitResponse {
    pub fn from_json(body: &str) -> Result<Self, TrendyError> {
        serde_json::from_str(body).map_err(|e| TrendyError::Parse {
            reason: format!("could not decode response from Markit: {e}"),
        })
    }

    /// Maps an exception envelope to [`TrendyError::ProviderRejection`] and
    /// a missing positions array to [`TrendyError::NoData`].
    pub fn check(self, symbol: &str) -> Result<Self, TrendyError> {
        if let Some(kind) = non_empty(&self.exception_type) {
            let mut message = format!("Exception Response from MarkitChartAPI \"{kind}\"");
            if let Some(msg) = non_empty(&self.message) {
                message.push_str(&format!(": \"{msg}\""));
            }
            if let Some(details) = non_empty(&self.details) {
                message.push_str(&format!(" - \"{details}\""));
            }
            return Err(TrendyError::ProviderRejection { message });
        }

        if self.positions.is_none() {
            return Err(TrendyError::NoData {
                symbol: symbol.to_string(),
            });
        }

        Ok(self)
    }

    /// Closing values zipped with the response dates.
    pub fn span(&self) -> Span {
        self.span_for(PriceField::Close)
    }

    /// Values of `field` from the price element, zipped index-for-index with
    /// the response dates. Empty when there is no price element or no such
    /// sub-series.
    pub fn span_for(&self, field: PriceField) -> Span {
        let price = self
            .elements
            .iter()
            .flatten()
            .rev()
            .find(|e| e.kind == ElementKind::Price);

        let Some(series) = price
            .and_then(|e| e.data_series.as_ref())
            .and_then(|ds| ds.get(field))
        else {
            return Span::new();
        };

        let dates = self.dates.as_deref().unwrap_or_default();
        series
            .values
            .iter()
            .zip(dates)
            .map(|(&value, date)| Measure::new(date.to_utc(), value))
            .collect()
    }
}
