//! Chart API request construction.

use super::iso_time::REQUEST_FORMAT;
use super::response::{Element, ElementKind};
use crate::domain::error::TrendyError;
use chrono::NaiveDateTime;
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const DATA_PERIOD_DAY: &str = "Day";

/// The JSON object carried in the `parameters` query value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestParams {
    pub normalized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_days: Option<u32>,
    pub data_period: String,
    pub elements: Vec<Element>,
}

impl RequestParams {
    /// Daily price (OHLC) and volume series for `symbol` over `[start, end]`.
    pub fn daily(symbol: &str, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            normalized: false,
            start_date: Some(start.format(REQUEST_FORMAT).to_string()),
            end_date: Some(end.format(REQUEST_FORMAT).to_string()),
            number_of_days: None,
            data_period: DATA_PERIOD_DAY.to_string(),
            elements: vec![
                Element::requested(symbol, ElementKind::Price, &["ohlc"]),
                Element::requested(symbol, ElementKind::Volume, &[]),
            ],
        }
    }

    /// The symbol of the first requested element.
    pub fn symbol(&self) -> Option<&str> {
        self.elements.first().map(|e| e.symbol.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct MarkitRequest {
    pub symbol: String,
    pub params: RequestParams,
    pub url: Url,
}

impl MarkitRequest {
    pub fn new(
        base_url: &str,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self, TrendyError> {
        let params = RequestParams::daily(symbol, start, end);
        let json = serde_json::to_string(&params).map_err(|e| TrendyError::Parse {
            reason: format!("failed to encode request parameters: {e}"),
        })?;
        let url = Url::parse_with_params(base_url, &[("parameters", json.as_str())]).map_err(
            |e| TrendyError::Transport {
                reason: format!("invalid provider url {base_url:?}: {e}"),
            },
        )?;

        Ok(Self {
            symbol: symbol.to_string(),
            params,
            url,
        })
    }

    /// Decodes the `parameters` query value back into its object.
    pub fn decode_params(url: &Url) -> Option<RequestParams> {
        url.query_pairs()
            .find(|(k, _)| k == "parameters")
            .and_then(|(_, v)| serde_json::from_str(&v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn params_serialize_compactly() {
        let params = RequestParams::daily("AMZN", at(2011, 5, 20, 0), at(2011, 6, 19, 0));
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"Normalized":false,"StartDate":"2011-05-20T00:00:00","#,
                r#""EndDate":"2011-06-19T00:00:00","DataPeriod":"Day","#,
                r#""Elements":[{"Symbol":"AMZN","Type":"price","Params":["ohlc"]},"#,
                r#"{"Symbol":"AMZN","Type":"volume"}]}"#
            )
        );
    }

    #[test]
    fn url_carries_params_as_single_query_value() {
        let request = MarkitRequest::new(
            "http://dev.markitondemand.com/Api/v2/InteractiveChart/json",
            "MSFT",
            at(2011, 5, 20, 12),
            at(2011, 6, 19, 12),
        )
        .unwrap();

        assert_eq!(request.url.path(), "/Api/v2/InteractiveChart/json");
        assert_eq!(request.url.query_pairs().count(), 1);

        let decoded = MarkitRequest::decode_params(&request.url).unwrap();
        assert_eq!(decoded, request.params);
        assert_eq!(decoded.symbol(), Some("MSFT"));
        assert_eq!(decoded.start_date.as_deref(), Some("2011-05-20T12:00:00"));
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let result = MarkitRequest::new("not a url", "MSFT", at(2011, 5, 20, 0), at(2011, 5, 21, 0));
        assert!(matches!(result, Err(TrendyError::Transport { .. })));
    }
}
