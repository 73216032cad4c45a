//! Provider date tokens, `YYYY-MM-DDTHH:MM:SS-00`.

use crate::domain::error::TrendyError;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Format of request dates. No offset is sent.
pub const REQUEST_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The offset the provider appends to response dates and often truncates.
pub const OFFSET_SUFFIX: &str = "-00";

/// An instant read from or written to the provider wire format, held in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoTime(pub DateTime<Utc>);

impl IsoTime {
    /// Parses a response token, re-appending a truncated `-00` offset first.
    pub fn parse(token: &str) -> Result<Self, TrendyError> {
        let repaired: Cow<str> = if has_offset(token) {
            Cow::Borrowed(token)
        } else {
            Cow::Owned(format!("{token}{OFFSET_SUFFIX}"))
        };

        let invalid = |reason: String| TrendyError::Parse {
            reason: format!("invalid date token {token:?}: {reason}"),
        };

        let split = repaired.len() - OFFSET_SUFFIX.len();
        let (stamp, offset) = match (repaired.get(..split), repaired.get(split + 1..)) {
            (Some(stamp), Some(offset)) => (stamp, offset),
            _ => return Err(invalid("malformed offset".to_string())),
        };

        let naive = NaiveDateTime::parse_from_str(stamp, REQUEST_FORMAT)
            .map_err(|e| invalid(e.to_string()))?;
        let hours: i32 = offset
            .parse()
            .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
        let zone = FixedOffset::west_opt(hours * 3600)
            .ok_or_else(|| invalid(format!("offset out of range: -{offset}")))?;
        let local = zone
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| invalid("ambiguous local time".to_string()))?;

        Ok(IsoTime(local.with_timezone(&Utc)))
    }

    pub fn to_utc(self) -> DateTime<Utc> {
        self.0
    }
}

/// The third-from-last character of a complete token is the offset's `-`.
fn has_offset(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() >= OFFSET_SUFFIX.len() && bytes[bytes.len() - OFFSET_SUFFIX.len()] == b'-'
}

impl fmt::Display for IsoTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0.format(REQUEST_FORMAT), OFFSET_SUFFIX)
    }
}

impl From<DateTime<Utc>> for IsoTime {
    fn from(dt: DateTime<Utc>) -> Self {
        IsoTime(dt)
    }
}

impl Serialize for IsoTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IsoTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        IsoTime::parse(&token).map_err(serde::de::Error::custom)
    }
}
