//! Runtime settings read and validated from configuration.

use crate::domain::error::TrendyError;
use crate::ports::config_port::ConfigPort;
use std::time::Duration;

pub const DEFAULT_MARKIT_URL: &str = "http://dev.markitondemand.com/Api/v2/InteractiveChart/json";
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
pub const DEFAULT_POOL_SIZE: i64 = 4;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct MarkitSettings {
    pub url: String,
    pub timeout: Duration,
}

pub fn markit_settings(config: &dyn ConfigPort) -> Result<MarkitSettings, TrendyError> {
    let url = config
        .get_string("markit", "url")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MARKIT_URL.to_string());

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(TrendyError::ConfigInvalid {
            section: "markit".to_string(),
            key: "url".to_string(),
            reason: "url must be http or https".to_string(),
        });
    }

    let secs = config.get_double("markit", "timeout_secs", DEFAULT_TIMEOUT_SECS);
    if !secs.is_finite() || secs <= 0.0 {
        return Err(TrendyError::ConfigInvalid {
            section: "markit".to_string(),
            key: "timeout_secs".to_string(),
            reason: "timeout_secs must be positive".to_string(),
        });
    }

    Ok(MarkitSettings {
        url,
        timeout: Duration::from_secs_f64(secs),
    })
}

pub fn pool_size(config: &dyn ConfigPort, section: &str) -> Result<u32, TrendyError> {
    let size = config.get_int(section, "pool_size", DEFAULT_POOL_SIZE);
    if size <= 0 || size > u32::MAX as i64 {
        return Err(TrendyError::ConfigInvalid {
            section: section.to_string(),
            key: "pool_size".to_string(),
            reason: "pool_size must be a positive integer".to_string(),
        });
    }
    Ok(size as u32)
}

pub fn log_level(config: &dyn ConfigPort) -> String {
    config
        .get_string("logging", "level")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// Whether log lines carry terminal colour codes. On unless `[logging] ansi` says otherwise.
pub fn log_ansi(config: &dyn ConfigPort) -> bool {
    config.get_bool("logging", "ansi", true)
}
