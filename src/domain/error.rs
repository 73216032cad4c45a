//! Domain error types.

/// Top-level error type for trendy.
#[derive(Debug, thiserror::Error)]
pub enum TrendyError {
    /// The quote provider could not be reached or answered with a non-2xx status.
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// The provider answered with an exception envelope instead of data.
    #[error("{message}")]
    ProviderRejection { message: String },

    /// The provider answered successfully but without positions.
    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    /// Malformed JSON or date token from the provider.
    #[error("parse error: {reason}")]
    Parse { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendyError {
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            TrendyError::Database { .. } | TrendyError::DatabaseQuery { .. }
        )
    }

    /// Failures that originate at the quote provider.
    pub fn is_remote_error(&self) -> bool {
        matches!(
            self,
            TrendyError::Transport { .. }
                | TrendyError::ProviderRejection { .. }
                | TrendyError::NoData { .. }
        )
    }
}

impl From<&TrendyError> for std::process::ExitCode {
    fn from(err: &TrendyError) -> Self {
        let code: u8 = match err {
            TrendyError::Io(_) => 1,
            TrendyError::ConfigParse { .. }
            | TrendyError::ConfigMissing { .. }
            | TrendyError::ConfigInvalid { .. } => 2,
            TrendyError::Database { .. } | TrendyError::DatabaseQuery { .. } => 3,
            TrendyError::Transport { .. }
            | TrendyError::ProviderRejection { .. }
            | TrendyError::NoData { .. } => 4,
            TrendyError::Parse { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
