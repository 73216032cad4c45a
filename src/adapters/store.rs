//! Store backend selection.

use crate::domain::error::TrendyError;
use crate::domain::measure::Span;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StorePort;
use chrono::NaiveDate;

#[cfg(feature = "postgres")]
use crate::adapters::postgres_adapter::PostgresAdapter;
#[cfg(feature = "sqlite")]
use crate::adapters::sqlite_adapter::SqliteAdapter;

/// The configured store. Postgres wins when both are configured and compiled in.
pub enum StoreAdapter {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteAdapter),
    #[cfg(feature = "postgres")]
    Postgres(PostgresAdapter),
}

impl StoreAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrendyError> {
        #[cfg(feature = "postgres")]
        if config.get_string("postgres", "connection_string").is_some() {
            return Ok(Self::Postgres(PostgresAdapter::from_config(config)?));
        }

        #[cfg(feature = "sqlite")]
        if config.get_string("sqlite", "path").is_some() {
            return Ok(Self::Sqlite(SqliteAdapter::from_config(config)?));
        }

        Err(TrendyError::ConfigMissing {
            section: if cfg!(feature = "sqlite") { "sqlite" } else { "postgres" }.into(),
            key: if cfg!(feature = "sqlite") { "path" } else { "connection_string" }.into(),
        })
    }

    /// Creates the `measures` table if it does not exist.
    pub fn initialize_schema(&self) -> Result<(), TrendyError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(a) => a.initialize_schema(),
            #[cfg(feature = "postgres")]
            Self::Postgres(a) => a.initialize_schema(),
        }
    }

    fn inner(&self) -> &dyn StorePort {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(a) => a,
            #[cfg(feature = "postgres")]
            Self::Postgres(a) => a,
        }
    }
}

impl StorePort for StoreAdapter {
    fn get_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Span, TrendyError> {
        self.inner().get_range(symbol, start, end)
    }

    fn insert(&self, symbol: &str, span: &Span) -> Result<(), TrendyError> {
        self.inner().insert(symbol, span)
    }

    fn symbols(&self) -> Result<Vec<String>, TrendyError> {
        self.inner().symbols()
    }

    fn coverage(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendyError> {
        self.inner().coverage(symbol)
    }

    fn delete_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, TrendyError> {
        self.inner().delete_range(symbol, start, end)
    }
}
