//! PostgreSQL measure store.

use crate::domain::error::TrendyError;
use crate::domain::measure::{Measure, Span};
use crate::domain::settings::pool_size;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StorePort;
use chrono::NaiveDate;
use postgres::NoTls;
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;

type Manager = PostgresConnectionManager<NoTls>;

pub struct PostgresAdapter {
    pool: Pool<Manager>,
}

fn query_err(e: postgres::Error) -> TrendyError {
    TrendyError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrendyError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .ok_or_else(|| TrendyError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let pg_config: postgres::Config =
            connection_string
                .parse()
                .map_err(|e: postgres::Error| TrendyError::ConfigInvalid {
                    section: "postgres".into(),
                    key: "connection_string".into(),
                    reason: e.to_string(),
                })?;

        let pool = Pool::builder()
            .max_size(pool_size(config, "postgres")?)
            .build(PostgresConnectionManager::new(pg_config, NoTls))
            .map_err(|e: r2d2::Error| TrendyError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<Manager>, TrendyError> {
        self.pool.get().map_err(|e: r2d2::Error| TrendyError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), TrendyError> {
        self.conn()?
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS measures (
                    symbol varchar(255) NOT NULL,
                    date date NOT NULL,
                    value float8 NOT NULL,
                    PRIMARY KEY (symbol, date)
                )",
            )
            .map_err(query_err)
    }
}

impl StorePort for PostgresAdapter {
    fn get_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Span, TrendyError> {
        let rows = self
            .conn()?
            .query(
                "SELECT date, value FROM measures \
                 WHERE symbol = $1 AND date >= $2 AND date <= $3 \
                 ORDER BY date ASC",
                &[&symbol, &start, &end],
            )
            .map_err(query_err)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let date: NaiveDate = row.get(0);
                let value: f64 = row.get(1);
                Measure::on(date, value as f32)
            })
            .collect())
    }

    fn insert(&self, symbol: &str, span: &Span) -> Result<(), TrendyError> {
        let mut conn = self.conn()?;
        let mut tx = conn.transaction().map_err(query_err)?;

        // An uncommitted transaction rolls back when dropped.
        for measure in span {
            tx.execute(
                "INSERT INTO measures (symbol, date, value) VALUES ($1, $2, $3)",
                &[&symbol, &measure.date(), &f64::from(measure.value)],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)
    }

    fn symbols(&self) -> Result<Vec<String>, TrendyError> {
        let rows = self
            .conn()?
            .query("SELECT DISTINCT symbol FROM measures ORDER BY symbol", &[])
            .map_err(query_err)?;
        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    fn coverage(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendyError> {
        let row = self
            .conn()?
            .query_one(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM measures WHERE symbol = $1",
                &[&symbol],
            )
            .map_err(query_err)?;

        let min: Option<NaiveDate> = row.get(0);
        let max: Option<NaiveDate> = row.get(1);
        let count: i64 = row.get(2);

        match (min, max) {
            (Some(min), Some(max)) if count > 0 => Ok(Some((min, max, count as usize))),
            _ => Ok(None),
        }
    }

    fn delete_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, TrendyError> {
        let removed = self
            .conn()?
            .execute(
                "DELETE FROM measures WHERE symbol = $1 AND date >= $2 AND date <= $3",
                &[&symbol, &start, &end],
            )
            .map_err(query_err)?;
        Ok(removed as usize)
    }
}
