//! SQLite measure store.

use crate::domain::error::TrendyError;
use crate::domain::measure::{Measure, Span};
use crate::domain::settings::pool_size;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StorePort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> TrendyError {
    TrendyError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(raw.len(), rusqlite::types::Type::Text, Box::new(e))
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrendyError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TrendyError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size(config, "sqlite")?)
            .build(manager)
            .map_err(|e: r2d2::Error| TrendyError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TrendyError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TrendyError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TrendyError> {
        self.pool.get().map_err(|e: r2d2::Error| TrendyError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), TrendyError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS measures (
                    symbol TEXT NOT NULL,
                    date DATE NOT NULL,
                    value REAL NOT NULL,
                    PRIMARY KEY (symbol, date)
                );",
            )
            .map_err(query_err)
    }
}

impl StorePort for SqliteAdapter {
    fn get_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Span, TrendyError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, value FROM measures
                 WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(
                params![
                    symbol,
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    let raw: String = row.get(0)?;
                    let value: f64 = row.get(1)?;
                    Ok(Measure::on(parse_date(&raw)?, value as f32))
                },
            )
            .map_err(query_err)?;

        rows.collect::<Result<Span, _>>().map_err(query_err)
    }

    fn insert(&self, symbol: &str, span: &Span) -> Result<(), TrendyError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        // Dropping `tx` on an early return rolls the batch back.
        for measure in span {
            tx.execute(
                "INSERT INTO measures (symbol, date, value) VALUES (?1, ?2, ?3)",
                params![
                    symbol,
                    measure.date().format(DATE_FORMAT).to_string(),
                    f64::from(measure.value)
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)
    }

    fn symbols(&self) -> Result<Vec<String>, TrendyError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM measures ORDER BY symbol")
            .map_err(query_err)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;
        rows.collect::<Result<Vec<String>, _>>().map_err(query_err)
    }

    fn coverage(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendyError> {
        let conn = self.conn()?;
        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM measures WHERE symbol = ?1",
                params![symbol],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_err)?;

        match result {
            (Some(min), Some(max), count) if count > 0 => Ok(Some((
                parse_date(&min).map_err(query_err)?,
                parse_date(&max).map_err(query_err)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }

    fn delete_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, TrendyError> {
        self.conn()?
            .execute(
                "DELETE FROM measures WHERE symbol = ?1 AND date >= ?2 AND date <= ?3",
                params![
                    symbol,
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string()
                ],
            )
            .map_err(query_err)
    }
}
