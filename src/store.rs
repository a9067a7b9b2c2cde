//! Rate store backed by SQLite
//!
//! Two append-mostly rate tables plus a currency registry. Every row
//! carries a `modified` timestamp stamped on write.

use crate::bulk::BulkEntity;
use crate::currency::Currency;
use crate::error::{RatebookError, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;

/// Equality predicates narrowing a fetch, as (column, value) pairs
pub type Scope<'a> = [(&'a str, Value)];

/// Exchange-rate store with SQLite backend
pub struct RateStore {
    conn: Connection,
}

impl RateStore {
    /// Create or open a store at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| RatebookError::StoreError(format!("Failed to open database: {}", e)))?;

        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            RatebookError::StoreError(format!("Failed to create in-memory database: {}", e))
        })?;

        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS currencies (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    abbrev TEXT NOT NULL UNIQUE,
                    modified TEXT NOT NULL
                )",
                [],
            )
            .map_err(|e| {
                RatebookError::StoreError(format!("Failed to create currencies table: {}", e))
            })?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS exchange_rates (
                    id INTEGER PRIMARY KEY,
                    currency_id INTEGER NOT NULL,
                    date TEXT NOT NULL,
                    rate REAL NOT NULL,
                    modified TEXT NOT NULL,
                    UNIQUE (currency_id, date)
                )",
                [],
            )
            .map_err(|e| {
                RatebookError::StoreError(format!("Failed to create exchange_rates table: {}", e))
            })?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS quarterly_exchange_rates (
                    id INTEGER PRIMARY KEY,
                    currency_id INTEGER NOT NULL,
                    date TEXT NOT NULL,
                    rate REAL NOT NULL,
                    modified TEXT NOT NULL,
                    UNIQUE (currency_id, date)
                )",
                [],
            )
            .map_err(|e| {
                RatebookError::StoreError(format!(
                    "Failed to create quarterly_exchange_rates table: {}",
                    e
                ))
            })?;

        Ok(())
    }

    /// Begin a transaction for a bulk commit
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        self.conn
            .transaction()
            .map_err(|e| RatebookError::StoreError(format!("Failed to begin transaction: {}", e)))
    }

    /// Fetch all rows of an entity table matching the equality scope
    pub fn fetch_all<E: BulkEntity>(&self, scope: &Scope<'_>) -> Result<Vec<E>> {
        let mut sql = format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE);
        if !scope.is_empty() {
            let clauses: Vec<String> = scope
                .iter()
                .map(|(column, _)| format!("{} = ?", column))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| RatebookError::StoreError(format!("Failed to prepare query: {}", e)))?;

        let values: Vec<Value> = scope.iter().map(|(_, value)| value.clone()).collect();
        let rows = stmt
            .query_map(rusqlite::params_from_iter(values), E::from_row)
            .map_err(|e| {
                RatebookError::StoreError(format!("Failed to query {}: {}", E::TABLE, e))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                RatebookError::StoreError(format!("Failed to read {} rows: {}", E::TABLE, e))
            })?;

        Ok(rows)
    }

    /// Row count of an entity table
    pub fn count<E: BulkEntity>(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", E::TABLE);
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| RatebookError::StoreError(format!("Failed to count {}: {}", E::TABLE, e)))?;
        Ok(count as usize)
    }

    /// Store-side average of daily rates for a currency over an inclusive
    /// date range. Returns None when no rows fall in the range.
    pub fn average_daily_rate(
        &self,
        currency_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<f64>> {
        self.conn
            .query_row(
                "SELECT AVG(rate) FROM exchange_rates
                 WHERE currency_id = ?1 AND date >= ?2 AND date <= ?3",
                params![currency_id, start.to_string(), end.to_string()],
                |row| row.get::<_, Option<f64>>(0),
            )
            .map_err(|e| RatebookError::StoreError(format!("Failed to average rates: {}", e)))
    }

    /// Register a currency, returning its id
    pub fn insert_currency(&self, name: &str, abbrev: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO currencies (name, abbrev, modified) VALUES (?1, ?2, ?3)",
                params![name, abbrev, Utc::now().to_rfc3339()],
            )
            .map_err(|e| {
                RatebookError::StoreError(format!("Failed to insert currency {}: {}", abbrev, e))
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up a currency by its abbreviation
    pub fn currency_by_abbrev(&self, abbrev: &str) -> Result<Option<Currency>> {
        self.conn
            .query_row(
                "SELECT id, name, abbrev FROM currencies WHERE abbrev = ?1",
                params![abbrev],
                |row| {
                    Ok(Currency {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        abbrev: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(|e| {
                RatebookError::StoreError(format!("Failed to look up currency {}: {}", abbrev, e))
            })
    }

    /// All registered currencies
    pub fn currencies(&self) -> Result<Vec<Currency>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, abbrev FROM currencies ORDER BY abbrev")
            .map_err(|e| RatebookError::StoreError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Currency {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    abbrev: row.get(2)?,
                })
            })
            .map_err(|e| RatebookError::StoreError(format!("Failed to query currencies: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| RatebookError::StoreError(format!("Failed to read currencies: {}", e)))?;

        Ok(rows)
    }
}
