//! Persisted rate row types
//!
//! Both tables share the same shape: a currency reference, a date, a
//! positive rate and a last-modified timestamp. Daily rows are keyed by
//! (currency, observation date); quarterly rows by (currency, quarter
//! end-date).

use crate::bulk::BulkEntity;
use crate::error::{RatebookError, Result};
use crate::quarters::Quarter;
use chrono::{NaiveDate, Utc};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

fn parse_date_column(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(index)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn validate_rate(rate: f64) -> Result<()> {
    if rate <= 0.0 {
        return Err(RatebookError::ValidationError(format!(
            "An exchange rate must be greater than zero, got {}",
            rate
        )));
    }
    Ok(())
}

/// An exchange rate observed at end of day, daily
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRate {
    pub id: Option<i64>,
    pub currency_id: i64,
    pub date: NaiveDate,
    pub rate: f64,
}

impl DailyRate {
    /// Create an unsaved daily rate row
    pub fn new(currency_id: i64, date: NaiveDate, rate: f64) -> Self {
        Self {
            id: None,
            currency_id,
            date,
            rate,
        }
    }
}

impl BulkEntity for DailyRate {
    type Key = (i64, NaiveDate);

    const TABLE: &'static str = "exchange_rates";
    const COLUMNS: &'static [&'static str] = &["id", "currency_id", "date", "rate", "modified"];
    const BULK_CAPABLE: bool = true;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn key(&self) -> Self::Key {
        (self.currency_id, self.date)
    }

    fn value(&self) -> f64 {
        self.rate
    }

    fn set_value(&mut self, value: f64) {
        self.rate = value;
    }

    fn bind(&self) -> Vec<Value> {
        vec![
            self.id.map_or(Value::Null, Value::Integer),
            Value::Integer(self.currency_id),
            Value::Text(self.date.to_string()),
            Value::Real(self.rate),
            Value::Text(Utc::now().to_rfc3339()),
        ]
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            currency_id: row.get(1)?,
            date: parse_date_column(row, 2)?,
            rate: row.get(3)?,
        })
    }

    fn validate(&self) -> Result<()> {
        validate_rate(self.rate)
    }
}

/// The average exchange rate for a quarter, keyed by the quarter's
/// fiscal end-date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyRate {
    pub id: Option<i64>,
    pub currency_id: i64,
    pub date: NaiveDate,
    pub rate: f64,
}

impl QuarterlyRate {
    /// Create an unsaved quarterly rate row keyed by quarter end-date
    pub fn new(currency_id: i64, date: NaiveDate, rate: f64) -> Self {
        Self {
            id: None,
            currency_id,
            date,
            rate,
        }
    }

    /// Create an unsaved quarterly rate row for a quarter
    pub fn for_quarter(currency_id: i64, quarter: Quarter, rate: f64) -> Self {
        Self::new(currency_id, quarter.end_date(), rate)
    }

    /// The quarter this row represents
    pub fn quarter(&self) -> Result<Quarter> {
        Quarter::from_end_date(self.date)
    }
}

impl BulkEntity for QuarterlyRate {
    type Key = (i64, NaiveDate);

    const TABLE: &'static str = "quarterly_exchange_rates";
    const COLUMNS: &'static [&'static str] = &["id", "currency_id", "date", "rate", "modified"];
    const BULK_CAPABLE: bool = true;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn key(&self) -> Self::Key {
        (self.currency_id, self.date)
    }

    fn value(&self) -> f64 {
        self.rate
    }

    fn set_value(&mut self, value: f64) {
        self.rate = value;
    }

    fn bind(&self) -> Vec<Value> {
        vec![
            self.id.map_or(Value::Null, Value::Integer),
            Value::Integer(self.currency_id),
            Value::Text(self.date.to_string()),
            Value::Real(self.rate),
            Value::Text(Utc::now().to_rfc3339()),
        ]
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            currency_id: row.get(1)?,
            date: parse_date_column(row, 2)?,
            rate: row.get(3)?,
        })
    }

    fn validate(&self) -> Result<()> {
        validate_rate(self.rate)
    }
}
