//! Fiscal quarter calendar
//!
//! Quarters are identified by their fixed end-dates: 3/31, 6/30, 9/30 and
//! 12/31. No other quarter convention is supported.

use crate::error::{RatebookError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four fiscal quarter end boundaries as (month, day) pairs.
pub const QUARTER_ENDS: [(u32, u32); 4] = [(3, 31), (6, 30), (9, 30), (12, 31)];

/// First day of each quarter as (month, day) pairs.
pub const QUARTER_STARTS: [(u32, u32); 4] = [(1, 1), (4, 1), (7, 1), (10, 1)];

/// A fiscal quarter, identified by year and ordinal (1-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quarter {
    year: i32,
    number: u32,
}

impl Quarter {
    /// Create a quarter from year and ordinal
    pub fn new(year: i32, number: u32) -> Result<Self> {
        if !(1..=4).contains(&number) {
            return Err(RatebookError::CalendarError(format!(
                "Quarter ordinal must be 1-4, got {}",
                number
            )));
        }
        Ok(Self { year, number })
    }

    /// Get the quarter containing the given date.
    ///
    /// Total classification: every valid date maps to exactly one quarter.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            number: (date.month0() / 3) + 1,
        }
    }

    /// Convert an exact quarter end-date back into a quarter.
    ///
    /// Fails if the date is not one of the four fixed boundaries.
    pub fn from_end_date(date: NaiveDate) -> Result<Self> {
        let md = (date.month(), date.day());
        match QUARTER_ENDS.iter().position(|&pair| pair == md) {
            Some(index) => Ok(Self {
                year: date.year(),
                number: index as u32 + 1,
            }),
            None => Err(RatebookError::CalendarError(format!(
                "{} is not a quarter end-date",
                date
            ))),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// First day of the quarter
    pub fn start_date(&self) -> NaiveDate {
        let (month, day) = QUARTER_STARTS[(self.number - 1) as usize];
        NaiveDate::from_ymd_opt(self.year, month, day).unwrap()
    }

    /// Fiscal end-date of the quarter, which doubles as its key marker
    pub fn end_date(&self) -> NaiveDate {
        let (month, day) = QUARTER_ENDS[(self.number - 1) as usize];
        NaiveDate::from_ymd_opt(self.year, month, day).unwrap()
    }

    /// Full-year label, e.g. "1Q 2024"
    pub fn label(&self) -> String {
        format!("{}Q {}", self.number, self.year)
    }

    /// Short-year label, e.g. "1Q24"
    pub fn short_label(&self) -> String {
        format!("{}Q{:02}", self.number, self.year.rem_euclid(100))
    }

    /// All four quarter end-dates in the given year, in order
    pub fn dates_in_year(year: i32) -> Vec<NaiveDate> {
        QUARTER_ENDS
            .iter()
            .map(|&(month, day)| NaiveDate::from_ymd_opt(year, month, day).unwrap())
            .collect()
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Get the first day of the quarter containing `date`
pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    Quarter::containing(date).start_date()
}

/// Get the fiscal end-date of the quarter containing `date`
pub fn quarter_end(date: NaiveDate) -> NaiveDate {
    Quarter::containing(date).end_date()
}

/// Number of quarter boundaries between two exact quarter end-dates.
///
/// Both arguments must themselves be boundary dates. Equal dates return 0,
/// adjacent quarters return 1. `end` before `start` is an error.
pub fn quarters_between(start: NaiveDate, end: NaiveDate) -> Result<i64> {
    if end < start {
        return Err(RatebookError::CalendarError(format!(
            "End date {} precedes start date {}",
            end, start
        )));
    }

    let start_q = Quarter::from_end_date(start)?;
    let end_q = Quarter::from_end_date(end)?;

    Ok(i64::from(end_q.year - start_q.year) * 4
        + (i64::from(end_q.number) - i64::from(start_q.number)))
}
