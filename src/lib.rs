//! # Ratebook
//!
//! Exchange-rate bookkeeping: reconcile periodic currency rate feeds
//! against a SQLite store and derive quarterly average rates from the
//! reconciled daily series.
//!
//! The reconciliation engine diffs a keyed map of new values against the
//! stored rows, classifies every key (added, updated, deleted, value
//! unchanged or ignored zero) and applies the resulting plan with chunked
//! bulk writes inside a single transaction.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ratebook::prelude::*;
//! use std::collections::HashMap;
//!
//! # fn main() -> ratebook::error::Result<()> {
//! let mut store = RateStore::open_in_memory()?;
//! let jpy = store.insert_currency("Japanese yen", "JPY")?;
//!
//! let mut items: DailyItems = HashMap::new();
//! let date = chrono::NaiveDate::from_ymd_opt(2011, 2, 1).unwrap();
//! items.insert((jpy, date), Some(82.02));
//!
//! let report = load_daily_rates(&mut store, &items, ReconcileOptions::default())?;
//! assert_eq!(report.daily.added, 1);
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod console;
pub mod currency;
pub mod error;
pub mod ingest;
pub mod loader;
pub mod model;
pub mod quarterly;
pub mod quarters;
pub mod reconcile;
pub mod store;

pub mod prelude {
    //! Commonly used types and functions
    pub use crate::bulk::{BulkEntity, PARAM_CEILING};
    pub use crate::currency::Currency;
    pub use crate::error::{RatebookError, Result};
    pub use crate::loader::{load_daily_rates, DailyItems, LoadReport};
    pub use crate::model::{DailyRate, QuarterlyRate};
    pub use crate::quarters::Quarter;
    pub use crate::reconcile::{ReconcileOptions, ReconcileStatus};
    pub use crate::store::RateStore;
}
