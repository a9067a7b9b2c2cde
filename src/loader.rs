//! Two-pass load pipeline: daily reconciliation, then quarterly derivation

use crate::error::Result;
use crate::model::{DailyRate, QuarterlyRate};
use crate::quarterly;
use crate::reconcile::{self, ReconcileOptions, ReconcileStatus};
use crate::store::RateStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Keyed daily-rate map handed to the engine: (currency id, date) to rate.
/// `None` means "delete if present".
pub type DailyItems = HashMap<(i64, NaiveDate), Option<f64>>;

/// Status of both reconciliation passes of one load
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub daily: ReconcileStatus,
    pub quarterly: ReconcileStatus,
    /// Whether the daily pass was committed
    pub persisted: bool,
}

/// Reconcile daily rates, then derive and reconcile quarterly averages.
///
/// When the daily pass computes a plan but does not persist it (a declined
/// prompt), the quarterly pass is skipped: its averages would be read from
/// an unchanged daily table. A dry run previews both passes.
pub fn load_daily_rates(
    store: &mut RateStore,
    items: &DailyItems,
    options: ReconcileOptions,
) -> Result<LoadReport> {
    let daily = reconcile::reconcile::<DailyRate, _>(
        store,
        items,
        &[],
        |key, value| DailyRate::new(key.0, key.1, value),
        None,
        options,
    )?;

    if !daily.persisted && !options.dry_run {
        log::info!("Daily pass not persisted, skipping quarterly derivation");
        return Ok(LoadReport {
            daily: daily.status,
            quarterly: ReconcileStatus::default(),
            persisted: false,
        });
    }

    let averages = quarterly::quarterly_averages(store, &daily.changed)?;
    let quarterly = reconcile::reconcile::<QuarterlyRate, _>(
        store,
        &averages,
        &[],
        |key, value| QuarterlyRate::new(key.0, key.1, value),
        None,
        // One confirmation covers the whole run; the derived pass is
        // never prompted separately.
        ReconcileOptions {
            dry_run: options.dry_run,
            prompt: false,
        },
    )?;

    Ok(LoadReport {
        daily: daily.status,
        quarterly: quarterly.status,
        persisted: daily.persisted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rusqlite::types::Value;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_load_writes_daily_and_quarterly() {
        let mut store = RateStore::open_in_memory().unwrap();
        let mut items: DailyItems = HashMap::new();
        items.insert((1, date(2011, 1, 10)), Some(82.02));
        items.insert((1, date(2011, 2, 15)), Some(81.50));
        items.insert((1, date(2011, 3, 20)), Some(81.64));

        let report = load_daily_rates(&mut store, &items, ReconcileOptions::default()).unwrap();

        assert_eq!(report.daily.added, 3);
        assert_eq!(report.quarterly.added, 1);
        assert!(report.persisted);

        let quarters: Vec<QuarterlyRate> = store.fetch_all(&[]).unwrap();
        assert_eq!(quarters.len(), 1);
        assert_eq!(quarters[0].date, date(2011, 3, 31));
        assert_relative_eq!(quarters[0].rate, 81.72, epsilon = 1e-9);
    }

    #[test]
    fn test_quarterly_row_tracks_daily_updates() {
        let mut store = RateStore::open_in_memory().unwrap();
        let mut items: DailyItems = HashMap::new();
        items.insert((1, date(2011, 1, 10)), Some(80.0));
        items.insert((1, date(2011, 2, 15)), Some(84.0));
        load_daily_rates(&mut store, &items, ReconcileOptions::default()).unwrap();

        // Second feed revises one observation
        items.insert((1, date(2011, 2, 15)), Some(86.0));
        let report = load_daily_rates(&mut store, &items, ReconcileOptions::default()).unwrap();

        assert_eq!(report.daily.updated, 1);
        assert_eq!(report.daily.value_unchanged, 1);
        assert_eq!(report.quarterly.updated, 1);

        let quarters: Vec<QuarterlyRate> = store.fetch_all(&[]).unwrap();
        assert_relative_eq!(quarters[0].rate, 83.0, epsilon = 1e-9);
    }

    #[test]
    fn test_deleting_last_daily_row_deletes_quarterly_row() {
        let mut store = RateStore::open_in_memory().unwrap();
        let mut items: DailyItems = HashMap::new();
        items.insert((1, date(2011, 2, 1)), Some(82.0));
        load_daily_rates(&mut store, &items, ReconcileOptions::default()).unwrap();
        assert_eq!(store.count::<QuarterlyRate>().unwrap(), 1);

        items.insert((1, date(2011, 2, 1)), None);
        let report = load_daily_rates(&mut store, &items, ReconcileOptions::default()).unwrap();

        assert_eq!(report.daily.deleted, 1);
        assert_eq!(report.quarterly.deleted, 1);
        assert_eq!(store.count::<DailyRate>().unwrap(), 0);
        assert_eq!(store.count::<QuarterlyRate>().unwrap(), 0);
    }

    #[test]
    fn test_dry_run_previews_both_passes() {
        let mut store = RateStore::open_in_memory().unwrap();
        let mut items: DailyItems = HashMap::new();
        items.insert((1, date(2011, 2, 1)), Some(82.0));

        let options = ReconcileOptions {
            dry_run: true,
            prompt: false,
        };
        let report = load_daily_rates(&mut store, &items, options).unwrap();

        assert_eq!(report.daily.added, 1);
        assert!(!report.persisted);
        assert_eq!(store.count::<DailyRate>().unwrap(), 0);
        assert_eq!(store.count::<QuarterlyRate>().unwrap(), 0);
    }

    #[test]
    fn test_other_currency_quarter_untouched() {
        let mut store = RateStore::open_in_memory().unwrap();
        let mut first: DailyItems = HashMap::new();
        first.insert((2, date(2011, 2, 1)), Some(1.6));
        load_daily_rates(&mut store, &first, ReconcileOptions::default()).unwrap();

        let mut second: DailyItems = HashMap::new();
        second.insert((1, date(2011, 2, 1)), Some(82.0));
        let report = load_daily_rates(&mut store, &second, ReconcileOptions::default()).unwrap();

        // Currency 2's quarterly row is outside the changed key set
        assert_eq!(report.quarterly.added, 1);
        assert_eq!(report.quarterly.value_unchanged, 0);

        let other: Vec<QuarterlyRate> = store
            .fetch_all(&[("currency_id", Value::Integer(2))])
            .unwrap();
        assert_eq!(other.len(), 1);
        assert_relative_eq!(other[0].rate, 1.6);
    }
}
