//! Quarterly average derivation
//!
//! Averages are computed store-side over the full quarter date range, so
//! they reflect every stored daily row, not just the batch that was just
//! reconciled.

use crate::error::Result;
use crate::quarters::Quarter;
use crate::store::RateStore;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Key tuple of a quarterly rate row: (currency id, quarter end-date)
pub type QuarterKey = (i64, NaiveDate);

/// Derive quarterly average rates for every distinct (currency, quarter)
/// touched by the changed daily keys.
///
/// A `None` value means no daily rows exist in the quarter any more; the
/// subsequent reconciliation pass treats it as a delete, never as a zero
/// rate.
pub fn quarterly_averages(
    store: &RateStore,
    changed_daily: &[(i64, NaiveDate)],
) -> Result<HashMap<QuarterKey, Option<f64>>> {
    let mut averages: HashMap<QuarterKey, Option<f64>> = HashMap::new();

    for &(currency_id, date) in changed_daily {
        let quarter = Quarter::containing(date);
        let key = (currency_id, quarter.end_date());
        if averages.contains_key(&key) {
            continue;
        }

        let average =
            store.average_daily_rate(currency_id, quarter.start_date(), quarter.end_date())?;
        averages.insert(key, average);
    }

    log::debug!(
        "Derived {} quarterly averages from {} changed daily keys",
        averages.len(),
        changed_daily.len()
    );
    Ok(averages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk;
    use crate::model::DailyRate;
    use approx::assert_relative_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn seed(store: &mut RateStore, rows: &[DailyRate]) {
        let tx = store.transaction().unwrap();
        bulk::bulk_insert(&tx, rows).unwrap();
        tx.commit().unwrap();
    }

    #[test]
    fn test_single_quarter_mean() {
        let mut store = RateStore::open_in_memory().unwrap();
        seed(
            &mut store,
            &[
                DailyRate::new(1, date(2011, 1, 10), 82.02),
                DailyRate::new(1, date(2011, 2, 15), 81.50),
                DailyRate::new(1, date(2011, 3, 20), 81.64),
            ],
        );

        // All three changed keys collapse into one quarter
        let changed = vec![
            (1, date(2011, 1, 10)),
            (1, date(2011, 2, 15)),
            (1, date(2011, 3, 20)),
        ];
        let averages = quarterly_averages(&store, &changed).unwrap();

        assert_eq!(averages.len(), 1);
        let value = averages[&(1, date(2011, 3, 31))].unwrap();
        assert_relative_eq!(value, 81.72, epsilon = 1e-9);
    }

    #[test]
    fn test_mean_reflects_rows_outside_the_batch() {
        let mut store = RateStore::open_in_memory().unwrap();
        seed(
            &mut store,
            &[
                DailyRate::new(1, date(2011, 1, 10), 80.0),
                DailyRate::new(1, date(2011, 2, 15), 84.0),
            ],
        );

        // Only one key changed, but the average covers the whole quarter
        let averages = quarterly_averages(&store, &[(1, date(2011, 2, 15))]).unwrap();
        let value = averages[&(1, date(2011, 3, 31))].unwrap();
        assert_relative_eq!(value, 82.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_quarter_yields_none() {
        let store = RateStore::open_in_memory().unwrap();
        let averages = quarterly_averages(&store, &[(1, date(2011, 2, 1))]).unwrap();
        assert_eq!(averages.len(), 1);
        assert!(averages[&(1, date(2011, 3, 31))].is_none());
    }

    #[test]
    fn test_distinct_currencies_and_quarters() {
        let mut store = RateStore::open_in_memory().unwrap();
        seed(
            &mut store,
            &[
                DailyRate::new(1, date(2011, 2, 1), 82.0),
                DailyRate::new(1, date(2011, 5, 1), 84.0),
                DailyRate::new(2, date(2011, 2, 1), 1.6),
            ],
        );

        let changed = vec![
            (1, date(2011, 2, 1)),
            (1, date(2011, 5, 1)),
            (2, date(2011, 2, 1)),
        ];
        let averages = quarterly_averages(&store, &changed).unwrap();
        assert_eq!(averages.len(), 3);
        assert_relative_eq!(averages[&(1, date(2011, 3, 31))].unwrap(), 82.0);
        assert_relative_eq!(averages[&(1, date(2011, 6, 30))].unwrap(), 84.0);
        assert_relative_eq!(averages[&(2, date(2011, 3, 31))].unwrap(), 1.6);
    }
}
