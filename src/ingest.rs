//! IMF representative-rates feed ingestion
//!
//! Parses the tab-separated report (rms_rep.aspx?tsvflag=Y): preamble
//! lines, then a header row starting with "Currency" carrying the
//! observation dates, then one row per currency. Malformed cells are
//! dropped silently per row and flow into reconciliation as "no value".

use crate::currency;
use crate::error::{RatebookError, Result};
use crate::loader::DailyItems;
use crate::store::RateStore;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Rates parsed from one feed file, keyed by (currency code, date)
#[derive(Debug, Clone, Default)]
pub struct FeedTable {
    pub rates: HashMap<(String, NaiveDate), Option<f64>>,
}

/// Parse a feed date cell, e.g. "03-Jan-2011"
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%d-%b-%Y").ok()
}

/// Parse a feed rate cell. Anything that is not a number is "no value".
pub fn parse_rate(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Extract the currency code from a feed label, e.g.
/// "Japanese yen(JPY)" -> "JPY"
pub fn parse_currency_label(label: &str) -> Option<&str> {
    let label = label.trim();
    let open = label.rfind('(')?;
    let close = label.rfind(')')?;
    if close != label.len() - 1 || close <= open + 1 {
        return None;
    }
    Some(&label[open + 1..close])
}

/// Parse an IMF TSV report from a reader
pub fn parse_tsv<R: Read>(reader: R) -> Result<FeedTable> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut dates: Option<Vec<Option<NaiveDate>>> = None;
    let mut table = FeedTable::default();

    for record in csv_reader.records() {
        let record = record
            .map_err(|e| RatebookError::ParseError(format!("Failed to read feed row: {}", e)))?;
        let first = record.get(0).unwrap_or("").trim();

        if dates.is_none() {
            // Preamble lines run until the header row
            if first == "Currency" {
                dates = Some(record.iter().skip(1).map(parse_date).collect());
            }
            continue;
        }

        let header_dates = dates.as_ref().unwrap();
        let code = match parse_currency_label(first) {
            Some(code) => code.to_string(),
            None => {
                if !first.is_empty() {
                    log::debug!("Skipping feed row without currency label: {}", first);
                }
                continue;
            }
        };

        for (cell, date) in record.iter().skip(1).zip(header_dates) {
            if let Some(date) = date {
                table
                    .rates
                    .insert((code.clone(), *date), parse_rate(cell));
            }
        }
    }

    if dates.is_none() {
        return Err(RatebookError::ParseError(
            "Feed has no 'Currency' header row".to_string(),
        ));
    }

    Ok(table)
}

/// Read and parse a feed file
pub fn read_feed(path: &Path) -> Result<FeedTable> {
    let file = File::open(path)?;
    parse_tsv(file)
}

/// Resolve a feed table into the engine's keyed daily-rate map.
///
/// Currency codes are resolved against the store's registry; unknown
/// codes are logged and skipped. The inversion policy for configured
/// codes is applied here, before the engine ever sees the values.
pub fn to_new_items(feed: &FeedTable, store: &RateStore) -> Result<DailyItems> {
    let mut ids: HashMap<&str, Option<i64>> = HashMap::new();
    let mut items: DailyItems = HashMap::new();

    for ((code, date), value) in &feed.rates {
        let id = if let Some(cached) = ids.get(code.as_str()).copied() {
            cached
        } else {
            let looked_up = store.currency_by_abbrev(code)?.map(|c| c.id);
            if looked_up.is_none() {
                log::warn!("Unknown currency in feed, skipping: {}", code);
            }
            ids.insert(code.as_str(), looked_up);
            looked_up
        };

        if let Some(currency_id) = id {
            let value = value.map(|rate| currency::apply_inversion(code, rate));
            items.insert((currency_id, *date), value);
        }
    }

    Ok(items)
}
