//! Currency registry rows and feed-side rate inversion policy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency codes whose feed rates are quoted inverted (units per USD
/// rather than USD per unit) and must be flipped before reconciliation.
pub const INVERTED_CODES: [&str; 4] = ["EUR", "GBP", "AUD", "NZD"];

/// A currency known to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: i64,
    pub name: String,
    pub abbrev: String,
}

impl Currency {
    /// Whether this currency's feed rate requires inversion
    pub fn needs_inversion(&self) -> bool {
        needs_inversion(&self.abbrev)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.abbrev)
    }
}

/// Whether a currency code is quoted inverted in the upstream feed
pub fn needs_inversion(code: &str) -> bool {
    INVERTED_CODES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(code))
}

/// Apply the feed inversion rule: configured codes get `rate -> 1/rate`.
///
/// Non-positive rates are passed through untouched so that downstream
/// validation rejects them rather than masking them behind a division.
pub fn apply_inversion(code: &str, rate: f64) -> f64 {
    if needs_inversion(code) && rate > 0.0 {
        1.0 / rate
    } else {
        rate
    }
}
