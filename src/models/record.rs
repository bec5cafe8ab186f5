use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::SourceId;

/// Percent change reported when there is no previous value to compare with,
/// and for every yearly record.
pub const NO_BASELINE_PERCENT: f64 = 100.0;

// ---------------------------------------------------------------------------
// HistoryPoint — One dated value in a record's trailing series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// PriceRecord — Latest value of one tracked item
// ---------------------------------------------------------------------------

/// Latest observation for a tracked item.
///
/// `change` and `percent_change` are derived from `current` and `previous`
/// at construction time and never recomputed; a refresh replaces the whole
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub name: String,
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub percent_change: f64,
    pub source: SourceId,
    pub history: Vec<HistoryPoint>,
}

impl PriceRecord {
    /// Build a price record, deriving the absolute and relative change.
    pub fn new(
        name: impl Into<String>,
        current: f64,
        previous: f64,
        source: SourceId,
        history: Vec<HistoryPoint>,
    ) -> Self {
        let change = round_to(current - previous, 2);
        let percent_change = if previous != 0.0 {
            round_to(change / previous * 100.0, 1)
        } else {
            NO_BASELINE_PERCENT
        };
        Self {
            name: name.into(),
            current,
            previous,
            change,
            percent_change,
            source,
            history,
        }
    }

    /// Build a year-over-year record.
    ///
    /// `current` carries the yearly percent increase itself. `previous` is 0,
    /// `change` mirrors `current`, and `percent_change` is always 100
    /// regardless of the yearly figure.
    pub fn yearly(
        name: impl Into<String>,
        yearly_percent: f64,
        source: SourceId,
        history: Vec<HistoryPoint>,
    ) -> Self {
        Self {
            name: name.into(),
            current: yearly_percent,
            previous: 0.0,
            change: yearly_percent,
            percent_change: NO_BASELINE_PERCENT,
            source,
            history,
        }
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
