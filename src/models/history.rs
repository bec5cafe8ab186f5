use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::ItemKey;

/// Per-item daily values, keyed by calendar date.
///
/// Dates serialize as `YYYY-MM-DD` object keys, so ordering of the inner map
/// is both lexicographic and chronological.
pub type HistorySeries = BTreeMap<ItemKey, BTreeMap<NaiveDate, f64>>;
