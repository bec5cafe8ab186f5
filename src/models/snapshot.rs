use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PriceRecord;

/// Key a tracked item is stored under in a snapshot (e.g. `"egg"`, `"gas"`).
pub type ItemKey = String;

// ---------------------------------------------------------------------------
// Snapshot — One complete, timestamped merge of every tracked item
// ---------------------------------------------------------------------------

/// A fully merged set of price records stamped with the time it was built.
///
/// Exactly one snapshot is current at a time; a newer one supersedes it
/// wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub items: BTreeMap<ItemKey, PriceRecord>,
    pub yearly_items: BTreeMap<ItemKey, PriceRecord>,
}

impl Snapshot {
    /// Iterate over regular and yearly records together.
    pub fn all_records(&self) -> impl Iterator<Item = (&ItemKey, &PriceRecord)> {
        self.items.iter().chain(self.yearly_items.iter())
    }

    /// Look up a record in either the regular or the yearly section.
    pub fn get(&self, key: &str) -> Option<&PriceRecord> {
        self.items.get(key).or_else(|| self.yearly_items.get(key))
    }

    /// Total number of records across both sections.
    pub fn len(&self) -> usize {
        self.items.len() + self.yearly_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.yearly_items.is_empty()
    }
}
