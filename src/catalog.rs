//! The set of tracked items and how each one is sourced.
//!
//! Every item names the upstream field it is published under, an ordered
//! list of sources to take it from (first success wins), and a hardcoded
//! baseline used by the synthetic generator when no source produced it.

use crate::models::SourceId;

/// Hardcoded values the synthetic generator falls back to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Baseline {
    /// A price pair.
    Price { current: f64, previous: f64 },
    /// A year-over-year percent increase.
    Yearly { percent: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemSpec {
    /// Key under which the item appears in a snapshot.
    pub key: &'static str,
    /// Name the upstream sources publish the item under; also the record name.
    pub upstream: &'static str,
    /// Sources to take the item from, highest priority first.
    pub precedence: Vec<SourceId>,
    /// Source credited on a synthetic fallback record.
    pub origin: SourceId,
    pub baseline: Baseline,
}

impl ItemSpec {
    pub fn price(
        key: &'static str,
        upstream: &'static str,
        precedence: &[SourceId],
        origin: SourceId,
        current: f64,
        previous: f64,
    ) -> Self {
        Self {
            key,
            upstream,
            precedence: precedence.to_vec(),
            origin,
            baseline: Baseline::Price { current, previous },
        }
    }

    pub fn yearly(
        key: &'static str,
        upstream: &'static str,
        precedence: &[SourceId],
        origin: SourceId,
        percent: f64,
    ) -> Self {
        Self {
            key,
            upstream,
            precedence: precedence.to_vec(),
            origin,
            baseline: Baseline::Yearly { percent },
        }
    }

    pub fn is_yearly(&self) -> bool {
        matches!(self.baseline, Baseline::Yearly { .. })
    }
}

/// Ordered list of tracked items.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    items: Vec<ItemSpec>,
}

impl Catalog {
    pub fn new(items: Vec<ItemSpec>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ItemSpec] {
        &self.items
    }

    pub fn get(&self, key: &str) -> Option<&ItemSpec> {
        self.items.iter().find(|i| i.key == key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Catalog {
    /// Seven monthly consumer prices plus the apparel yearly increase.
    fn default() -> Self {
        use SourceId::{Bls, Eia, Usda};
        Self::new(vec![
            ItemSpec::price("egg", "eggs", &[Bls], Bls, 3.29, 3.34),
            ItemSpec::price("milk", "milk", &[Bls], Bls, 4.15, 4.07),
            ItemSpec::price("bread", "bread", &[Bls], Bls, 2.89, 2.91),
            ItemSpec::price("gas", "gasoline", &[Eia], Eia, 3.45, 3.33),
            ItemSpec::price("chicken", "chicken", &[Usda, Bls], Usda, 2.89, 2.72),
            ItemSpec::price("coffee", "coffee", &[Bls], Bls, 8.75, 8.30),
            ItemSpec::price("cheese", "cheese", &[Bls], Bls, 6.49, 6.15),
            ItemSpec::yearly("apparel", "apparel", &[Bls], Bls, 4.2),
        ])
    }
}
