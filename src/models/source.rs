use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SourceId — Upstream statistics provider
// ---------------------------------------------------------------------------

/// One of the upstream statistics providers an item can originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceId {
    /// Bureau of Labor Statistics.
    #[serde(rename = "BLS")]
    Bls,
    /// Energy Information Administration.
    #[serde(rename = "EIA")]
    Eia,
    /// U.S. Department of Agriculture.
    #[serde(rename = "USDA")]
    Usda,
}

impl SourceId {
    pub const ALL: [SourceId; 3] = [SourceId::Bls, SourceId::Eia, SourceId::Usda];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Bls => "BLS",
            SourceId::Eia => "EIA",
            SourceId::Usda => "USDA",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SourceStatus — Health of a source as last observed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    #[default]
    Pending,
    Loading,
    Success,
    Error,
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceStatus::Pending => "pending",
            SourceStatus::Loading => "loading",
            SourceStatus::Success => "success",
            SourceStatus::Error => "error",
        };
        f.write_str(s)
    }
}
