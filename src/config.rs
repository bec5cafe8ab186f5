use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::SourceId;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const BLS_API: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";
pub const EIA_API: &str = "https://api.eia.gov/series/";
pub const USDA_API: &str = "https://api.data.gov/usda/nass/api/";

/// Storage keys for the three persisted documents.
pub const SNAPSHOT_KEY: &str = "amoxiq_price_data";
pub const HISTORY_KEY: &str = "amoxiq_history_data";
pub const CONFIG_KEY: &str = "amoxiq_api_config";

pub const MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);
pub const CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const STARTUP_RECHECK_DELAY: Duration = Duration::from_secs(2);
pub const SOURCE_TIMEOUT: Duration = Duration::from_secs(30);
pub const TESTING_STATUS_DELAY: Duration = Duration::from_secs(1);
pub const PROBE_DELAY: Duration = Duration::from_secs(1);
pub const NOTIFICATION_DURATION: Duration = Duration::from_millis(5000);

/// Artificial latency range for synthetic fetches, in milliseconds.
pub const SYNTHETIC_LATENCY_MS: Range<u64> = 200..700;

/// Days of history kept per item.
pub const HISTORY_WINDOW: usize = 365;

/// Monthly points fabricated for a synthetic record's trailing history.
pub const SYNTHETIC_HISTORY_MONTHS: u32 = 12;

pub fn endpoint(source: SourceId) -> &'static str {
    match source {
        SourceId::Bls => BLS_API,
        SourceId::Eia => EIA_API,
        SourceId::Usda => USDA_API,
    }
}

/// Upstream item name -> provider series identifier.
pub fn series_ids(source: SourceId) -> HashMap<&'static str, &'static str> {
    match source {
        SourceId::Bls => HashMap::from([
            ("eggs", "APU0000708111"),
            ("milk", "APU0000709112"),
            ("bread", "APU0000702111"),
            ("chicken", "APU0000706111"),
            ("coffee", "APU0000717311"),
            ("cheese", "APU0000710212"),
            ("apparel", "CUUR0000SAA"),
        ]),
        SourceId::Eia => HashMap::from([("gasoline", "PET.EMM_EPM0_PTE_NUS_DPG.W")]),
        SourceId::Usda => HashMap::from([("chicken", "poultry/chicken-retail")]),
    }
}

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_local_dir() {
        data.join("amoxiq")
    } else {
        PathBuf::from(".amoxiq-data")
    }
}

// ---------------------------------------------------------------------------
// ApiConfig — Persisted credentials and testing switches
// ---------------------------------------------------------------------------

/// User-editable credentials and testing switches, persisted verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConfig {
    pub keys: BTreeMap<SourceId, String>,
    #[serde(rename = "testingModeEnabled")]
    pub testing_mode: bool,
    pub force_errors: bool,
}

impl ApiConfig {
    /// API key for a source, if one was entered.
    pub fn key(&self, source: SourceId) -> Option<&str> {
        self.keys
            .get(&source)
            .map(|k| k.as_str())
            .filter(|k| !k.is_empty())
    }

    pub fn with_key(mut self, source: SourceId, key: impl Into<String>) -> Self {
        self.keys.insert(source, key.into());
        self
    }

    pub fn testing(mut self, enabled: bool) -> Self {
        self.testing_mode = enabled;
        self
    }

    pub fn force_errors(mut self, enabled: bool) -> Self {
        self.force_errors = enabled;
        self
    }
}
