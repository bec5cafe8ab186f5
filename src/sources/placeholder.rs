use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::config;
use crate::error::SourceError;
use crate::models::SourceId;
use crate::sources::{SourceAdapter, SourceBatch};

/// Stand-in for an upstream provider whose network client lives outside
/// this crate.
///
/// Knows the provider's endpoint and series table but publishes nothing, so
/// every item it would cover falls back to its synthetic baseline. A
/// connection probe always fails.
pub struct PlaceholderSource {
    id: SourceId,
    endpoint: &'static str,
    series: HashMap<&'static str, &'static str>,
    api_key: Option<String>,
}

impl PlaceholderSource {
    pub fn new(id: SourceId, api_key: Option<String>) -> Self {
        Self {
            id,
            endpoint: config::endpoint(id),
            series: config::series_ids(id),
            api_key,
        }
    }

    /// Placeholders for all three providers.
    pub fn all(keys: impl Fn(SourceId) -> Option<String>) -> Vec<Self> {
        SourceId::ALL
            .into_iter()
            .map(|id| Self::new(id, keys(id)))
            .collect()
    }

    pub fn series(&self) -> &HashMap<&'static str, &'static str> {
        &self.series
    }
}

#[async_trait(?Send)]
impl SourceAdapter for PlaceholderSource {
    fn id(&self) -> SourceId {
        self.id
    }

    async fn fetch(&self) -> Result<SourceBatch, SourceError> {
        debug!(
            source = %self.id,
            endpoint = self.endpoint,
            series = self.series.len(),
            keyed = self.api_key.is_some(),
            "no client wired in; publishing an empty batch"
        );
        Ok(SourceBatch::new())
    }

    async fn probe(&self) -> Result<(), SourceError> {
        if self.api_key.is_none() {
            return Err(SourceError::Auth(format!("no {} API key configured", self.id)));
        }
        Err(SourceError::Unavailable(format!(
            "no {} client configured for {}",
            self.id, self.endpoint
        )))
    }
}
