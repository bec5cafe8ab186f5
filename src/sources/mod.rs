//! Source adapters: one per upstream provider, plus synthetic generators.
//!
//! An adapter yields a partial mapping of upstream item name to
//! [`PriceRecord`](crate::models::PriceRecord), or fails with a
//! [`SourceError`]. Adapters know nothing about each other; merging and
//! fallback are the orchestrator's job.
//!
//! # Example
//!
//! ```rust
//! use amoxiq::error::SourceError;
//! use amoxiq::models::SourceId;
//! use amoxiq::sources::{SourceAdapter, SourceBatch};
//! use async_trait::async_trait;
//!
//! struct Offline;
//!
//! #[async_trait(?Send)]
//! impl SourceAdapter for Offline {
//!     fn id(&self) -> SourceId {
//!         SourceId::Eia
//!     }
//!
//!     async fn fetch(&self) -> Result<SourceBatch, SourceError> {
//!         Err(SourceError::Unavailable("offline".into()))
//!     }
//! }
//! ```

pub mod placeholder;
pub mod synthetic;

pub use placeholder::PlaceholderSource;
pub use synthetic::{SyntheticGenerator, SyntheticSource};

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::models::{PriceRecord, SourceId};

/// Records produced by one adapter, keyed by upstream item name.
pub type SourceBatch = HashMap<String, PriceRecord>;

#[async_trait(?Send)]
pub trait SourceAdapter {
    /// The provider this adapter speaks for.
    fn id(&self) -> SourceId;

    /// Fetch every item this provider publishes.
    async fn fetch(&self) -> Result<SourceBatch, SourceError>;

    /// Check that the provider is reachable with the current credentials.
    ///
    /// Defaults to a full fetch whose result is discarded.
    async fn probe(&self) -> Result<(), SourceError> {
        self.fetch().await.map(|_| ())
    }
}
