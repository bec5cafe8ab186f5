use std::time::Duration;

use crate::models::SourceId;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage read error for '{key}': {reason}")]
    StorageRead { key: String, reason: String },

    #[error("{source_id} unavailable: {reason}")]
    SourceUnavailable { source_id: SourceId, reason: String },

    #[error("{source_id} timed out after {after:?}")]
    Timeout { source_id: SourceId, after: Duration },

    #[error("Refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

/// Failure raised by a single source adapter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl SourceError {
    /// Attach the failing source and lift into the crate error type.
    pub fn into_dashboard(self, source_id: SourceId) -> DashboardError {
        match self {
            SourceError::Timeout(after) => DashboardError::Timeout { source_id, after },
            other => DashboardError::SourceUnavailable {
                source_id,
                reason: other.to_string(),
            },
        }
    }
}
