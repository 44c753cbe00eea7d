//! Error types for lnsync.

use thiserror::Error;

/// Errors that can occur while preparing or running a sync pass.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single source record could not be turned into calendar entries.
    /// The record is skipped, the pass continues.
    #[error("Malformed source entry {source_id}: {reason}")]
    MalformedSourceEntry { source_id: String, reason: String },

    #[error("Failed to fetch source entries: {0}")]
    SourceFetch(String),

    #[error("Failed to fetch destination events: {0}")]
    DestFetch(String),

    #[error("Failed to write destination event: {0}")]
    DestWrite(String),

    #[error("Sync was cancelled before any changes were made")]
    Cancelled,

    #[error("A sync pass is already running")]
    AlreadyRunning,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SyncError {
    pub fn malformed(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        SyncError::MalformedSourceEntry {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error ends the whole pass, as opposed to a single item.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SyncError::MalformedSourceEntry { .. } | SyncError::DestWrite(_)
        )
    }
}

/// Result type alias for lnsync operations.
pub type SyncResult<T> = Result<T, SyncError>;
