use std::path::PathBuf;

use async_trait::async_trait;

use crate::adapter::SourceAdapter;
use crate::entry::{CalendarEntry, NativeRecord};
use crate::error::{SyncError, SyncResult};
use crate::normalize;
use crate::window::SyncWindow;

/// Reads a JSON array of Notes calendar documents exported to disk.
pub struct ExportFileSource {
    path: PathBuf,
}

impl ExportFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ExportFileSource { path: path.into() }
    }
}

#[async_trait]
impl SourceAdapter for ExportFileSource {
    async fn fetch_entries(&self, window: &SyncWindow) -> SyncResult<Vec<CalendarEntry>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SyncError::SourceFetch(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        let records: Vec<NativeRecord> = serde_json::from_str(&contents).map_err(|e| {
            SyncError::SourceFetch(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;

        Ok(normalize::normalize_all(records, window).entries)
    }
}
