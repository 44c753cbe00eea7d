//! Per-pass options that shape how entries look on the destination.

use serde::{Deserialize, Serialize};

/// Options that affect both event synthesis and the equivalence check.
///
/// Changing any of these between passes makes previously synced events
/// non-equivalent, so the next pass recreates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    pub sync_description: bool,
    pub sync_location: bool,
    pub sync_alarms: bool,
    pub sync_attendees: bool,
    /// When set, every subject is replaced by this value.
    pub subject_override: Option<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            sync_description: true,
            sync_location: true,
            sync_alarms: true,
            sync_attendees: false,
            subject_override: None,
        }
    }
}
