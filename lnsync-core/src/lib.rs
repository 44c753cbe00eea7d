//! Core of lnsync, a one-way Lotus Notes to Google Calendar sync.
//!
//! This crate holds everything shared by the CLI and the providers:
//! - `entry` and `normalize` turn raw Notes documents into calendar entries
//! - `event`, `sync_key` and `render` describe what lives on the destination
//! - `reconcile` and `sync` compute and apply the changes of one pass
//! - `remote` is the JSON protocol spoken with provider binaries

pub mod adapter;
pub mod config;
pub mod entry;
pub mod error;
pub mod event;
pub mod normalize;
pub mod reconcile;
pub mod remote;
pub mod render;
pub mod status;
pub mod sync;
pub mod sync_key;
pub mod text;
pub mod window;

pub use entry::{CalendarEntry, EntryKind, NativeRecord};
pub use error::{SyncError, SyncResult};
pub use event::*;
pub use sync_key::SyncKey;
pub use window::SyncWindow;
