//! Sync keys: the identity a synced event carries on the destination.
//!
//! A key is derived from the source record id, its last-modified time,
//! its kind and, for expanded occurrences of a repeating record, the
//! occurrence's own start. Any edit on the Notes side changes the
//! modified time and therefore the key, which turns edits into a
//! delete plus a create.
//!
//! Text form:
//!
//! ```text
//! LNSYNC~<source id>~<modified>~<kind>[~<occurrence start>]
//! ```
//!
//! On the destination the key is stored behind a random token so the
//! unique-id field stays unique even when the same key is created twice:
//!
//! ```text
//! <32 hex chars>:<key>
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::entry::{CalendarEntry, EntryKind};
use crate::error::{SyncError, SyncResult};

const MARKER: &str = "LNSYNC";
const SEPARATOR: char = '~';
const TOKEN_LEN: usize = 32;
const TOKEN_SEPARATOR: u8 = b':';
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncKey(String);

impl SyncKey {
    /// Derive the key for an entry.
    ///
    /// Fails when the source id cannot be embedded unambiguously.
    pub fn encode(entry: &CalendarEntry) -> SyncResult<Self> {
        let source_id = entry.source_id.as_str();

        if source_id.is_empty() {
            return Err(SyncError::malformed(source_id, "empty source id"));
        }
        if source_id
            .chars()
            .any(|c| c == SEPARATOR || c == ':' || c.is_whitespace() || c.is_control())
        {
            return Err(SyncError::malformed(
                source_id,
                format!("source id contains a reserved character ('{SEPARATOR}', ':' or whitespace)"),
            ));
        }

        let mut key = format!(
            "{MARKER}{SEPARATOR}{source_id}{SEPARATOR}{}{SEPARATOR}{}",
            format_timestamp(&entry.modified_at),
            entry.kind.code()
        );

        if entry.occurrence {
            key.push(SEPARATOR);
            key.push_str(&format_timestamp(&entry.start_at.with_timezone(&Utc)));
        }

        Ok(SyncKey(key))
    }

    /// Parse the text form of a key. Returns `None` for anything that was
    /// not produced by [`SyncKey::encode`].
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();

        if parts.len() != 4 && parts.len() != 5 {
            return None;
        }
        if parts[0] != MARKER || parts[1].is_empty() {
            return None;
        }
        parse_timestamp(parts[2])?;
        EntryKind::from_code(parts[3])?;
        if let Some(start) = parts.get(4) {
            parse_timestamp(start)?;
        }

        Some(SyncKey(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The source record id embedded in this key.
    pub fn source_id(&self) -> &str {
        self.0.split(SEPARATOR).nth(1).unwrap_or_default()
    }

    /// Build the destination unique-id value: a fresh random token, a
    /// colon, then the key.
    pub fn attach_to(&self) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        format!("{}:{}", &token[..TOKEN_LEN], self.0)
    }

    /// Recover the key from a destination unique-id value.
    ///
    /// `None` means the event is not owned by lnsync and must be left alone.
    pub fn extract(uid: &str) -> Option<Self> {
        let token = uid.get(..TOKEN_LEN)?;
        if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        if uid.as_bytes().get(TOKEN_LEN) != Some(&TOKEN_SEPARATOR) {
            return None;
        }

        Self::parse(uid.get(TOKEN_LEN + 1..)?)
    }
}

impl fmt::Display for SyncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}
