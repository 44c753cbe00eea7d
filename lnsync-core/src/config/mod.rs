//! lnsync configuration at ~/.config/lnsync/config.toml
//!
//! ```toml
//! [source]
//! provider = "notes"            # runs lnsync-provider-notes
//! # export_file = "~/notes.json" # or read an exported JSON dump
//!
//! [destination]
//! provider = "google"
//! calendar = "Lotus Notes"
//! google_account = "me@example.com"
//!
//! [sync]
//! days_in_past = 7
//! days_in_future = 60
//!
//! [proxy]
//! enabled = false
//! ```
//!
//! Keys in `[source]` and `[destination]` that lnsync does not know are
//! passed through to the provider untouched.

mod options;
mod proxy;

pub use options::SyncOptions;
pub use proxy::ProxySettings;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::remote::{Provider, ProviderParams};
use crate::window::SyncWindow;

const DEFAULT_CALENDAR_NAME: &str = "Lotus Notes";
const DEFAULT_ANONYMOUS_SUBJECT: &str = "Busy";

fn default_calendar_name() -> String {
    DEFAULT_CALENDAR_NAME.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub proxy: ProxySettings,
}

/// Where Notes entries come from: a provider binary or an exported file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub provider: Option<Provider>,
    pub export_file: Option<String>,
    #[serde(flatten)]
    pub params: ProviderParams,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Provider(Provider),
    ExportFile(PathBuf),
}

impl SourceConfig {
    pub fn kind(&self) -> SyncResult<SourceKind> {
        match (&self.provider, &self.export_file) {
            (Some(provider), None) => Ok(SourceKind::Provider(provider.clone())),
            (None, Some(path)) => {
                let expanded = shellexpand::tilde(path);
                Ok(SourceKind::ExportFile(PathBuf::from(expanded.as_ref())))
            }
            (Some(_), Some(_)) => Err(SyncError::Configuration(
                "[source] sets both 'provider' and 'export_file', pick one".into(),
            )),
            (None, None) => Err(SyncError::Configuration(
                "[source] needs either 'provider' or 'export_file'".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub provider: Provider,
    #[serde(default = "default_calendar_name")]
    pub calendar: String,
    #[serde(flatten)]
    pub params: ProviderParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub days_in_past: u32,
    pub days_in_future: u32,
    pub sync_description: bool,
    pub sync_location: bool,
    pub sync_alarms: bool,
    pub sync_attendees: bool,
    pub anonymize_subjects: bool,
    pub anonymous_subject: String,
    pub diagnostic_mode: bool,
    pub provider_timeout_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let options = SyncOptions::default();
        SyncSettings {
            days_in_past: 7,
            days_in_future: 60,
            sync_description: options.sync_description,
            sync_location: options.sync_location,
            sync_alarms: options.sync_alarms,
            sync_attendees: options.sync_attendees,
            anonymize_subjects: false,
            anonymous_subject: DEFAULT_ANONYMOUS_SUBJECT.to_string(),
            diagnostic_mode: false,
            provider_timeout_secs: 60,
        }
    }
}

impl SyncSettings {
    pub fn options(&self) -> SyncOptions {
        SyncOptions {
            sync_description: self.sync_description,
            sync_location: self.sync_location,
            sync_alarms: self.sync_alarms,
            sync_attendees: self.sync_attendees,
            subject_override: self
                .anonymize_subjects
                .then(|| self.anonymous_subject.clone()),
        }
    }

    pub fn window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> SyncWindow {
        SyncWindow::around(now, self.days_in_past, self.days_in_future)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

impl Config {
    pub fn config_path() -> SyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SyncError::Configuration("Could not determine config directory".into()))?
            .join("lnsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> SyncResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !path.exists() {
            return Err(SyncError::Configuration(format!(
                "No config file at {}.\n\n\
                Create it with at least:\n\n\
                [source]\n\
                provider = \"notes\"\n\n\
                [destination]\n\
                provider = \"google\"\n\
                google_account = \"you@example.com\"",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(&path)?;
        Self::parse(&contents)
            .map_err(|e| SyncError::Configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(contents: &str) -> SyncResult<Self> {
        toml::from_str(contents).map_err(|e| SyncError::Configuration(e.to_string()))
    }

    /// Check everything that would make a pass fail before it starts.
    pub fn validate(&self) -> SyncResult<()> {
        self.source.kind()?;
        self.proxy.validate()?;

        if self.destination.calendar.trim().is_empty() {
            return Err(SyncError::Configuration(
                "[destination] calendar name must not be empty".into(),
            ));
        }
        if self.sync.anonymize_subjects && self.sync.anonymous_subject.trim().is_empty() {
            return Err(SyncError::Configuration(
                "anonymize_subjects is on but anonymous_subject is empty".into(),
            ));
        }
        if self.sync.provider_timeout_secs == 0 {
            return Err(SyncError::Configuration(
                "provider_timeout_secs must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
