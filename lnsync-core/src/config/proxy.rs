//! HTTP proxy settings handed to provider processes.

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub enabled: bool,
    pub host: String,
    pub port: String,
    /// Only used when `authenticate` is set.
    pub authenticate: bool,
    pub username: String,
    pub password: String,
}

impl ProxySettings {
    pub fn validate(&self) -> SyncResult<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.host.trim().is_empty() {
            return Err(SyncError::Configuration(
                "proxy is enabled but no proxy host is set".into(),
            ));
        }
        if self.port.trim().is_empty() {
            return Err(SyncError::Configuration(
                "proxy is enabled but no proxy port is set".into(),
            ));
        }
        self.port.trim().parse::<u16>().map_err(|_| {
            SyncError::Configuration(format!("proxy port '{}' is not a valid port", self.port))
        })?;
        if self.authenticate && self.username.trim().is_empty() {
            return Err(SyncError::Configuration(
                "proxy authentication is enabled but no username is set".into(),
            ));
        }

        Ok(())
    }

    /// Proxy URL in the form HTTP clients read from `HTTPS_PROXY`.
    pub fn url(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let credentials = if self.authenticate {
            format!("{}:{}@", self.username.trim(), self.password)
        } else {
            String::new()
        };

        Some(format!(
            "http://{}{}:{}",
            credentials,
            self.host.trim(),
            self.port.trim()
        ))
    }
}
