//! Creates a valid Google session (access token) for calendar API calls.
//!
//! Sessions live at ~/.config/lnsync/providers/google/session/{account}.toml

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use google_calendar::{AccessToken, Client};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::app_config::{AppConfig, base_dir};

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

pub struct Session {
    account_email: String,
    data: SessionData,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl From<&AccessToken> for SessionData {
    fn from(tokens: &AccessToken) -> Self {
        SessionData {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
        }
    }
}

impl Session {
    pub fn new(account_email: &str, data: SessionData) -> Self {
        Session {
            account_email: account_email.to_string(),
            data,
        }
    }

    fn path_for_account_email(account_email: &str) -> Result<PathBuf> {
        let email_slug = account_email.replace(['/', '\\', ':'], "_");

        Ok(base_dir()?
            .join("session")
            .join(format!("{}.toml", email_slug)))
    }

    /// Load a session and refresh it if expired.
    pub async fn load_valid(account_email: &str) -> Result<Self> {
        let mut session = Self::load(account_email)?;

        if session.is_expired(Utc::now()) {
            tracing::debug!(account = account_email, "refreshing Google access token");
            session.refresh().await?;
        }

        Ok(session)
    }

    fn load(account_email: &str) -> Result<Self> {
        let path = Self::path_for_account_email(account_email)?;

        if !path.exists() {
            anyhow::bail!(
                "Google session for {} not found. Run `lnsync auth` first.",
                account_email
            );
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read Google session from {}", path.display()))?;

        let data: SessionData = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse Google session from {}", path.display()))?;

        Ok(Session::new(account_email, data))
    }

    pub fn client(&self) -> Result<Client> {
        let app_config = AppConfig::load()?;

        Ok(Client::new(
            app_config.client_id,
            app_config.client_secret,
            String::new(),
            self.data.access_token.clone(),
            self.data.refresh_token.clone(),
        ))
    }

    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(&self.data).context("Failed to serialize session")?;

        let path = Self::path_for_account_email(&self.account_email)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write session to {}", path.display()))?;

        // Owner-only, the file holds OAuth tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        Ok(())
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.data.expires_at
    }

    async fn refresh(&mut self) -> Result<()> {
        let client = self.client()?;

        let mut tokens = client
            .refresh_access_token()
            .await
            .context("Failed to refresh Google access token")?;

        // Google usually omits the refresh token on refresh
        if tokens.refresh_token.is_empty() {
            tokens.refresh_token = self.data.refresh_token.clone();
        }

        self.data = SessionData::from(&tokens);
        self.save()
    }
}
