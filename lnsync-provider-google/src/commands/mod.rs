pub mod authenticate;
pub mod create_event;
pub mod delete_event;
pub mod ensure_calendar;
pub mod find_calendar;
pub mod list_events;

use anyhow::Result;
use google_calendar::Client;
use serde_json::{Map, Value};

use crate::remote_config::GoogleRemoteConfig;
use crate::session::Session;

/// An API client for the account named in the request params.
pub async fn client_for(params: &Map<String, Value>) -> Result<Client> {
    let config = GoogleRemoteConfig::try_from(params)?;
    Session::load_valid(&config.google_account).await?.client()
}
