//! Google-specific keys from the `[destination]` config section.

use anyhow::Result;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct GoogleRemoteConfig {
    pub google_account: String,
}

impl TryFrom<&Map<String, Value>> for GoogleRemoteConfig {
    type Error = anyhow::Error;

    fn try_from(map: &Map<String, Value>) -> Result<Self> {
        let google_account = map
            .get("google_account")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Missing required field: google_account (run `lnsync auth` and add it to [destination])"
                )
            })?
            .to_string();

        Ok(Self { google_account })
    }
}
