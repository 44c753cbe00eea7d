//! Provider subprocess calls.
//!
//! Providers are external binaries named `lnsync-provider-<name>` found
//! on PATH. Each call spawns the binary, writes one JSON request line to
//! its stdin and reads one JSON response from its stdout.
//!
//! Providers manage their own credentials and tokens. Core just passes
//! provider-specific parameters from the config file.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::error::{SyncError, SyncResult};
use crate::remote::protocol::{Authenticate, Command, ProviderCommand, Request, Response};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Upper bound for auth commands since they involve user interaction.
const AUTH_TIMEOUT: Duration = Duration::from_secs(300);

/// Provider-specific keys from a config section, passed through as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderParams(pub HashMap<String, toml::Value>);

impl From<&ProviderParams> for serde_json::Map<String, serde_json::Value> {
    fn from(params: &ProviderParams) -> Self {
        params
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// How provider processes are run.
#[derive(Debug, Clone)]
pub struct CallSettings {
    pub timeout: Duration,
    /// Extra environment for the child, e.g. proxy variables.
    pub env: Vec<(String, String)>,
}

impl Default for CallSettings {
    fn default() -> Self {
        CallSettings {
            timeout: DEFAULT_TIMEOUT,
            env: Vec::new(),
        }
    }
}

impl CallSettings {
    /// Route the provider's HTTP traffic through `proxy_url`.
    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        if let Some(url) = proxy_url {
            for var in ["HTTPS_PROXY", "HTTP_PROXY", "https_proxy", "http_proxy"] {
                self.env.push((var.to_string(), url.clone()));
            }
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn binary_name(&self) -> String {
        format!("lnsync-provider-{}", self.0)
    }

    /// Where the provider binary is installed.
    pub fn binary_path(&self) -> SyncResult<std::path::PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| {
            SyncError::ProviderNotInstalled(format!(
                "{} (install it with: cargo install {})",
                self.0, binary_name
            ))
        })
    }

    /// Run the provider's login flow and return the account identifier.
    pub async fn authenticate(
        &self,
        params: serde_json::Map<String, serde_json::Value>,
        settings: &CallSettings,
    ) -> SyncResult<String> {
        let settings = CallSettings {
            timeout: AUTH_TIMEOUT,
            env: settings.env.clone(),
        };
        self.call(Authenticate { params }, &settings).await
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type.
    pub async fn call<C: ProviderCommand>(
        &self,
        cmd: C,
        settings: &CallSettings,
    ) -> SyncResult<C::Response> {
        tracing::debug!(provider = %self.0, command = ?C::command(), "calling provider");

        timeout(settings.timeout, self.call_raw(C::command(), cmd, settings))
            .await
            .map_err(|_| SyncError::ProviderTimeout(settings.timeout.as_secs()))?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
        settings: &CallSettings,
    ) -> SyncResult<R> {
        let params =
            serde_json::to_value(params).map_err(|e| SyncError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json =
            serde_json::to_string(&request).map_err(|e| SyncError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;

        let mut child = TokioCommand::new(&binary_path)
            .envs(settings.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SyncError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SyncError::Provider("Provider stdin was not captured".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(SyncError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        parse_response(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_response<R: serde::de::DeserializeOwned>(stdout: &str) -> SyncResult<R> {
    // Only the first line carries the response
    let line = stdout.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if line.is_empty() {
        return Err(SyncError::Provider("Provider returned no response".into()));
    }

    let response: Response<R> = serde_json::from_str(line)
        .map_err(|e| SyncError::Provider(format!("Failed to parse response: {}", e)))?;

    match response {
        Response::Success { data } => Ok(data),
        Response::Error { error } => Err(SyncError::Provider(error)),
    }
}
