//! lnsync-provider-google - Google Calendar destination for lnsync
//!
//! This binary implements the lnsync provider protocol, communicating
//! with lnsync via JSON lines over stdin/stdout. Logs go to stderr.
//!
//! The provider manages its own credentials and tokens:
//!   ~/.config/lnsync/providers/google/app_config.toml
//!   ~/.config/lnsync/providers/google/session/{account}.toml

mod app_config;
mod commands;
mod convert;
mod remote_config;
mod retry;
mod session;

use anyhow::{Context, Result};
use lnsync_core::remote::protocol::{Command, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request).await,
            Err(e) => Response::error(&format!("Failed to parse request: {}", e)),
        };

        writeln!(stdout, "{}", response).context("Failed to write response")?;
        stdout.flush()?;
    }

    Ok(())
}

async fn handle_request(request: Request) -> String {
    tracing::debug!(command = ?request.command, "handling request");

    match request.command {
        Command::Authenticate => respond(commands::authenticate::handle().await),
        Command::FindCalendar => match params(request.params) {
            Ok(cmd) => respond(commands::find_calendar::handle(cmd).await),
            Err(e) => e,
        },
        Command::EnsureCalendar => match params(request.params) {
            Ok(cmd) => respond(commands::ensure_calendar::handle(cmd).await),
            Err(e) => e,
        },
        Command::ListEvents => match params(request.params) {
            Ok(cmd) => respond(commands::list_events::handle(cmd).await),
            Err(e) => e,
        },
        Command::CreateEvent => match params(request.params) {
            Ok(cmd) => respond(commands::create_event::handle(cmd).await),
            Err(e) => e,
        },
        Command::DeleteEvent => match params(request.params) {
            Ok(cmd) => respond(commands::delete_event::handle(cmd).await),
            Err(e) => e,
        },
        Command::ListEntries => {
            Response::error("google is a destination provider and cannot list source entries")
        }
    }
}

/// Decode typed command params, or the error response to send back.
fn params<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| Response::error(&format!("Invalid params: {}", e)))
}

fn respond<T: Serialize>(result: Result<T>) -> String {
    match result {
        Ok(data) => Response::success(data),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "command failed");
            Response::error(&format!("{:#}", e))
        }
    }
}
