pub mod auth;
pub mod check;
pub mod plan;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use lnsync_core::adapter::{
    DestinationAdapter, ExportFileSource, ProviderDestination, ProviderSource, SourceAdapter,
};
use lnsync_core::config::{Config, SourceKind};
use lnsync_core::remote::CallSettings;
use lnsync_core::status::StatusSink;
use lnsync_core::sync::Syncer;
use tokio_util::sync::CancellationToken;

/// Load and validate the config, from `path` or the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Where the transcript of the last sync is written: next to the config.
pub fn log_path(config_path: Option<&Path>) -> Result<PathBuf> {
    let config_path = match config_path {
        Some(p) => p.to_path_buf(),
        None => Config::config_path()?,
    };
    let dir = config_path
        .parent()
        .context("Config path has no parent directory")?;
    Ok(dir.join("lnsync.log"))
}

pub fn call_settings(config: &Config) -> CallSettings {
    CallSettings {
        timeout: config.sync.provider_timeout(),
        ..CallSettings::default()
    }
    .with_proxy(config.proxy.url())
}

pub fn build_syncer(config: &Config, status: Arc<dyn StatusSink>) -> Result<Syncer> {
    let settings = call_settings(config);

    let source: Box<dyn SourceAdapter> = match config.source.kind()? {
        SourceKind::Provider(provider) => Box::new(ProviderSource::new(
            provider,
            config.source.params.clone(),
            settings.clone(),
        )),
        SourceKind::ExportFile(path) => Box::new(ExportFileSource::new(path)),
    };

    // New calendars get the local zone so all-day entries land on the right day
    let time_zone = iana_time_zone::get_timezone().ok();
    tracing::debug!(?time_zone, "local time zone");

    let destination: Box<dyn DestinationAdapter> = Box::new(
        ProviderDestination::new(
            config.destination.provider.clone(),
            config.destination.params.clone(),
            settings,
        )
        .with_time_zone(time_zone),
    );

    Ok(Syncer::new(
        source,
        destination,
        status,
        config.destination.calendar.clone(),
    ))
}

/// A token that is cancelled on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, stopping before the next change...");
            child.cancel();
        }
    });

    token
}
