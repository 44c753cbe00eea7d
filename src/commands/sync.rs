use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;

use super::{build_syncer, cancel_on_ctrl_c, load_config, log_path};
use crate::console::ConsoleStatus;

pub async fn run(config_path: Option<&Path>, diagnostic: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let options = config.sync.options();
    let window = config.sync.window(&chrono::Local::now());

    let status = Arc::new(ConsoleStatus::new(diagnostic || config.sync.diagnostic_mode));
    let syncer = build_syncer(&config, status.clone())?;

    let result = syncer
        .run_and_report(&window, &options, &cancel_on_ctrl_c())
        .await;

    let log = log_path(config_path)?;
    if let Err(e) = status.save_log(&log) {
        tracing::warn!(error = %format!("{:#}", e), "could not save run log");
    }

    if !result?.is_clean() {
        println!("{}", format!("Details in {}", log.display()).dimmed());
    }

    Ok(())
}
