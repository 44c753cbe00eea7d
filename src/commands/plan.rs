use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use lnsync_core::status::Transcript;

use super::{build_syncer, cancel_on_ctrl_c, load_config};
use crate::render::render_plan;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let options = config.sync.options();
    let window = config.sync.window(&chrono::Local::now());

    // The dry run stays quiet; only the plan itself is printed
    let status = Arc::new(Transcript::new(false));
    let syncer = build_syncer(&config, status)?;

    let plan = syncer.plan(&window, &options, &cancel_on_ctrl_c()).await?;

    println!("📅 {}", config.destination.calendar);
    println!("{}", render_plan(&plan, &options, config.sync.diagnostic_mode));

    Ok(())
}
