use std::path::Path;

use anyhow::Result;
use lnsync_core::config::{Config, SourceKind};
use lnsync_core::remote::Provider;
use owo_colors::OwoColorize;

use super::load_config;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let shown_path = match config_path {
        Some(p) => p.to_path_buf(),
        None => Config::config_path()?,
    };
    println!("{} {}", "✓".green(), shown_path.display());

    let mut missing = 0;

    match config.source.kind()? {
        SourceKind::Provider(provider) => missing += report_provider("source", &provider),
        SourceKind::ExportFile(path) => {
            if path.exists() {
                println!("{} source: export file {}", "✓".green(), path.display());
            } else {
                println!("{} source: export file {} not found", "✗".red(), path.display());
                missing += 1;
            }
        }
    }
    missing += report_provider("destination", &config.destination.provider);

    let window = config.sync.window(&chrono::Local::now());
    println!(
        "  calendar \"{}\", {} thru {}",
        config.destination.calendar,
        window.min_start.format("%Y-%m-%d"),
        window.max_end.format("%Y-%m-%d")
    );

    let options = config.sync.options();
    println!(
        "  description: {}, location: {}, alarms: {}, attendees: {}",
        on_off(options.sync_description),
        on_off(options.sync_location),
        on_off(options.sync_alarms),
        on_off(options.sync_attendees)
    );
    if let Some(subject) = &options.subject_override {
        println!("  subjects replaced with \"{}\"", subject);
    }
    if config.proxy.enabled {
        println!("  proxy {}:{}", config.proxy.host, config.proxy.port);
    }

    if missing > 0 {
        anyhow::bail!("{} required piece(s) missing", missing);
    }
    Ok(())
}

fn report_provider(role: &str, provider: &Provider) -> usize {
    match provider.binary_path() {
        Ok(path) => {
            println!("{} {}: {} ({})", "✓".green(), role, provider.name(), path.display());
            0
        }
        Err(e) => {
            println!("{} {}: {}", "✗".red(), role, e);
            1
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
