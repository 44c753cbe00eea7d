use std::path::Path;

use anyhow::Result;
use lnsync_core::config::Config;
use lnsync_core::remote::{CallSettings, Provider};

use super::call_settings;

pub async fn run(config_path: Option<&Path>, provider_name: Option<&str>) -> Result<()> {
    // The config may not exist yet on first login
    let config = Config::load(config_path).ok();

    let provider = match (provider_name, &config) {
        (Some(name), _) => Provider::from_name(name),
        (None, Some(config)) => config.destination.provider.clone(),
        (None, None) => Provider::from_name("google"),
    };
    let settings = config
        .as_ref()
        .map(call_settings)
        .unwrap_or_else(CallSettings::default);

    println!("Authenticating with {}...", provider.name());

    // Provider handles the full OAuth flow and stores credentials/tokens
    let account = provider
        .authenticate(serde_json::Map::new(), &settings)
        .await?;

    println!("\nAuthenticated as: {}", account);
    println!("\nMake sure your config.toml has:");
    println!();
    println!("[destination]");
    println!("provider = \"{}\"", provider.name());
    println!("{}_account = \"{}\"", provider.name(), account);
    println!();
    println!("Then run `lnsync plan` to preview the first sync.");

    Ok(())
}
