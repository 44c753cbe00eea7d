mod commands;
mod console;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lnsync")]
#[command(about = "Copy your Lotus Notes calendar into Google Calendar")]
struct Cli {
    /// Config file to use instead of ~/.config/lnsync/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the destination provider
    Auth {
        /// Provider to authenticate with (defaults to the configured destination)
        provider: Option<String>,
    },
    /// Validate the config and look for the provider binaries
    Check,
    /// Show what the next sync would change, without changing anything
    Plan,
    /// Run one sync pass
    Sync {
        /// Show per-entry detail in the transcript
        #[arg(short, long)]
        diagnostic: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Auth { provider } => commands::auth::run(config_path, provider.as_deref()).await,
        Commands::Check => commands::check::run(config_path),
        Commands::Plan => commands::plan::run(config_path).await,
        Commands::Sync { diagnostic } => commands::sync::run(config_path, diagnostic).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "lnsync=debug,lnsync_core=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}
