//! eventcache - browse and edit events from the command line.
//!
//! Commands:
//! - `eventcache recent`: recently added events
//! - `eventcache search <term>`: events matching a search term
//! - `eventcache show <id>`: details of one event
//! - `eventcache create --title .. --date ..`: add an event
//! - `eventcache edit <id> [--title ..]`: change an event
//! - `eventcache delete <id>`: remove an event
//! - `eventcache images`: images selectable for events
//! - `eventcache shell`: interactive session sharing one cache

mod app;
mod commands;
mod output;
mod shell;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eventcache_core::Config;

use app::App;
use commands::Command;
use output::Output;

#[derive(Parser)]
#[command(name = "eventcache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides config and EVENTCACHE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Do not read or write the on-disk cache snapshot
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=eventcache_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Config {
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    config.apply_env();
    if let Some(url) = &cli.api_url {
        config.api_base_url = Some(url.clone());
    }
    if cli.no_cache {
        config.persist_cache = Some(false);
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli);
    info!(base_url = config.base_url(), "eventcache starting");

    let output = Output::new(cli.json);
    let app = App::new(config, output.clone())?;
    app.restore_cache();

    let result = app.run(cli.command).await;

    app.persist_cache();

    if let Err(e) = result {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
