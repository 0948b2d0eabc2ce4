//! voxbot - resource and route planning agent for voxel worlds
//!
//! Headless runner: reads console commands from a script and the command
//! line, then drives the task scheduler against a simulated world.

mod command_script;
mod commands;
mod config;
mod headless;

use anyhow::{Context, Result};
use clap::Parser;
use headless::HeadlessConfig;
use std::path::PathBuf;
use tracing::info;
use voxbot_core::ItemCatalog;

#[derive(Parser, Debug)]
#[command(author, version, about = "Resource and route planning agent for voxel worlds", long_about = None)]
struct Cli {
    /// Agent settings (TOML)
    #[arg(long, default_value = config::DEFAULT_SETTINGS_PATH)]
    config: PathBuf,

    /// Write the effective settings back to the --config path before running
    #[arg(long)]
    save_config: bool,

    /// Item catalog (JSON); the built-in catalog is used when missing
    #[arg(long, default_value = config::DEFAULT_ITEMS_PATH)]
    items: PathBuf,

    /// World layout (JSON); a small demo world is used when omitted
    #[arg(long)]
    world: Option<PathBuf>,

    /// Command script (JSON `{"steps": [{"command": ...}]}`)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Write one JSON line per finished task here
    #[arg(long)]
    report: Option<PathBuf>,

    /// Console commands run after the script, e.g. "get planks 4" run
    #[arg(trailing_var_arg = true)]
    commands: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting voxbot v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let settings = config::load_settings(&cli.config);
    if cli.save_config {
        config::save_settings_to_path(&settings, &cli.config)
            .with_context(|| format!("saving settings to {}", cli.config.display()))?;
        info!(path = %cli.config.display(), "Saved agent settings");
    }
    let catalog = ItemCatalog::load_or_default(&cli.items);

    let reports = headless::run(HeadlessConfig {
        settings,
        catalog,
        world_layout: cli.world,
        command_script: cli.script,
        report: cli.report,
        commands: cli.commands,
    })
    .await?;

    let failed = reports.iter().filter(|r| !r.succeeded()).count();
    if failed > 0 {
        tracing::warn!(failed, "Some tasks failed");
    }
    Ok(())
}
