//! Main application entry point for NearManager.
//!
//! Loads the configuration, sets up logging and runs the plugin against an
//! in-memory world driven from stdin until `exit`, end of input or a
//! shutdown signal.

mod cli;
mod config;
mod console;
mod logging;
mod signals;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use near_core::host::memory::InMemoryWorld;
use near_core::scheduler::TokioScheduler;
use near_plugin::{NearPlugin, PluginHost, PLUGIN_NAME, PLUGIN_VERSION};
use tokio::io::BufReader;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{error, info, warn};

use crate::cli::CliArgs;
use crate::config::{AppConfig, FileConfigSource};
use crate::console::{Console, ConsoleDisplay};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args = CliArgs::parse();

    if let Err(e) = run(args).await {
        error!("❌ Application error: {:?}", e);
        eprintln!("❌ Failed to run {PLUGIN_NAME}: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let mut config = AppConfig::load_from_file(&args.config_path).await?;

    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.json_format = true;
    }

    config
        .validate()
        .map_err(|e| anyhow!("Configuration validation failed: {e}"))?;

    logging::setup_logging(&config.logging)?;
    display_banner();
    info!("📂 Config: {}", args.config_path.display());

    let world = Arc::new(InMemoryWorld::new());
    let (out, lines) = unbounded_channel();
    let printer = tokio::spawn(print_lines(lines));

    let plugin = Arc::new(NearPlugin::new(
        config.plugin_config(),
        PluginHost {
            presence: world.clone(),
            permissions: world.clone(),
            display: Arc::new(ConsoleDisplay::new(world.clone(), out.clone())),
            scheduler: Arc::new(TokioScheduler::current()),
        },
        Arc::new(FileConfigSource::new(&args.config_path)),
    ));

    let console = Console::new(world, plugin.clone(), out);
    let stdin = BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = console.run(stdin) => result?,
        result = signals::shutdown_signal() => result?,
    }

    info!("🛑 Shutdown requested, stopping trackers...");
    plugin.shutdown();

    // The channel closes once the console and the plugin's display are gone.
    drop(console);
    drop(plugin);
    if tokio::time::timeout(Duration::from_secs(1), printer).await.is_err() {
        warn!("⚠️ Console output did not drain before shutdown");
    }

    info!("👋 {} stopped", PLUGIN_NAME);
    Ok(())
}

async fn print_lines(mut lines: UnboundedReceiver<String>) {
    while let Some(line) = lines.recv().await {
        println!("{line}");
    }
}

fn display_banner() {
    info!("╔══════════════════════════════════════════╗");
    info!("║            🧭 {} v{}", PLUGIN_NAME, PLUGIN_VERSION);
    info!("║  Nearby player listing + live trackers   ║");
    info!("╚══════════════════════════════════════════╝");
}
