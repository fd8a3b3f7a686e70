//! Focus Replay - Main Entry Point
//!
//! Usage: focus-replay <trace.json> [--config config.toml]

use anyhow::Context;
use clap::Parser;
use focus_replay::{init_logging, load_trace, run, Backend, Cli, ReplayConfig};
use session_api::{HttpFocusApi, InMemoryFocusApi};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ReplayConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_logging(&config.log_level, config.log_json)?;

    info!("=== Focus Replay v{} ===", env!("CARGO_PKG_VERSION"));
    let trace = load_trace(&cli.trace)
        .with_context(|| format!("reading trace {}", cli.trace.display()))?;

    let report = match config.backend {
        Backend::Memory => run(&config, InMemoryFocusApi::new(), &trace).await?,
        Backend::Http => {
            info!("Recording session at {}", config.api.base_url);
            let api = HttpFocusApi::new(config.api.clone())?;
            run(&config, api, &trace).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
