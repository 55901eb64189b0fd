mod aggregate;
mod client;
mod config;
mod deployments;
mod error;
mod models;
mod report;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use crate::client::{DeployApi, OctopusClient};
use crate::config::{Cli, Config};

// The diagnostic log carries every request attempt and processing milestone;
// the console only gets coarse progress lines. An unopenable log file is
// fatal up front rather than a run's worth of silently dropped diagnostics.
fn setup_logging(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open debug log {}", path.display()))?;

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "octoreport=debug");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_cli(Cli::parse())?;
    setup_logging(&config.debug_log)?;

    tracing::debug!("Script started");
    println!("Script started");

    let api: Arc<dyn DeployApi> = Arc::new(OctopusClient::new(&config)?);
    let report = aggregate::build_report(api, &config).await;

    tracing::debug!("Writing data to file");
    println!("Writing data to file");
    report::write_report(&report, &config.output)?;

    tracing::debug!(
        "All projects deployment data has been written to {}",
        config.output.display()
    );
    println!(
        "All projects deployment data has been written to {}",
        config.output.display()
    );
    tracing::debug!("Script completed");
    println!("Script completed");

    Ok(())
}
