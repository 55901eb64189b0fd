use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use clap::Parser;

use crate::error::OctoError;

/// Build a consolidated deployment report for every project group in an
/// Octopus Deploy space.
#[derive(Parser, Debug)]
#[command(name = "octoreport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Octopus server base URL
    #[arg(long, env = "OCTOPUS_SERVER_URL")]
    pub server: String,

    /// Space to report on
    #[arg(long, env = "OCTOPUS_SPACE_ID", default_value = "Spaces-1")]
    pub space: String,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Deployment page size
    #[arg(long, default_value_t = 30)]
    pub page_size: usize,

    /// Maximum concurrent project/environment resolutions
    #[arg(short, long, default_value_t = 10)]
    pub jobs: usize,

    /// IANA timezone for displayed deployment dates
    #[arg(long, default_value = "America/Los_Angeles")]
    pub timezone: String,

    /// Report output path
    #[arg(short, long, default_value = "all_projects_deployment_data.json")]
    pub output: PathBuf,

    /// Diagnostic log path
    #[arg(long, default_value = "debug_log.txt")]
    pub debug_log: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub space_id: String,
    pub api_key: String,
    pub insecure: bool,
    pub timeout: Duration,
    pub page_size: usize,
    pub max_in_flight: usize,
    pub display_zone: Tz,
    pub output: PathBuf,
    pub debug_log: PathBuf,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, OctoError> {
        let api_key = std::env::var("OCTOPUS_API_KEY").map_err(|_| OctoError::MissingApiKey)?;
        let display_zone = cli
            .timezone
            .parse::<Tz>()
            .map_err(|_| OctoError::UnknownTimezone(cli.timezone.clone()))?;
        if cli.page_size == 0 {
            return Err(OctoError::ZeroPageSize);
        }
        if cli.jobs == 0 {
            return Err(OctoError::ZeroJobs);
        }

        Ok(Self {
            server_url: cli.server.trim_end_matches('/').to_owned(),
            space_id: cli.space,
            api_key,
            insecure: cli.insecure,
            timeout: Duration::from_secs(cli.timeout),
            page_size: cli.page_size,
            max_in_flight: cli.jobs,
            display_zone,
            output: cli.output,
            debug_log: cli.debug_log,
        })
    }
}
