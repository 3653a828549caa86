use std::path::PathBuf;

use clap::Parser;
use daily_notify::config::Config;
use daily_notify::http_client;
use daily_notify::jobs::{self, Job};
use daily_notify::logger;

/// Fetches the daily index quotes and weather forecast and pushes them to
/// the configured chat channels.
#[derive(Parser, Debug)]
struct Opt {
    /// TOML file with channels, instruments and message styling.
    #[arg(long)]
    config: Option<PathBuf>,

    /// If specified, no messages are sent; they are logged instead.
    #[arg(long)]
    dry_run: bool,

    /// Overrides the forecast location, e.g. "臺北市".
    #[arg(long)]
    location: Option<String>,

    /// Jobs to run. Runs every job when omitted.
    #[arg(value_enum)]
    jobs: Vec<Job>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logger::init();

    let opt = Opt::parse();
    let mut config = Config::load(opt.config.as_deref())?;
    if let Some(location) = opt.location {
        config.weather.location = location;
    }
    let client = http_client::build_client(config.http_timeout)?;

    let jobs = if opt.jobs.is_empty() {
        &Job::ALL[..]
    } else {
        &opt.jobs[..]
    };
    let reports = jobs::run_all(jobs, &config, &client, opt.dry_run).await;

    // A failed job has already been logged; it does not change the exit code.
    let delivered = reports.iter().filter(|r| r.outcome.is_delivered()).count();
    tracing::info!("{delivered} of {} jobs delivered", reports.len());
    Ok(())
}
