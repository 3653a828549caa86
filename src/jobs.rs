//! NOTIFICATION JOBS
//!
//! A job takes one data source through fetch, build and deliver:
//!
//! ```text
//! Idle -> Fetching -> FetchFailed                      (terminal)
//!                  -> Fetched -> Delivering -> Done    (terminal)
//! ```
//!
//! Jobs never retry. Each job's failure is logged and reported in its
//! [`JobOutcome`]; it never stops the other jobs of the run.
//!
//! To add a source, implement [`Source`] for it and add a [`Job`] variant
//! that constructs it in `run_job` below.

use std::fmt;

use async_trait::async_trait;
use itertools::Itertools;
use reqwest::Client;

use crate::config::Config;
use crate::message::{Card, OutboundMessage};
use crate::notify::{self, Channel, MessageStyle, Notifier, Receipt};
use crate::quotes::StockQuotes;
use crate::weather::WeatherForecast;

/// Something that can be fetched and turned into messages.
#[async_trait]
pub trait Source: Send + Sync {
    type Data: Send + Sync;

    fn name(&self) -> &'static str;

    async fn fetch(&self, client: &Client) -> anyhow::Result<Self::Data>;

    fn plain_text(&self, data: &Self::Data) -> String;

    fn card(&self, data: &Self::Data) -> Card;

    fn message(&self, data: &Self::Data, style: MessageStyle) -> OutboundMessage {
        match style {
            MessageStyle::Card => OutboundMessage::RichCard(self.card(data)),
            MessageStyle::Text => OutboundMessage::text(self.plain_text(data)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Job {
    /// US index quotes.
    Stock,
    /// 36 hour weather forecast.
    Weather,
}

impl Job {
    pub const ALL: [Job; 2] = [Job::Stock, Job::Weather];

    pub fn channels(self, config: &Config) -> &[Channel] {
        match self {
            Job::Stock => &config.stock.channels,
            Job::Weather => &config.weather.channels,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Job::Stock => "stock",
            Job::Weather => "weather",
        })
    }
}

#[derive(Debug)]
pub enum JobOutcome {
    /// Every configured channel took the message.
    Delivered { receipts: Vec<(Channel, Receipt)> },
    /// Nothing was sent.
    FetchFailed(anyhow::Error),
    /// At least one channel failed; the others are in `receipts`.
    DeliveryFailed {
        receipts: Vec<(Channel, Receipt)>,
        failures: Vec<(Channel, anyhow::Error)>,
    },
}

impl JobOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, JobOutcome::Delivered { .. })
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobOutcome::Delivered { receipts } => write!(
                f,
                "delivered to [{}]",
                receipts.iter().map(|(c, _)| c).join(", ")
            ),
            JobOutcome::FetchFailed(e) => write!(f, "fetch failed: {e:#}"),
            JobOutcome::DeliveryFailed { receipts, failures } => write!(
                f,
                "delivered to [{}], failed for [{}]",
                receipts.iter().map(|(c, _)| c).join(", "),
                failures.iter().map(|(c, e)| format!("{c}: {e:#}")).join("; ")
            ),
        }
    }
}

#[derive(Debug)]
pub struct JobReport {
    pub job: Job,
    pub outcome: JobOutcome,
}

/// Runs one source against the given channels.
pub async fn run<S: Source>(
    source: &S,
    client: &Client,
    notifiers: &[Box<dyn Notifier>],
) -> JobOutcome {
    let name = source.name();
    tracing::info!(source = name, "fetching");
    let data = match source.fetch(client).await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(source = name, "fetch failed: {e:?}");
            return JobOutcome::FetchFailed(e);
        }
    };

    if notifiers.is_empty() {
        tracing::warn!(source = name, "no channels configured");
    }

    let mut receipts = Vec::new();
    let mut failures = Vec::new();
    for notifier in notifiers {
        let channel = notifier.channel();
        let message = source.message(&data, notifier.style());
        match notifier.send(message).await {
            Ok(receipt) => {
                tracing::debug!(source = name, %channel, ?receipt, "delivered");
                receipts.push((channel, receipt));
            }
            Err(e) => {
                tracing::error!(source = name, %channel, "delivery failed: {e:?}");
                failures.push((channel, e));
            }
        }
    }

    if failures.is_empty() {
        JobOutcome::Delivered { receipts }
    } else {
        JobOutcome::DeliveryFailed { receipts, failures }
    }
}

pub async fn run_job(job: Job, config: &Config, client: &Client, dry_run: bool) -> JobOutcome {
    let notifiers = notify::notifiers(job.channels(config), config, client, dry_run);
    match job {
        Job::Stock => match StockQuotes::new(config) {
            Ok(source) => run(&source, client, &notifiers).await,
            Err(e) => {
                tracing::error!(source = "stock", "{e:?}");
                JobOutcome::FetchFailed(e)
            }
        },
        Job::Weather => run(&WeatherForecast::new(config), client, &notifiers).await,
    }
}

/// Runs the jobs one after another; a failing job does not stop the rest.
pub async fn run_all(
    jobs: &[Job],
    config: &Config,
    client: &Client,
    dry_run: bool,
) -> Vec<JobReport> {
    let mut reports = Vec::with_capacity(jobs.len());
    for &job in jobs.iter().unique() {
        let outcome = run_job(job, config, client, dry_run).await;
        tracing::info!(%job, "{outcome}");
        reports.push(JobReport { job, outcome });
    }
    reports
}
