//! Delivery channels.
//!
//! Every channel implements [`Notifier`]: it takes one [`OutboundMessage`] and
//! makes a single request for it. Nothing is retried; a failed send is
//! reported to the caller and dropped.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::config::Config;
use crate::message::OutboundMessage;

pub mod line_bot;
pub mod line_notify;
pub mod slack;

pub use line_bot::LineBotClient;
pub use line_notify::LineNotifyClient;
pub use slack::SlackClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// The legacy token-bearer notify webhook.
    LineNotify,
    /// Messaging API push to a single user.
    LineBot,
    /// Slack incoming webhook.
    Slack,
}

impl std::str::FromStr for Channel {
    type Err = String;
    fn from_str(s: &str) -> Result<Channel, Self::Err> {
        Ok(match s {
            "line-notify" => Channel::LineNotify,
            "line-bot" => Channel::LineBot,
            "slack" => Channel::Slack,
            _ => return Err(format!("unknown channel `{s}`")),
        })
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Channel::LineNotify => "line-notify",
                Channel::LineBot => "line-bot",
                Channel::Slack => "slack",
            }
        )
    }
}

/// How a channel wants its message shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageStyle {
    #[default]
    Card,
    Text,
}

/// What a channel reported back for a send that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receipt {
    Accepted,
    /// The endpoint answered, but not with 200. Only channels that do not
    /// treat this as an error produce it.
    Unacknowledged { status: StatusCode },
    /// Nothing was sent.
    DryRun,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> Channel;

    fn style(&self) -> MessageStyle {
        MessageStyle::Text
    }

    async fn send(&self, message: OutboundMessage) -> anyhow::Result<Receipt>;
}

/// Builds the client for `channel` from the process configuration.
pub fn notifier(channel: Channel, config: &Config, client: &Client) -> Box<dyn Notifier> {
    match channel {
        Channel::LineNotify => Box::new(LineNotifyClient::from_config(client.clone(), config)),
        Channel::LineBot => Box::new(LineBotClient::from_config(client.clone(), config)),
        Channel::Slack => Box::new(SlackClient::from_config(client.clone(), config)),
    }
}

pub fn notifiers(
    channels: &[Channel],
    config: &Config,
    client: &Client,
    dry_run: bool,
) -> Vec<Box<dyn Notifier>> {
    channels
        .iter()
        .map(|&channel| {
            let notifier = notifier(channel, config, client);
            if dry_run {
                Box::new(DryRun {
                    channel,
                    style: notifier.style(),
                }) as Box<dyn Notifier>
            } else {
                notifier
            }
        })
        .collect()
}

/// Logs the message in place of sending it.
pub struct DryRun {
    pub channel: Channel,
    pub style: MessageStyle,
}

#[async_trait]
impl Notifier for DryRun {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn style(&self) -> MessageStyle {
        self.style
    }

    async fn send(&self, message: OutboundMessage) -> anyhow::Result<Receipt> {
        match &message {
            OutboundMessage::PlainText { body } => {
                tracing::info!(channel = %self.channel, "dry run, would send:\n{body}");
            }
            OutboundMessage::RichCard(card) => {
                let contents = serde_json::to_string_pretty(&card.bubble())?;
                tracing::info!(channel = %self.channel, "dry run, would send card:\n{contents}");
            }
        }
        Ok(Receipt::DryRun)
    }
}
