use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};

use crate::config::{Config, SlackConfig};
use crate::errors::{CredentialError, DeliveryError};
use crate::http_client;
use crate::message::OutboundMessage;
use crate::notify::{Channel, Notifier, Receipt};

/// Posts a single-field attachment to an incoming webhook.
#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    webhook: Option<SecretString>,
    style: SlackConfig,
}

#[derive(serde::Serialize)]
struct Payload<'a> {
    username: &'a str,
    icon_emoji: &'a str,
    channel: &'a str,
    attachments: [Attachment<'a>; 1],
}

#[derive(serde::Serialize)]
struct Attachment<'a> {
    color: &'a str,
    fields: [Field<'a>; 1],
}

#[derive(serde::Serialize)]
struct Field<'a> {
    title: &'a str,
    value: &'a str,
    short: &'static str,
}

impl SlackClient {
    pub fn new(client: Client, webhook: Option<SecretString>, style: SlackConfig) -> Self {
        Self {
            client,
            webhook,
            style,
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(
            client,
            config.credentials.slack_webhook.clone(),
            config.slack.clone(),
        )
    }

    fn payload<'a>(&'a self, text: &'a str) -> Payload<'a> {
        Payload {
            username: &self.style.username,
            icon_emoji: &self.style.icon_emoji,
            channel: &self.style.channel,
            attachments: [Attachment {
                color: &self.style.color,
                fields: [Field {
                    title: &self.style.title,
                    value: text,
                    short: "false",
                }],
            }],
        }
    }
}

#[async_trait]
impl Notifier for SlackClient {
    fn channel(&self) -> Channel {
        Channel::Slack
    }

    async fn send(&self, message: OutboundMessage) -> anyhow::Result<Receipt> {
        let webhook = self.webhook.as_ref().ok_or(CredentialError {
            channel: Some(Channel::Slack),
            missing: "SLACK_WEBHOOK",
        })?;

        let response = http_client::execute_secret_url(
            self.client
                .post(webhook.expose_secret())
                .json(&self.payload(message.plain_text())),
        )
        .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = http_client::error_body(response).await?;
            return Err(DeliveryError {
                channel: Channel::Slack,
                status,
                body,
            }
            .into());
        }
        tracing::info!("message sent to Slack");
        Ok(Receipt::Accepted)
    }
}
