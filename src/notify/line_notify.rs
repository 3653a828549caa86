use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};

use crate::config::Config;
use crate::errors::CredentialError;
use crate::http_client;
use crate::message::OutboundMessage;
use crate::notify::{Channel, Notifier, Receipt};

/// The legacy notify endpoint: a form post authorised by a personal token.
#[derive(Clone)]
pub struct LineNotifyClient {
    client: Client,
    url: String,
    token: Option<SecretString>,
}

impl LineNotifyClient {
    pub fn new(client: Client, url: String, token: Option<SecretString>) -> Self {
        Self { client, url, token }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(
            client,
            config.endpoints.line_notify_url.clone(),
            config.credentials.line_notify_token.clone(),
        )
    }
}

#[async_trait]
impl Notifier for LineNotifyClient {
    fn channel(&self) -> Channel {
        Channel::LineNotify
    }

    /// Anything but a 200 is logged and reported as unacknowledged rather
    /// than failing the send.
    async fn send(&self, message: OutboundMessage) -> anyhow::Result<Receipt> {
        let token = self.token.as_ref().ok_or(CredentialError {
            channel: Some(Channel::LineNotify),
            missing: "LINE_NOTIFY_TOKEN",
        })?;

        // The notification is displayed after the sender name; starting on a
        // new line keeps the first line of the message aligned with the rest.
        let body = format!("\n{}", message.plain_text());
        let response = http_client::execute(
            self.client
                .post(&self.url)
                .bearer_auth(token.expose_secret())
                .form(&[("message", body.as_str())]),
        )
        .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "LINE Notify did not accept the message: {text}");
            return Ok(Receipt::Unacknowledged { status });
        }
        tracing::info!("message sent via LINE Notify");
        Ok(Receipt::Accepted)
    }
}
