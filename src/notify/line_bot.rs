use std::borrow::Cow;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::config::Config;
use crate::errors::{CredentialError, DeliveryError};
use crate::http_client;
use crate::message::OutboundMessage;
use crate::message::flex::Bubble;
use crate::notify::{Channel, MessageStyle, Notifier, Receipt};

/// Upper bound on a text message, in characters.
pub const MAX_TEXT_LEN: usize = 5000;

/// Pushes messages to one user through the Messaging API.
#[derive(Clone)]
pub struct LineBotClient {
    client: Client,
    api_url: String,
    token: Option<SecretString>,
    user_id: Option<String>,
    style: MessageStyle,
}

#[derive(serde::Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [PushMessage<'a>; 1],
}

#[derive(serde::Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum PushMessage<'a> {
    Text {
        text: Cow<'a, str>,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: &'a str,
        contents: Bubble<'a>,
    },
}

impl LineBotClient {
    pub fn new(
        client: Client,
        api_url: String,
        token: Option<SecretString>,
        user_id: Option<String>,
        style: MessageStyle,
    ) -> Self {
        Self {
            client,
            api_url,
            token,
            user_id,
            style,
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(
            client,
            config.endpoints.line_api_url.clone(),
            config.credentials.line_bot_token.clone(),
            config.credentials.line_user_id.clone(),
            config.line_bot.style,
        )
    }

    fn credentials(&self) -> Result<(&SecretString, &str), CredentialError> {
        let token = self.token.as_ref().ok_or(CredentialError {
            channel: Some(Channel::LineBot),
            missing: "LINE_BOT_TOKEN",
        })?;
        let user_id = self.user_id.as_deref().ok_or(CredentialError {
            channel: Some(Channel::LineBot),
            missing: "LINE_USER_ID",
        })?;
        Ok((token, user_id))
    }
}

#[async_trait]
impl Notifier for LineBotClient {
    fn channel(&self) -> Channel {
        Channel::LineBot
    }

    fn style(&self) -> MessageStyle {
        self.style
    }

    async fn send(&self, message: OutboundMessage) -> anyhow::Result<Receipt> {
        let (token, user_id) = self.credentials()?;

        let push = PushRequest {
            to: user_id,
            messages: [match &message {
                OutboundMessage::PlainText { body } => PushMessage::Text {
                    text: truncate_chars(body, MAX_TEXT_LEN),
                },
                OutboundMessage::RichCard(card) => PushMessage::Flex {
                    alt_text: &card.alt_text,
                    contents: card.bubble(),
                },
            }],
        };

        let response = http_client::execute(
            self.client
                .post(format!("{}/v2/bot/message/push", self.api_url))
                .bearer_auth(token.expose_secret())
                .json(&push),
        )
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = http_client::error_body(response).await?;
            return Err(DeliveryError {
                channel: Channel::LineBot,
                status,
                body,
            }
            .into());
        }
        tracing::info!("message sent via LINE bot");
        Ok(Receipt::Accepted)
    }
}

fn truncate_chars(s: &str, max: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max) {
        Some((idx, _)) => Cow::Owned(s[..idx].to_string()),
        None => Cow::Borrowed(s),
    }
}
