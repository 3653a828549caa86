//! Process configuration.
//!
//! A `Config` is assembled once at startup from an optional TOML file (what to
//! fetch, where to send it) and the environment (credentials and endpoints),
//! then handed by reference to the jobs and delivery clients.

use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use secrecy::SecretString;

use crate::notify::{Channel, MessageStyle};
use crate::quotes::{Instrument, QuoteSelectors};

pub const DEFAULT_QUOTE_BASE_URL: &str = "https://invest.cnyes.com";
pub const DEFAULT_WEATHER_API_URL: &str =
    "https://opendata.cwa.gov.tw/api/v1/rest/datastore/F-C0032-001";
pub const DEFAULT_LINE_NOTIFY_URL: &str = "https://notify-api.line.me/api/notify";
pub const DEFAULT_LINE_API_URL: &str = "https://api.line.me";
pub const DEFAULT_LOCATION: &str = "高雄市";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Config {
    pub stock: StockConfig,
    pub weather: WeatherConfig,
    pub slack: SlackConfig,
    pub line_bot: LineBotConfig,
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    /// Applied to every outbound request.
    pub http_timeout: Duration,
}

/// The part of the configuration that may come from the TOML file.
#[derive(PartialEq, Eq, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub stock: StockConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub line_bot: LineBotConfig,
}

#[derive(PartialEq, Eq, Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StockConfig {
    #[serde(default = "default_stock_channels")]
    pub channels: Vec<Channel>,
    #[serde(default = "crate::quotes::default_instruments")]
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub selectors: QuoteSelectors,
}

impl Default for StockConfig {
    fn default() -> Self {
        StockConfig {
            channels: default_stock_channels(),
            instruments: crate::quotes::default_instruments(),
            selectors: QuoteSelectors::default(),
        }
    }
}

fn default_stock_channels() -> Vec<Channel> {
    vec![Channel::LineBot, Channel::Slack]
}

#[derive(PartialEq, Eq, Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WeatherConfig {
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_weather_channels")]
    pub channels: Vec<Channel>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            location: default_location(),
            channels: default_weather_channels(),
        }
    }
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

fn default_weather_channels() -> Vec<Channel> {
    vec![Channel::LineBot]
}

/// Fixed presentation of messages posted to the Slack webhook.
#[derive(PartialEq, Eq, Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct SlackConfig {
    pub username: String,
    pub icon_emoji: String,
    pub channel: String,
    pub color: String,
    pub title: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        SlackConfig {
            username: "美股追蹤".to_string(),
            icon_emoji: ":panda_face:".to_string(),
            channel: "#測試".to_string(),
            color: "#a633ee".to_string(),
            title: "New Incoming Message :zap:".to_string(),
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LineBotConfig {
    #[serde(default)]
    pub style: MessageStyle,
}

/// Secrets read from the environment. Any of them may be absent; the
/// channel that needs a missing one fails its send.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub line_notify_token: Option<SecretString>,
    pub line_bot_token: Option<SecretString>,
    pub line_user_id: Option<String>,
    pub slack_webhook: Option<SecretString>,
    pub cwa_api_key: Option<SecretString>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Instrument paths are resolved against this.
    pub quote_base_url: String,
    pub weather_api_url: String,
    pub line_notify_url: String,
    pub line_api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            quote_base_url: DEFAULT_QUOTE_BASE_URL.to_string(),
            weather_api_url: DEFAULT_WEATHER_API_URL.to_string(),
            line_notify_url: DEFAULT_LINE_NOTIFY_URL.to_string(),
            line_api_url: DEFAULT_LINE_API_URL.to_string(),
        }
    }
}

impl Config {
    /// Reads the TOML file at `path` (if any) and the process environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
        let file = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                toml::from_str::<ConfigFile>(&contents)
                    .with_context(|| format!("invalid configuration in {}", path.display()))?
            }
            None => ConfigFile::default(),
        };
        Config::from_lookup(file, |key| std::env::var(key).ok())
    }

    /// Builds the configuration with `lookup` standing in for the environment.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(file: ConfigFile, lookup: F) -> anyhow::Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secret = |key: &str| var(key).map(SecretString::from);

        let credentials = Credentials {
            line_notify_token: secret("LINE_NOTIFY_TOKEN"),
            line_bot_token: secret("LINE_BOT_TOKEN"),
            line_user_id: var("LINE_USER_ID"),
            slack_webhook: secret("SLACK_WEBHOOK"),
            cwa_api_key: secret("CWA_API_KEY"),
        };

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            quote_base_url: var("QUOTE_BASE_URL").unwrap_or(defaults.quote_base_url),
            weather_api_url: var("CWA_API_URL").unwrap_or(defaults.weather_api_url),
            line_notify_url: var("LINE_NOTIFY_URL").unwrap_or(defaults.line_notify_url),
            line_api_url: var("LINE_API_URL").unwrap_or(defaults.line_api_url),
        };

        let http_timeout = match var("HTTP_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.trim()
                    .parse()
                    .with_context(|| format!("HTTP_TIMEOUT_SECS must be a number, got {secs:?}"))?,
            ),
            None => DEFAULT_HTTP_TIMEOUT,
        };

        let mut weather = file.weather;
        if let Some(location) = var("WEATHER_LOCATION") {
            weather.location = location;
        }

        Ok(Config {
            stock: file.stock,
            weather,
            slack: file.slack,
            line_bot: file.line_bot,
            credentials,
            endpoints,
            http_timeout,
        })
    }
}
