//! Index quotes scraped from the public quote pages.
//!
//! The pages are rendered by a frontend whose class names embed build hashes,
//! so the selectors break whenever the upstream site is redeployed. They can be
//! replaced through the configuration file without a rebuild.

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::config::Config;
use crate::errors::ExtractionError;
use crate::http_client;
use crate::jobs::Source;
use crate::message::render::{quotes_card, quotes_text};
use crate::message::{Card, QuoteEntry};

/// One tracked index and the page it is scraped from.
#[derive(PartialEq, Eq, Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Instrument {
    pub label: String,
    /// Resolved against the quote base URL; an absolute URL is used as is.
    pub path: String,
}

impl Instrument {
    pub fn new(label: &str, path: &str) -> Instrument {
        Instrument {
            label: label.to_string(),
            path: path.to_string(),
        }
    }
}

pub fn default_instruments() -> Vec<Instrument> {
    vec![
        Instrument::new("道瓊指數", "index/GI/DJI"),
        Instrument::new("S&P 500", "index/GI/INX"),
        Instrument::new("費城半導體", "index/GI/SOX"),
        Instrument::new("那斯達克綜合指數", "index/GI/IXIC"),
    ]
}

#[derive(PartialEq, Eq, Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct QuoteSelectors {
    pub date: String,
    pub price: String,
    pub change: String,
    pub percent: String,
}

impl Default for QuoteSelectors {
    fn default() -> Self {
        QuoteSelectors {
            date: "._zFXfK".to_string(),
            price: ".jsx-2214436525.info-price".to_string(),
            change: ".jsx-2214436525.change-net".to_string(),
            percent: ".jsx-2214436525.change-percent".to_string(),
        }
    }
}

/// Pulls one quote out of a fetched page.
pub fn extract_quote(
    label: &str,
    html: &str,
    selectors: &QuoteSelectors,
) -> Result<QuoteEntry, ExtractionError> {
    let document = Html::parse_document(html);
    let date = select_text(&document, &selectors.date)?;
    // The date element reads like "2024/01/05 16:00 收盤"; only the date is kept.
    let date = date.split(' ').next().unwrap_or_default();
    let price = select_text(&document, &selectors.price)?;
    let change = select_text(&document, &selectors.change)?;
    let percent = select_text(&document, &selectors.percent)?;
    Ok(QuoteEntry::new(label, date, price, change, percent))
}

/// Text of the first element matching `selector`.
fn select_text(document: &Html, selector: &str) -> Result<String, ExtractionError> {
    let parsed = Selector::parse(selector).map_err(|e| ExtractionError::InvalidValue {
        path: "selector".to_string(),
        value: format!("{selector} ({e})"),
    })?;
    document
        .select(&parsed)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .ok_or_else(|| ExtractionError::MissingSelector {
            selector: selector.to_string(),
        })
}

/// The stock source: every configured instrument, one request each.
pub struct StockQuotes<'a> {
    base_url: Url,
    instruments: &'a [Instrument],
    selectors: &'a QuoteSelectors,
}

impl<'a> StockQuotes<'a> {
    pub fn new(config: &'a Config) -> anyhow::Result<StockQuotes<'a>> {
        let base = &config.endpoints.quote_base_url;
        let base_url =
            Url::parse(base).with_context(|| format!("invalid quote base URL {base}"))?;
        Ok(StockQuotes {
            base_url,
            instruments: &config.stock.instruments,
            selectors: &config.stock.selectors,
        })
    }

    pub async fn fetch_quote(
        &self,
        client: &Client,
        instrument: &Instrument,
    ) -> anyhow::Result<QuoteEntry> {
        let url = self
            .base_url
            .join(&instrument.path)
            .with_context(|| format!("invalid instrument path {}", instrument.path))?;
        let html = http_client::get_text(client, url).await?;
        Ok(extract_quote(&instrument.label, &html, self.selectors)?)
    }
}

#[async_trait]
impl Source for StockQuotes<'_> {
    type Data = Vec<QuoteEntry>;

    fn name(&self) -> &'static str {
        "stock"
    }

    /// Instruments are fetched in order. A failing instrument is logged and
    /// left out; the source only fails when none could be fetched.
    async fn fetch(&self, client: &Client) -> anyhow::Result<Vec<QuoteEntry>> {
        if self.instruments.is_empty() {
            anyhow::bail!("no instruments configured");
        }
        let mut quotes = Vec::with_capacity(self.instruments.len());
        let mut last_error = None;
        for instrument in self.instruments {
            match self.fetch_quote(client, instrument).await {
                Ok(quote) => {
                    tracing::debug!(instrument = %instrument.label, ?quote, "fetched quote");
                    quotes.push(quote);
                }
                Err(e) => {
                    tracing::warn!(instrument = %instrument.label, "skipping instrument: {e:?}");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) if quotes.is_empty() => {
                Err(e.context(format!("all {} instruments failed", self.instruments.len())))
            }
            _ => Ok(quotes),
        }
    }

    fn plain_text(&self, quotes: &Vec<QuoteEntry>) -> String {
        quotes_text(quotes)
    }

    fn card(&self, quotes: &Vec<QuoteEntry>) -> Card {
        quotes_card(quotes)
    }
}
