//! The records extracted from each source and the messages built from them.
//!
//! Entries are produced once per run, rendered, and dropped after delivery.

use std::fmt;

pub mod flex;
pub mod render;

pub use flex::Card;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// Classifies the raw net change as scraped from the quote page.
    ///
    /// Only an explicit `+` marker means up. Anything else, including an
    /// unchanged `0.00` reading or an empty string, is reported as down.
    pub fn from_change(raw: &str) -> Trend {
        if raw.contains('+') {
            Trend::Up
        } else {
            Trend::Down
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Trend::Up => '▲',
            Trend::Down => '▼',
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Trend::Up => "#00C851",
            Trend::Down => "#FF4444",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Trend::Up => "up",
            Trend::Down => "down",
        })
    }
}

/// One instrument's quote, strings kept exactly as the page shows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteEntry {
    pub label: String,
    pub as_of_date: String,
    pub price: String,
    pub change_amount: String,
    pub change_percent: String,
    pub trend: Trend,
}

impl QuoteEntry {
    pub fn new(
        label: impl Into<String>,
        as_of_date: impl Into<String>,
        price: impl Into<String>,
        change_amount: impl Into<String>,
        change_percent: impl Into<String>,
    ) -> QuoteEntry {
        let change_amount = change_amount.into();
        QuoteEntry {
            trend: Trend::from_change(&change_amount),
            label: label.into(),
            as_of_date: as_of_date.into(),
            price: price.into(),
            change_amount,
            change_percent: change_percent.into(),
        }
    }

    /// The net change with its sign removed; the trend glyph carries it instead.
    pub fn change_magnitude(&self) -> String {
        strip_sign(&self.change_amount)
    }

    pub fn percent_magnitude(&self) -> String {
        strip_sign(&self.change_percent)
    }
}

fn strip_sign(s: &str) -> String {
    s.replace(['+', '-'], "")
}

/// One forecast window of the 36 hour forecast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastEntry {
    pub period_label: String,
    pub icon: String,
    pub time_range: String,
    pub condition: String,
    pub comfort: String,
    pub min_temp: String,
    pub max_temp: String,
    /// Percent, 0 to 100.
    pub rain_probability: u8,
}

impl ForecastEntry {
    pub fn rain_tier(&self) -> RainTier {
        RainTier::from_probability(self.rain_probability)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forecast {
    pub location: String,
    pub periods: Vec<ForecastEntry>,
}

/// Colour scale for the probability of rain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RainTier {
    Nominal,
    Warning,
    Alert,
}

impl RainTier {
    pub fn from_probability(percent: u8) -> RainTier {
        match percent {
            70.. => RainTier::Alert,
            30..=69 => RainTier::Warning,
            _ => RainTier::Nominal,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RainTier::Alert => "#E53935",
            RainTier::Warning => "#FB8C00",
            RainTier::Nominal => "#43A047",
        }
    }
}

/// A message ready for one delivery channel.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    PlainText { body: String },
    RichCard(Card),
}

impl OutboundMessage {
    pub fn text(body: impl Into<String>) -> OutboundMessage {
        OutboundMessage::PlainText { body: body.into() }
    }

    /// Text for channels that cannot show cards; a card degrades to its alt text.
    pub fn plain_text(&self) -> &str {
        match self {
            OutboundMessage::PlainText { body } => body,
            OutboundMessage::RichCard(card) => &card.alt_text,
        }
    }
}
