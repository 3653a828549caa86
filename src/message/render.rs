//! Plain-text and rich-card forms of the quote and forecast messages.
//!
//! Values are formatted as given; nothing here rounds or validates numbers.

use itertools::Itertools;

use super::flex::{Card, Component, FlexBox, Separator, Text};
use super::{ForecastEntry, QuoteEntry};

pub const STOCK_TITLE: &str = "📊 美股日報";
const STOCK_SUBTITLE: &str = "US Stock Market";
const STOCK_HEADER_COLOR: &str = "#1E90FF";
const LABEL_COLOR: &str = "#1DB446";
const MUTED_COLOR: &str = "#999999";
const PRICE_COLOR: &str = "#333333";

const WEATHER_TITLE_COLOR: &str = "#2C3E50";
const WEATHER_MUTED_COLOR: &str = "#95A5A6";
const WEATHER_CONDITION_COLOR: &str = "#34495E";
const WEATHER_COMFORT_COLOR: &str = "#7F8C8D";
const TEMPERATURE_COLOR: &str = "#FF6B35";

/// One block per quote, separated by a blank line:
///
/// ```text
/// 2024-01-05
/// 道瓊指數
/// 37,000
/// 100▲  0.3%▲
/// ```
pub fn quotes_text(quotes: &[QuoteEntry]) -> String {
    quotes.iter().map(quote_text).join("\n\n")
}

fn quote_text(quote: &QuoteEntry) -> String {
    let glyph = quote.trend.glyph();
    format!(
        "{}\n{}\n{}\n{}{glyph}  {}{glyph}",
        quote.as_of_date,
        quote.label,
        quote.price,
        quote.change_magnitude(),
        quote.percent_magnitude(),
    )
}

pub fn quotes_card(quotes: &[QuoteEntry]) -> Card {
    let mut card = Card::new(STOCK_TITLE);
    card.header = Some(
        FlexBox::vertical(vec![
            Text::new(STOCK_TITLE)
                .color("#ffffff")
                .size("xl")
                .bold()
                .into(),
            Text::new(STOCK_SUBTITLE)
                .color("#ffffff")
                .size("xs")
                .margin("xs")
                .into(),
        ])
        .background(STOCK_HEADER_COLOR)
        .padding_all("20px"),
    );
    card.header_background = Some(STOCK_HEADER_COLOR.to_string());
    card.body = FlexBox::vertical(
        quotes
            .iter()
            .enumerate()
            .map(|(i, quote)| quote_section(i, quote))
            .collect(),
    )
    .padding_all("15px");
    card
}

fn quote_section(index: usize, quote: &QuoteEntry) -> Component {
    let glyph = quote.trend.glyph();
    let color = quote.trend.color();

    let title = FlexBox::horizontal(vec![
        Text::new(&quote.label)
            .bold()
            .size("md")
            .color(LABEL_COLOR)
            .flex(0)
            .into(),
        Text::new(&quote.as_of_date)
            .size("xs")
            .color(MUTED_COLOR)
            .align("end")
            .into(),
    ]);
    let price = FlexBox::horizontal(vec![
        Text::new(&quote.price)
            .size("xl")
            .bold()
            .color(PRICE_COLOR)
            .into(),
    ])
    .margin("sm");
    let change = FlexBox::horizontal(vec![
        Text::new(format!("{glyph} {}", quote.change_magnitude()))
            .size("sm")
            .color(color)
            .flex(0)
            .into(),
        Text::new(format!("{glyph} {}", quote.percent_magnitude()))
            .size("sm")
            .color(color)
            .margin("md")
            .into(),
    ])
    .margin("sm");

    FlexBox::vertical(vec![title.into(), price.into(), change.into()])
        .padding_all("15px")
        .background(if index % 2 == 0 { "#F8F8F8" } else { "#FFFFFF" })
        .corner_radius("10px")
        .margin(if index > 0 { "sm" } else { "none" })
        .into()
}

pub fn forecast_alt_text(location: &str) -> String {
    format!("🌤️ {location} 36 小時天氣預報")
}

pub fn forecast_text(location: &str, periods: &[ForecastEntry]) -> String {
    let mut lines = vec![format!("*{location} 36 小時天氣預報*")];
    for period in periods {
        lines.push(String::new());
        lines.push(format!(
            "{} {}({})",
            period.icon, period.period_label, period.time_range
        ));
        lines.push(format!("{},{}", period.condition, period.comfort));
        lines.push(format!("溫度:{}°C ~ {}°C", period.min_temp, period.max_temp));
        lines.push(format!("降雨:{}%", period.rain_probability));
    }
    lines.join("\n")
}

pub fn forecast_card(location: &str, periods: &[ForecastEntry]) -> Card {
    let mut card = Card::new(forecast_alt_text(location));
    card.header = Some(
        FlexBox::vertical(vec![
            Text::new(format!("🌤️ {location}天氣"))
                .bold()
                .size("xl")
                .color(WEATHER_TITLE_COLOR)
                .into(),
            Text::new("36 小時預報")
                .size("xs")
                .color(WEATHER_MUTED_COLOR)
                .margin("xs")
                .into(),
        ])
        .padding_all("20px")
        .padding_bottom("15px"),
    );
    card.body = FlexBox::vertical(periods.iter().map(forecast_section).collect())
        .padding_all("20px");
    card.body_background = Some("#FFFFFF".to_string());
    card
}

fn forecast_section(period: &ForecastEntry) -> Component {
    let title = FlexBox::horizontal(vec![
        Text::new(&period.icon)
            .size("lg")
            .flex(0)
            .margin("none")
            .into(),
        FlexBox::vertical(vec![
            Text::new(&period.period_label)
                .bold()
                .size("md")
                .color(WEATHER_TITLE_COLOR)
                .into(),
            Text::new(&period.time_range)
                .size("xxs")
                .color(WEATHER_MUTED_COLOR)
                .into(),
        ])
        .margin("md")
        .into(),
    ]);
    let conditions = FlexBox::vertical(vec![
        Text::new(&period.condition)
            .size("sm")
            .color(WEATHER_CONDITION_COLOR)
            .bold()
            .wrap()
            .into(),
        Text::new(&period.comfort)
            .size("xs")
            .color(WEATHER_COMFORT_COLOR)
            .margin("xs")
            .wrap()
            .into(),
    ])
    .margin("md");
    let readings = FlexBox::horizontal(vec![
        reading(
            "🌡️",
            format!("{}° - {}°", period.min_temp, period.max_temp),
            TEMPERATURE_COLOR,
        ),
        reading(
            "💧",
            format!("{}%", period.rain_probability),
            period.rain_tier().color(),
        ),
    ])
    .margin("md")
    .spacing("md");

    FlexBox::vertical(vec![
        title.into(),
        Separator::new().margin("md").into(),
        conditions.into(),
        readings.into(),
    ])
    .background("#FAFAFA")
    .corner_radius("10px")
    .padding_all("15px")
    .margin("md")
    .into()
}

fn reading(icon: &str, value: String, color: &str) -> Component {
    FlexBox::baseline(vec![
        Text::new(icon).size("sm").flex(0).into(),
        Text::new(value)
            .size("sm")
            .bold()
            .color(color)
            .margin("sm")
            .flex(0)
            .into(),
    ])
    .flex(1)
    .into()
}
