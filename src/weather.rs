//! 36 hour forecast from the Central Weather Administration open data API.
//!
//! The `F-C0032-001` dataset returns, per location, one series per weather
//! element (`Wx`, `PoP`, `MinT`, `CI`, `MaxT`), each holding three consecutive
//! forecast windows.

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::{FixedOffset, Local, NaiveDate, NaiveDateTime, Timelike, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::config::Config;
use crate::errors::{CredentialError, ExtractionError};
use crate::http_client;
use crate::jobs::Source;
use crate::message::render::{forecast_card, forecast_text};
use crate::message::{Card, Forecast, ForecastEntry};

/// Number of forecast windows reported per run.
pub const PERIODS: usize = 3;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Forecast times are local to Taiwan.
const FORECAST_UTC_OFFSET_SECS: i32 = 8 * 3600;

#[derive(Debug, serde::Deserialize)]
pub struct ForecastResponse {
    records: Records,
}

#[derive(Debug, serde::Deserialize)]
struct Records {
    location: Vec<Location>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    location_name: String,
    weather_element: Vec<WeatherElement>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeatherElement {
    element_name: String,
    time: Vec<TimeSlot>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeSlot {
    start_time: String,
    end_time: String,
    parameter: Parameter,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Parameter {
    parameter_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Morning,
    Daytime,
    Evening,
    LateNight,
}

impl Period {
    pub fn from_hour(hour: u32) -> Period {
        match hour {
            5..=11 => Period::Morning,
            12..=17 => Period::Daytime,
            18..=23 => Period::Evening,
            _ => Period::LateNight,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Morning => "早上",
            Period::Daytime => "白天",
            Period::Evening => "晚上",
            Period::LateNight => "凌晨",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Period::Morning => "🌅",
            Period::Daytime => "☀️",
            Period::Evening => "🌃",
            Period::LateNight => "🌙",
        }
    }
}

/// Display label of the window starting at `start`, prefixed with 明天 when it
/// starts after `today`.
pub fn period_label(start: NaiveDateTime, today: NaiveDate) -> String {
    let period = Period::from_hour(start.hour());
    if start.date() > today {
        format!("明天{}", period.label())
    } else {
        period.label().to_string()
    }
}

/// Today's date where the forecast is issued.
pub fn forecast_today() -> NaiveDate {
    match FixedOffset::east_opt(FORECAST_UTC_OFFSET_SECS) {
        Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
        None => Local::now().date_naive(),
    }
}

pub fn parse_response(body: &str) -> Result<ForecastResponse, ExtractionError> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        // An HTML error page or a cut-off body is not a missing field.
        if inner.is_syntax() || inner.is_eof() {
            ExtractionError::InvalidValue {
                path: "response body".to_string(),
                value: inner.to_string(),
            }
        } else {
            ExtractionError::MissingField {
                path: format!("{path} ({inner})"),
            }
        }
    })
}

/// Reads the first location's first three forecast windows.
pub fn extract_forecast(
    response: &ForecastResponse,
    today: NaiveDate,
) -> Result<Forecast, ExtractionError> {
    let location = response
        .records
        .location
        .first()
        .ok_or_else(|| missing("records.location[0]".to_string()))?;

    let value = |name: &str, i: usize| -> Result<String, ExtractionError> {
        Ok(slot(location, name, i)?.parameter.parameter_name.clone())
    };

    let mut periods = Vec::with_capacity(PERIODS);
    for i in 0..PERIODS {
        let wx = slot(location, "Wx", i)?;
        let start = parse_time(&wx.start_time, format!("Wx.time[{i}].startTime"))?;
        let end = parse_time(&wx.end_time, format!("Wx.time[{i}].endTime"))?;
        let period = Period::from_hour(start.hour());

        let pop = value("PoP", i)?;
        let rain_probability = pop
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| ExtractionError::InvalidValue {
                path: format!("PoP.time[{i}].parameter.parameterName"),
                value: pop.clone(),
            })?;

        periods.push(ForecastEntry {
            period_label: period_label(start, today),
            icon: period.icon().to_string(),
            time_range: format!(
                "{} ~ {}",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%H:%M")
            ),
            condition: wx.parameter.parameter_name.clone(),
            comfort: value("CI", i)?,
            min_temp: value("MinT", i)?,
            max_temp: value("MaxT", i)?,
            rain_probability,
        });
    }

    Ok(Forecast {
        location: location.location_name.clone(),
        periods,
    })
}

fn slot<'a>(
    location: &'a Location,
    name: &str,
    i: usize,
) -> Result<&'a TimeSlot, ExtractionError> {
    location
        .weather_element
        .iter()
        .find(|el| el.element_name == name)
        .ok_or_else(|| missing(format!("weatherElement[{name}]")))?
        .time
        .get(i)
        .ok_or_else(|| missing(format!("weatherElement[{name}].time[{i}]")))
}

fn missing(path: String) -> ExtractionError {
    ExtractionError::MissingField { path }
}

fn parse_time(value: &str, path: String) -> Result<NaiveDateTime, ExtractionError> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT).map_err(|_| ExtractionError::InvalidValue {
        path,
        value: value.to_string(),
    })
}

/// The weather source for one location.
pub struct WeatherForecast<'a> {
    api_url: &'a str,
    api_key: Option<&'a SecretString>,
    location: &'a str,
}

impl<'a> WeatherForecast<'a> {
    pub fn new(config: &'a Config) -> WeatherForecast<'a> {
        WeatherForecast {
            api_url: &config.endpoints.weather_api_url,
            api_key: config.credentials.cwa_api_key.as_ref(),
            location: &config.weather.location,
        }
    }
}

#[async_trait]
impl Source for WeatherForecast<'_> {
    type Data = Forecast;

    fn name(&self) -> &'static str {
        "weather"
    }

    async fn fetch(&self, client: &Client) -> anyhow::Result<Forecast> {
        let api_key = self.api_key.ok_or(CredentialError {
            channel: None,
            missing: "CWA_API_KEY",
        })?;
        let url = url::Url::parse_with_params(
            self.api_url,
            &[
                ("Authorization", api_key.expose_secret()),
                ("locationName", self.location),
            ],
        )
        .with_context(|| format!("invalid weather API URL {}", self.api_url))?;
        let body = http_client::get_text(client, url).await?;
        let response = parse_response(&body)?;
        let forecast = extract_forecast(&response, forecast_today())?;
        tracing::debug!(
            location = %forecast.location,
            "fetched {} forecast periods",
            forecast.periods.len()
        );
        Ok(forecast)
    }

    fn plain_text(&self, forecast: &Forecast) -> String {
        forecast_text(&forecast.location, &forecast.periods)
    }

    fn card(&self, forecast: &Forecast) -> Card {
        forecast_card(&forecast.location, &forecast.periods)
    }
}
