//! Lenient decoding of upstream forecast payloads.
//!
//! Only the top-level shape is strict: `success` must be true, `forecast`
//! must be a non-empty array and the first day must carry at least one
//! usable hour. Inside an hour, missing or malformed fields fall back to
//! neutral values that incur no scoring penalty.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::coords::{self, Coordinate};
use crate::fallback;
use crate::types::{
    DataSource, DayForecast, ForecastMetadata, ForecastResult, HourlyCondition, LocationInfo,
    FORECAST_DAYS,
};

const NEUTRAL_TEMPERATURE_C: f64 = 20.0;
const NEUTRAL_HUMIDITY_PCT: f64 = 50.0;
const NEUTRAL_VISIBILITY_KM: f64 = 10.0;
const UNKNOWN_DIRECTION: &str = "VRB";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("response is not valid JSON: {0}")]
    NotJson(String),
    #[error("response reports success = false")]
    NotSuccessful,
    #[error("response has no forecast days")]
    MissingForecast,
    #[error("first forecast day has no usable hours")]
    EmptyHourly,
    #[error("current conditions object is missing")]
    MissingCurrent,
}

/// Map an hour key to 0-23. Accepts `"6"`, `"06"`, `"06:00"` and a few
/// named periods; anything else is `None`.
pub fn parse_hour_key(key: &str) -> Option<u8> {
    let key = key.trim().to_ascii_lowercase();
    let named = match key.as_str() {
        "morning" => Some(8),
        "noon" | "midday" => Some(12),
        "afternoon" => Some(15),
        "evening" => Some(18),
        "night" => Some(21),
        _ => None,
    };
    if named.is_some() {
        return named;
    }

    let hour_part = key.split(':').next().unwrap_or_default();
    hour_part.parse::<u8>().ok().filter(|h| *h < 24)
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name))
}

fn wind_direction(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => {
            let trimmed = s.trim();
            match trimmed.parse::<f64>() {
                Ok(degrees) => coords::compass_label(degrees).to_string(),
                Err(_) => trimmed.to_ascii_uppercase(),
            }
        }
        Some(Value::Number(n)) => n
            .as_f64()
            .map(coords::compass_label)
            .unwrap_or(UNKNOWN_DIRECTION)
            .to_string(),
        _ => UNKNOWN_DIRECTION.to_string(),
    }
}

fn warnings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn rating(object: &Map<String, Value>) -> Option<f64> {
    let nested = object
        .get("prediction")
        .and_then(Value::as_object)
        .and_then(|p| number(p.get("rating")));
    nested.or_else(|| number(object.get("rating")))
}

/// Decode one hour object. Non-object values yield `None`.
pub fn parse_hour(hour: u8, value: &Value) -> Option<HourlyCondition> {
    let object = value.as_object()?;

    let wind_speed_kph = number(field(object, &["windSpeed", "windSpeedKph"]))
        .unwrap_or(0.0)
        .max(0.0);
    let gust_speed_kph = number(field(object, &["gustSpeed", "gustSpeedKph"]))
        .unwrap_or(wind_speed_kph)
        .max(0.0);

    Some(HourlyCondition {
        hour,
        temperature_c: number(field(object, &["temperature", "temperatureC"]))
            .unwrap_or(NEUTRAL_TEMPERATURE_C),
        wind_speed_kph,
        wind_direction: wind_direction(object.get("windDirection")),
        gust_speed_kph,
        humidity_pct: number(field(object, &["humidity", "humidityPct"]))
            .unwrap_or(NEUTRAL_HUMIDITY_PCT)
            .clamp(0.0, 100.0),
        cloud_cover_pct: number(field(object, &["cloudCover", "cloudCoverPct"]))
            .unwrap_or(0.0)
            .clamp(0.0, 100.0),
        uv_index: number(object.get("uvIndex")).unwrap_or(0.0).max(0.0),
        visibility_km: number(field(object, &["visibility", "visibilityKm"]))
            .unwrap_or(NEUTRAL_VISIBILITY_KM)
            .max(0.0),
        warnings: warnings(object.get("warnings")),
        rating: rating(object),
        source: DataSource::Api,
    })
}

fn parse_hourly(value: Option<&Value>) -> BTreeMap<u8, HourlyCondition> {
    let Some(Value::Object(hours)) = value else {
        return BTreeMap::new();
    };
    hours
        .iter()
        .filter_map(|(key, value)| {
            let parsed = parse_hour_key(key).and_then(|hour| parse_hour(hour, value));
            if parsed.is_none() {
                tracing::debug!("Skipping unusable hour entry {:?}", key);
            }
            parsed.map(|condition| (condition.hour, condition))
        })
        .collect()
}

fn parse_date(value: Option<&Value>) -> Option<NaiveDate> {
    let text = value?.as_str()?.trim();
    // Accept bare dates and RFC 3339 timestamps alike
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn parse_location(value: Option<&Value>, coord: &Coordinate, month: u32) -> LocationInfo {
    let mut location = fallback::location_for(coord, month);
    let Some(object) = value.and_then(Value::as_object) else {
        return location;
    };
    let text = |name: &str| {
        object
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    if let Some(name) = text("name") {
        location.name = name;
    }
    if let Some(region) = text("region") {
        location.region = region;
    }
    if let Some(country) = text("country") {
        location.country = country;
    }
    location
}

fn check_success(object: &Map<String, Value>) -> Result<(), PayloadError> {
    match object.get("success") {
        Some(Value::Bool(true)) => Ok(()),
        _ => Err(PayloadError::NotSuccessful),
    }
}

/// Decode a `/forecast` response into a result tagged `source = api`.
///
/// At most [`FORECAST_DAYS`] days are kept; fewer may be returned.
/// Undated days are numbered on from the first dated one, or from the
/// local date at `coord`.
pub fn parse_forecast(
    body: &Value,
    coord: &Coordinate,
    retrieved_at: DateTime<Utc>,
) -> Result<ForecastResult, PayloadError> {
    let object = body.as_object().ok_or(PayloadError::MissingForecast)?;
    check_success(object)?;

    let days = match object.get("forecast") {
        Some(Value::Array(days)) if !days.is_empty() => days,
        _ => return Err(PayloadError::MissingForecast),
    };

    let first_date = days
        .first()
        .and_then(|d| parse_date(d.get("date")))
        .unwrap_or_else(|| coords::local_date_at(coord, retrieved_at));

    let forecast: Vec<DayForecast> = days
        .iter()
        .take(FORECAST_DAYS)
        .enumerate()
        .map(|(index, day)| DayForecast {
            date: parse_date(day.get("date"))
                .unwrap_or_else(|| first_date + Duration::days(index as i64)),
            hourly: parse_hourly(day.get("hourly")),
        })
        .collect();

    if forecast.first().map_or(true, |d| d.hourly.is_empty()) {
        return Err(PayloadError::EmptyHourly);
    }
    if days.len() > FORECAST_DAYS {
        tracing::debug!(
            "Upstream returned {} days, keeping {}",
            days.len(),
            FORECAST_DAYS
        );
    }

    Ok(ForecastResult {
        success: true,
        location: parse_location(object.get("location"), coord, first_date.month()),
        forecast,
        metadata: ForecastMetadata {
            source: DataSource::Api,
            fallback_reason: None,
            retrieved_at,
        },
    })
}

/// Decode a `/current` response. The object may be bare or wrapped in
/// `current`/`data`; `local_hour` is used when it carries no hour.
pub fn parse_current(body: &Value, local_hour: u8) -> Result<HourlyCondition, PayloadError> {
    let object = body.as_object().ok_or(PayloadError::MissingCurrent)?;
    if object.contains_key("success") {
        check_success(object)?;
    }

    let inner = field(object, &["current", "data"]).unwrap_or(body);
    let hour = inner
        .get("hour")
        .and_then(|h| match h {
            Value::String(s) => parse_hour_key(s),
            other => number(Some(other)).and_then(|n| (0.0..24.0).contains(&n).then_some(n as u8)),
        })
        .unwrap_or(local_hour);

    let condition = parse_hour(hour, inner).ok_or(PayloadError::MissingCurrent)?;
    let inner_object = inner.as_object().ok_or(PayloadError::MissingCurrent)?;
    let has_reading = ["temperature", "temperatureC", "windSpeed", "windSpeedKph"]
        .iter()
        .any(|name| inner_object.contains_key(*name));
    if !has_reading {
        return Err(PayloadError::MissingCurrent);
    }
    Ok(condition)
}
