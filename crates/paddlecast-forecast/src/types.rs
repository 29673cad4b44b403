use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::coords::Coordinate;

/// Number of days every forecast carries: today, +1, +2.
pub const FORECAST_DAYS: usize = 3;

/// Where a forecast (or a single hour of it) came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Api,
    Fallback,
}

impl DataSource {
    /// Attribution text for display
    pub fn description(&self) -> &'static str {
        match self {
            Self::Api => "Live forecast",
            Self::Fallback => "Estimated conditions",
        }
    }
}

/// Why the synthesizer ran instead of the upstream source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    NetworkError,
    HttpError { status: u16 },
    InvalidPayload,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkError => write!(f, "network error"),
            Self::HttpError { status } => write!(f, "HTTP error {}", status),
            Self::InvalidPayload => write!(f, "invalid or empty payload"),
        }
    }
}

/// Weather and hazard attributes for one local hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyCondition {
    /// Local hour of day (0-23)
    pub hour: u8,
    pub temperature_c: f64,
    pub wind_speed_kph: f64,
    /// Compass label, e.g. "NW"
    pub wind_direction: String,
    pub gust_speed_kph: f64,
    pub humidity_pct: f64,
    pub cloud_cover_pct: f64,
    pub uv_index: f64,
    pub visibility_km: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Provider rating, or the synthesizer's coarse rating; absent when unknown
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub source: DataSource,
}

/// One calendar day of hourly conditions.
///
/// Live data may only carry a few hours (e.g. morning/noon/evening);
/// synthesized days always carry all 24.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub hourly: BTreeMap<u8, HourlyCondition>,
}

impl DayForecast {
    pub fn hour(&self, hour: u8) -> Option<&HourlyCondition> {
        self.hourly.get(&hour)
    }

    /// Hour keys present in this day, ascending
    pub fn hour_keys(&self) -> Vec<u8> {
        self.hourly.keys().copied().collect()
    }
}

/// Human-readable place description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub name: String,
    pub region: String,
    pub country: String,
    pub coordinates: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastMetadata {
    pub source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    pub retrieved_at: DateTime<Utc>,
}

/// Uniform forecast bundle, identical in shape regardless of source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub success: bool,
    pub location: LocationInfo,
    pub forecast: Vec<DayForecast>,
    pub metadata: ForecastMetadata,
}

impl ForecastResult {
    pub fn source(&self) -> DataSource {
        self.metadata.source
    }

    pub fn is_fallback(&self) -> bool {
        self.metadata.source == DataSource::Fallback
    }

    pub fn today(&self) -> Option<&DayForecast> {
        self.forecast.first()
    }
}
