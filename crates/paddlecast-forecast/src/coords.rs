//! Coordinate validation and local-time estimation.
//!
//! The UTC offset is a geographic estimate: named windows for regions whose
//! civil time departs from `longitude / 15`, otherwise the solar offset.
//! Daylight saving is not modelled, so estimates can be an hour off in summer.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal places kept when keying a coordinate (~0.1 m).
pub const KEY_DECIMALS: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude and longitude must be finite numbers")]
    NotFinite,
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl From<CoordinateError> for paddlecast_core::AppError {
    fn from(e: CoordinateError) -> Self {
        paddlecast_core::AppError::Forecast(paddlecast_core::ForecastError::InvalidCoordinate(
            e.to_string(),
        ))
    }
}

/// A validated latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        // Fold -0.0 into 0.0 so both key identically
        Ok(Self {
            latitude: latitude + 0.0,
            longitude: longitude + 0.0,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Both components scaled to integer millionths of a degree
    pub fn scaled_e6(&self) -> (i64, i64) {
        let scale = 10f64.powi(KEY_DECIMALS);
        (
            (self.latitude * scale).round() as i64,
            (self.longitude * scale).round() as i64,
        )
    }
}

struct OffsetWindow {
    lat: (f64, f64),
    lng: (f64, f64),
    offset_hours: f64,
}

impl OffsetWindow {
    fn contains(&self, coord: &Coordinate) -> bool {
        (self.lat.0..self.lat.1).contains(&coord.latitude)
            && (self.lng.0..self.lng.1).contains(&coord.longitude)
    }
}

// First match wins.
const OFFSET_WINDOWS: &[OffsetWindow] = &[
    // South Asia
    OffsetWindow { lat: (5.0, 37.0), lng: (68.0, 97.5), offset_hours: 5.5 },
    // East Asia
    OffsetWindow { lat: (18.0, 54.0), lng: (97.5, 123.0), offset_hours: 8.0 },
    // Europe, split at 22.5°E
    OffsetWindow { lat: (36.0, 71.0), lng: (-5.0, 22.5), offset_hours: 1.0 },
    OffsetWindow { lat: (36.0, 71.0), lng: (22.5, 40.0), offset_hours: 2.0 },
    // Continental US: Pacific, Mountain, Central, Eastern
    OffsetWindow { lat: (24.0, 50.0), lng: (-125.0, -114.5), offset_hours: -8.0 },
    OffsetWindow { lat: (24.0, 50.0), lng: (-114.5, -101.0), offset_hours: -7.0 },
    OffsetWindow { lat: (24.0, 50.0), lng: (-101.0, -87.0), offset_hours: -6.0 },
    OffsetWindow { lat: (24.0, 50.0), lng: (-87.0, -66.0), offset_hours: -5.0 },
];

/// Estimate the standard-time UTC offset for a coordinate, in hours
pub fn estimate_utc_offset_hours(coord: &Coordinate) -> f64 {
    OFFSET_WINDOWS
        .iter()
        .find(|w| w.contains(coord))
        .map(|w| w.offset_hours)
        .unwrap_or_else(|| (coord.longitude / 15.0).round())
}

/// Estimated local wall-clock time at `coord` for the instant `now`
pub fn local_datetime_at(coord: &Coordinate, now: DateTime<Utc>) -> NaiveDateTime {
    let offset_minutes = (estimate_utc_offset_hours(coord) * 60.0).round() as i64;
    now.naive_utc() + Duration::minutes(offset_minutes)
}

pub fn local_hour_at(coord: &Coordinate, now: DateTime<Utc>) -> u8 {
    local_datetime_at(coord, now).hour() as u8
}

pub fn local_date_at(coord: &Coordinate, now: DateTime<Utc>) -> NaiveDate {
    local_datetime_at(coord, now).date()
}

/// Current local hour (0-23) at `coord`
pub fn local_hour_now(coord: &Coordinate) -> u8 {
    local_hour_at(coord, Utc::now())
}

/// Pick the hour key that represents "now" in a sparse day: the latest key
/// not after `local_hour`, or the earliest key when `local_hour` precedes them all.
pub fn current_hour_key<I>(local_hour: u8, keys: I) -> Option<u8>
where
    I: IntoIterator<Item = u8>,
{
    let mut earliest = None;
    let mut latest_not_after = None;
    for key in keys {
        earliest = Some(earliest.map_or(key, |e: u8| e.min(key)));
        if key <= local_hour {
            latest_not_after = Some(latest_not_after.map_or(key, |l: u8| l.max(key)));
        }
    }
    latest_not_after.or(earliest)
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass label for a bearing in degrees
pub fn compass_label(degrees: f64) -> &'static str {
    if !degrees.is_finite() {
        return "VRB";
    }
    let index = (degrees.rem_euclid(360.0) / 22.5 + 0.5).floor() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[index]
}
