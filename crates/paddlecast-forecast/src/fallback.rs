//! Locally synthesized forecasts for when the upstream source is unavailable.
//!
//! Every value is derived from the climate baseline for the coordinate plus
//! bounded jitter. The jitter comes from a generator seeded by
//! `(seed, coordinate, date, hour)`, so one synthesizer always produces the
//! same hour for the same key while neighbouring locations still differ.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::coords::{self, Coordinate};
use crate::regions::{self, RegionClimateProfile};
use crate::scoring;
use crate::types::{
    DataSource, DayForecast, FallbackReason, ForecastMetadata, ForecastResult, HourlyCondition,
    LocationInfo, FORECAST_DAYS,
};

pub const DEFAULT_SEED: u64 = 0x5EED_CA57;

/// Optimistic starting point for the coarse heuristic
const COARSE_BASELINE: f64 = 4.5;
/// Local hour at which the diurnal temperature curve peaks
const PEAK_HOUR: f64 = 13.0;
const DIURNAL_AMPLITUDE_C: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackSynthesizer {
    seed: u64,
}

impl Default for FallbackSynthesizer {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

impl FallbackSynthesizer {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Build a complete 3-day result. Never fails.
    pub fn synthesize(&self, coord: &Coordinate, reason: FallbackReason) -> ForecastResult {
        self.synthesize_at(coord, reason, Utc::now())
    }

    pub fn synthesize_at(
        &self,
        coord: &Coordinate,
        reason: FallbackReason,
        now: DateTime<Utc>,
    ) -> ForecastResult {
        let today = coords::local_date_at(coord, now);
        tracing::debug!(
            "Synthesizing {} fallback days for {:.4},{:.4} from {} ({})",
            FORECAST_DAYS,
            coord.latitude(),
            coord.longitude(),
            today,
            reason
        );

        let forecast = (0..FORECAST_DAYS as i64)
            .map(|offset| self.synthesize_day(coord, today + Duration::days(offset)))
            .collect();

        ForecastResult {
            success: true,
            location: location_for(coord, today.month()),
            forecast,
            metadata: ForecastMetadata {
                source: DataSource::Fallback,
                fallback_reason: Some(reason),
                retrieved_at: now,
            },
        }
    }

    /// All 24 hours of one local calendar day
    pub fn synthesize_day(&self, coord: &Coordinate, date: NaiveDate) -> DayForecast {
        let profile = regions::lookup(coord, date.month());
        let hourly: BTreeMap<u8, HourlyCondition> = (0..24u8)
            .map(|hour| (hour, self.hour_from_profile(coord, &profile, date, hour)))
            .collect();
        DayForecast { date, hourly }
    }

    pub fn synthesize_hour(&self, coord: &Coordinate, date: NaiveDate, hour: u8) -> HourlyCondition {
        let profile = regions::lookup(coord, date.month());
        self.hour_from_profile(coord, &profile, date, hour % 24)
    }

    /// The synthesized hour matching the local time at `coord`
    pub fn synthesize_current_at(&self, coord: &Coordinate, now: DateTime<Utc>) -> HourlyCondition {
        let local = coords::local_datetime_at(coord, now);
        let hour = coords::local_hour_at(coord, now);
        self.synthesize_hour(coord, local.date(), hour)
    }

    fn hour_seed(&self, coord: &Coordinate, date: NaiveDate, hour: u8) -> u64 {
        let (lat, lng) = coord.scaled_e6();
        [
            lat as u64,
            lng as u64,
            date.num_days_from_ce() as u64,
            u64::from(hour),
        ]
        .iter()
        .fold(self.seed, |acc, part| splitmix64(acc ^ part))
    }

    fn hour_from_profile(
        &self,
        coord: &Coordinate,
        profile: &RegionClimateProfile,
        date: NaiveDate,
        hour: u8,
    ) -> HourlyCondition {
        let mut rng = StdRng::seed_from_u64(self.hour_seed(coord, date, hour));
        let h = f64::from(hour);

        let diurnal = DIURNAL_AMPLITUDE_C * (2.0 * PI * (h - PEAK_HOUR) / 24.0).cos();
        let temperature_c = one_decimal(profile.base_temp_c + diurnal + rng.gen_range(-1.5..=1.5));

        let wind_speed_kph = one_decimal((profile.base_wind_kph + rng.gen_range(-3.0..=3.0)).max(0.0));
        let gust_speed_kph = one_decimal(wind_speed_kph * 1.35 + rng.gen_range(0.0..=4.0));

        let humidity_pct = (profile.humidity_pct + rng.gen_range(-8.0..=8.0))
            .clamp(0.0, 100.0)
            .round();
        let cloud_cover_pct = (profile.cloud_cover_pct + rng.gen_range(-15.0..=15.0))
            .clamp(0.0, 100.0)
            .round();

        let uv_index = if (6..=18).contains(&hour) {
            one_decimal((profile.uv_index * (PI * (h - 6.0) / 12.0).sin()).max(0.0))
        } else {
            0.0
        };
        let visibility_km = profile.visibility_km;

        let warnings = derive_warnings(
            temperature_c,
            wind_speed_kph,
            gust_speed_kph,
            uv_index,
            visibility_km,
        );
        let rating = coarse_rating(hour, temperature_c, wind_speed_kph, visibility_km, uv_index);

        HourlyCondition {
            hour,
            temperature_c,
            wind_speed_kph,
            wind_direction: profile.wind_direction.to_string(),
            gust_speed_kph,
            humidity_pct,
            cloud_cover_pct,
            uv_index,
            visibility_km,
            warnings,
            rating: Some(rating),
            source: DataSource::Fallback,
        }
    }
}

/// Place description from the climate table
pub fn location_for(coord: &Coordinate, month: u32) -> LocationInfo {
    let profile = regions::lookup(coord, month);
    LocationInfo {
        name: profile.name.to_string(),
        region: profile.region.to_string(),
        country: profile.country.to_string(),
        coordinates: *coord,
    }
}

/// Hazard strings for synthesized values, worded for the classifier
pub fn derive_warnings(
    temperature_c: f64,
    wind_speed_kph: f64,
    gust_speed_kph: f64,
    uv_index: f64,
    visibility_km: f64,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if wind_speed_kph > 30.0 || gust_speed_kph > 40.0 {
        warnings.push(format!(
            "DANGER: High winds {:.0} km/h, gusts to {:.0} km/h",
            wind_speed_kph, gust_speed_kph
        ));
    } else if wind_speed_kph > 25.0 || gust_speed_kph > 35.0 {
        warnings.push(format!(
            "WARNING: Strong winds {:.0} km/h, gusts to {:.0} km/h",
            wind_speed_kph, gust_speed_kph
        ));
    } else if wind_speed_kph > 18.0 {
        warnings.push(format!("CAUTION: Moderate winds {:.0} km/h", wind_speed_kph));
    }

    if temperature_c < 5.0 {
        warnings.push(format!(
            "WARNING: Cold conditions {:.0}°C, hypothermia risk",
            temperature_c
        ));
    } else if temperature_c < 10.0 {
        warnings.push(format!("CAUTION: Cold water likely, air {:.0}°C", temperature_c));
    } else if temperature_c > 35.0 {
        warnings.push(format!("WARNING: Extreme heat {:.0}°C", temperature_c));
    }

    if uv_index >= 8.0 {
        warnings.push(format!("CAUTION: Very high UV index {:.0}", uv_index));
    }

    if visibility_km < 3.0 {
        warnings.push(format!("WARNING: Poor visibility {:.1} km", visibility_km));
    } else if visibility_km < 5.0 {
        warnings.push(format!("CAUTION: Reduced visibility {:.1} km", visibility_km));
    }

    warnings
}

/// Built-in advisory rating for synthesized hours; superseded when the
/// hour is re-scored for display.
pub fn coarse_rating(
    hour: u8,
    temperature_c: f64,
    wind_speed_kph: f64,
    visibility_km: f64,
    uv_index: f64,
) -> f64 {
    let mut rating = COARSE_BASELINE;

    match hour {
        0..=5 | 21..=23 => rating -= 1.0,
        6..=7 | 19..=20 => rating -= 0.5,
        10..=16 => rating += 0.5,
        _ => {}
    }

    if temperature_c < 10.0 {
        rating -= 1.0;
    } else if temperature_c < 15.0 {
        rating -= 0.5;
    } else if temperature_c > 32.0 {
        rating -= 0.5;
    }

    if wind_speed_kph > 25.0 {
        rating -= 1.5;
    } else if wind_speed_kph > 15.0 {
        rating -= 0.5;
    }

    if visibility_km < 5.0 {
        rating -= 0.5;
    }
    if uv_index >= 8.0 {
        rating -= 0.25;
    }

    scoring::normalize_rating(rating)
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn noon_in_minneapolis() -> DateTime<Utc> {
        // 18:00 UTC is 12:00 at UTC-6
        Utc.with_ymd_and_hms(2026, 7, 15, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_full_three_day_shape() {
        let result = FallbackSynthesizer::default().synthesize_at(
            &coord(45.0, -93.0),
            FallbackReason::NetworkError,
            noon_in_minneapolis(),
        );

        assert!(result.success);
        assert_eq!(result.forecast.len(), FORECAST_DAYS);
        let dates: Vec<_> = result.forecast.iter().map(|d| d.date.day()).collect();
        assert_eq!(dates, vec![15, 16, 17]);
        for day in &result.forecast {
            assert_eq!(day.hourly.len(), 24);
            assert!(day.hourly.values().all(|h| h.source == DataSource::Fallback));
        }
    }

    #[test]
    fn test_metadata_records_reason() {
        let result = FallbackSynthesizer::default()
            .synthesize(&coord(45.0, -93.0), FallbackReason::HttpError { status: 502 });
        assert_eq!(result.metadata.source, DataSource::Fallback);
        assert_eq!(
            result.metadata.fallback_reason,
            Some(FallbackReason::HttpError { status: 502 })
        );
    }

    #[test]
    fn test_named_region_location() {
        let result = FallbackSynthesizer::default()
            .synthesize(&coord(45.0, -93.0), FallbackReason::NetworkError);
        assert_eq!(result.location.name, "Minneapolis Chain of Lakes");
        assert_eq!(result.location.region, "Minnesota");
        assert_eq!(result.location.country, "United States");
    }

    #[test]
    fn test_deterministic_per_key() {
        let synth = FallbackSynthesizer::with_seed(7);
        let c = coord(47.6, -122.4);
        let now = noon_in_minneapolis();
        let a = synth.synthesize_at(&c, FallbackReason::NetworkError, now);
        let b = synth.synthesize_at(&c, FallbackReason::InvalidPayload, now);
        assert_eq!(a.forecast, b.forecast);
    }

    #[test]
    fn test_varies_across_keys_and_seeds() {
        let now = noon_in_minneapolis();
        let a = FallbackSynthesizer::with_seed(1).synthesize_at(
            &coord(10.0, 10.0),
            FallbackReason::NetworkError,
            now,
        );
        let b = FallbackSynthesizer::with_seed(1).synthesize_at(
            &coord(10.5, 10.0),
            FallbackReason::NetworkError,
            now,
        );
        let c = FallbackSynthesizer::with_seed(2).synthesize_at(
            &coord(10.0, 10.0),
            FallbackReason::NetworkError,
            now,
        );
        assert_ne!(a.forecast, b.forecast);
        assert_ne!(a.forecast, c.forecast);
    }

    #[test]
    fn test_values_within_bounds() {
        let synth = FallbackSynthesizer::default();
        for (lat, lng) in [(0.0, 0.0), (45.0, -93.0), (-33.85, 151.2), (70.0, 20.0)] {
            let result = synth.synthesize(&coord(lat, lng), FallbackReason::NetworkError);
            for day in &result.forecast {
                for (key, h) in &day.hourly {
                    assert_eq!(*key, h.hour);
                    assert!((0.0..=100.0).contains(&h.humidity_pct));
                    assert!((0.0..=100.0).contains(&h.cloud_cover_pct));
                    assert!(h.wind_speed_kph >= 0.0);
                    assert!(h.gust_speed_kph >= h.wind_speed_kph);
                    let rating = h.rating.unwrap();
                    assert!((1.0..=5.0).contains(&rating));
                    assert_eq!((rating * 2.0).fract(), 0.0);
                    if h.hour < 6 || h.hour > 18 {
                        assert_eq!(h.uv_index, 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_current_matches_forecast_hour() {
        let synth = FallbackSynthesizer::default();
        let c = coord(45.0, -93.0);
        let now = noon_in_minneapolis();
        let current = synth.synthesize_current_at(&c, now);
        let forecast = synth.synthesize_at(&c, FallbackReason::NetworkError, now);
        assert_eq!(current.hour, 12);
        assert_eq!(Some(&current), forecast.forecast[0].hour(12));
    }

    #[test]
    fn test_derive_warnings() {
        assert!(derive_warnings(20.0, 10.0, 14.0, 5.0, 15.0).is_empty());

        let w = derive_warnings(20.0, 32.0, 45.0, 5.0, 15.0);
        assert_eq!(w.len(), 1);
        assert!(w[0].starts_with("DANGER"));

        let w = derive_warnings(3.0, 26.0, 30.0, 9.0, 2.0);
        assert_eq!(w.len(), 4);
        assert!(w[0].starts_with("WARNING: Strong winds"));
        assert!(w[1].contains("hypothermia"));
        assert!(w[2].contains("UV"));
        assert!(w[3].starts_with("WARNING: Poor visibility"));
    }

    #[test]
    fn test_coarse_rating() {
        // midday, mild, calm
        assert_eq!(coarse_rating(12, 22.0, 8.0, 15.0, 5.0), 5.0);
        // night
        assert_eq!(coarse_rating(2, 22.0, 8.0, 15.0, 0.0), 3.5);
        // midday with high UV: 5.0 - 0.25 rounds down
        assert_eq!(coarse_rating(13, 22.0, 8.0, 15.0, 9.0), 4.5);
        // everything bad at night
        assert_eq!(coarse_rating(23, 2.0, 40.0, 1.0, 0.0), 1.0);
    }
}
