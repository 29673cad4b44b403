//! Baseline climate table for synthesized forecasts.
//!
//! Named paddling areas are matched first by a ~1°×1° box; anything else
//! falls into a latitude band. Every entry carries a warm-season and a
//! cold-season baseline, picked by month and hemisphere.

use crate::coords::Coordinate;

/// Latitude bounding the tropics, in degrees
pub const TROPIC_LATITUDE: f64 = 23.5;
/// Poleward of this latitude a band is treated as temperate
pub const TEMPERATE_LATITUDE: f64 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchRule {
    BoundingBox {
        lat_min: f64,
        lat_max: f64,
        lng_min: f64,
        lng_max: f64,
    },
    Tropical,
    NorthernTemperate,
    SouthernTemperate,
    Global,
}

impl MatchRule {
    pub fn matches(&self, coord: &Coordinate) -> bool {
        let lat = coord.latitude();
        match *self {
            Self::BoundingBox {
                lat_min,
                lat_max,
                lng_min,
                lng_max,
            } => {
                (lat_min..=lat_max).contains(&lat)
                    && (lng_min..=lng_max).contains(&coord.longitude())
            }
            Self::Tropical => lat.abs() < TROPIC_LATITUDE,
            Self::NorthernTemperate => lat > TEMPERATE_LATITUDE,
            Self::SouthernTemperate => lat < -TEMPERATE_LATITUDE,
            Self::Global => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    /// Warm (or, in the tropics, wet) half of the year
    Summer,
    Winter,
}

impl Season {
    /// Season at `latitude` for a calendar month (1-12)
    pub fn for_month(latitude: f64, month: u32) -> Self {
        let northern_summer = (4..=9).contains(&month);
        if (latitude >= 0.0) == northern_summer {
            Self::Summer
        } else {
            Self::Winter
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub base_temp_c: f64,
    pub base_wind_kph: f64,
    pub humidity_pct: f64,
    pub cloud_cover_pct: f64,
    pub uv_index: f64,
    pub visibility_km: f64,
}

const fn baseline(
    base_temp_c: f64,
    base_wind_kph: f64,
    humidity_pct: f64,
    cloud_cover_pct: f64,
    uv_index: f64,
    visibility_km: f64,
) -> Baseline {
    Baseline {
        base_temp_c,
        base_wind_kph,
        humidity_pct,
        cloud_cover_pct,
        uv_index,
        visibility_km,
    }
}

/// One row of the climate table
#[derive(Debug, Clone, Copy)]
pub struct ClimateEntry {
    pub name: &'static str,
    pub region: &'static str,
    pub country: &'static str,
    pub rule: MatchRule,
    pub wind_direction: &'static str,
    pub summer: Baseline,
    pub winter: Baseline,
}

/// A climate entry resolved for a season
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionClimateProfile {
    pub name: &'static str,
    pub region: &'static str,
    pub country: &'static str,
    pub match_rule: MatchRule,
    pub season: Season,
    pub wind_direction: &'static str,
    pub base_temp_c: f64,
    pub base_wind_kph: f64,
    pub humidity_pct: f64,
    pub cloud_cover_pct: f64,
    pub uv_index: f64,
    pub visibility_km: f64,
}

impl ClimateEntry {
    fn resolve(&self, season: Season) -> RegionClimateProfile {
        let b = match season {
            Season::Summer => self.summer,
            Season::Winter => self.winter,
        };
        RegionClimateProfile {
            name: self.name,
            region: self.region,
            country: self.country,
            match_rule: self.rule,
            season,
            wind_direction: self.wind_direction,
            base_temp_c: b.base_temp_c,
            base_wind_kph: b.base_wind_kph,
            humidity_pct: b.humidity_pct,
            cloud_cover_pct: b.cloud_cover_pct,
            uv_index: b.uv_index,
            visibility_km: b.visibility_km,
        }
    }
}

macro_rules! around {
    ($lat:expr, $lng:expr) => {
        MatchRule::BoundingBox {
            lat_min: $lat - 0.5,
            lat_max: $lat + 0.5,
            lng_min: $lng - 0.5,
            lng_max: $lng + 0.5,
        }
    };
}

static NAMED_REGIONS: [ClimateEntry; 10] = [
    ClimateEntry {
        name: "Minneapolis Chain of Lakes",
        region: "Minnesota",
        country: "United States",
        rule: around!(44.97, -93.27),
        wind_direction: "NW",
        summer: baseline(24.0, 14.0, 65.0, 40.0, 7.0, 16.0),
        winter: baseline(-6.0, 18.0, 70.0, 60.0, 1.5, 12.0),
    },
    ClimateEntry {
        name: "Boundary Waters",
        region: "Minnesota",
        country: "United States",
        rule: around!(47.95, -91.5),
        wind_direction: "NW",
        summer: baseline(21.0, 13.0, 70.0, 45.0, 6.0, 20.0),
        winter: baseline(-14.0, 15.0, 72.0, 55.0, 1.0, 15.0),
    },
    ClimateEntry {
        name: "Lake Tahoe",
        region: "California",
        country: "United States",
        rule: around!(39.1, -120.03),
        wind_direction: "SW",
        summer: baseline(22.0, 12.0, 35.0, 15.0, 9.0, 25.0),
        winter: baseline(2.0, 16.0, 55.0, 50.0, 3.0, 18.0),
    },
    ClimateEntry {
        name: "Puget Sound",
        region: "Washington",
        country: "United States",
        rule: around!(47.6, -122.4),
        wind_direction: "S",
        summer: baseline(21.0, 12.0, 65.0, 40.0, 6.0, 16.0),
        winter: baseline(7.0, 18.0, 82.0, 85.0, 1.0, 8.0),
    },
    ClimateEntry {
        name: "Florida Keys",
        region: "Florida",
        country: "United States",
        rule: around!(24.7, -81.1),
        wind_direction: "E",
        summer: baseline(30.0, 16.0, 78.0, 45.0, 11.0, 18.0),
        winter: baseline(24.0, 18.0, 72.0, 30.0, 7.0, 18.0),
    },
    ClimateEntry {
        name: "Vancouver Harbour",
        region: "British Columbia",
        country: "Canada",
        rule: around!(49.3, -123.1),
        wind_direction: "W",
        summer: baseline(20.0, 11.0, 68.0, 45.0, 6.0, 15.0),
        winter: baseline(5.0, 15.0, 85.0, 85.0, 1.0, 8.0),
    },
    ClimateEntry {
        name: "Lake District",
        region: "Cumbria",
        country: "United Kingdom",
        rule: around!(54.45, -3.05),
        wind_direction: "SW",
        summer: baseline(17.0, 16.0, 78.0, 70.0, 5.0, 15.0),
        winter: baseline(5.0, 22.0, 88.0, 85.0, 1.0, 9.0),
    },
    ClimateEntry {
        name: "Lake Geneva",
        region: "Vaud",
        country: "Switzerland",
        rule: around!(46.45, 6.55),
        wind_direction: "SW",
        summer: baseline(23.0, 9.0, 65.0, 40.0, 7.0, 20.0),
        winter: baseline(3.0, 10.0, 80.0, 75.0, 1.0, 8.0),
    },
    ClimateEntry {
        name: "Sydney Harbour",
        region: "New South Wales",
        country: "Australia",
        rule: around!(-33.85, 151.2),
        wind_direction: "NE",
        summer: baseline(26.0, 18.0, 65.0, 35.0, 11.0, 20.0),
        winter: baseline(14.0, 14.0, 65.0, 40.0, 3.0, 20.0),
    },
    ClimateEntry {
        name: "Milford Sound",
        region: "Southland",
        country: "New Zealand",
        rule: around!(-44.65, 167.9),
        wind_direction: "W",
        summer: baseline(17.0, 14.0, 85.0, 75.0, 6.0, 12.0),
        winter: baseline(6.0, 12.0, 85.0, 75.0, 1.0, 10.0),
    },
];

// Order matters: tropical before the temperate bands, global last.
static CLIMATE_BANDS: [ClimateEntry; 4] = [
    ClimateEntry {
        name: "Tropical Waters",
        region: "Tropical Zone",
        country: "Unknown",
        rule: MatchRule::Tropical,
        wind_direction: "E",
        summer: baseline(29.0, 12.0, 82.0, 65.0, 11.0, 12.0),
        winter: baseline(28.0, 14.0, 70.0, 35.0, 11.0, 18.0),
    },
    ClimateEntry {
        name: "Temperate Waters",
        region: "Northern Temperate Zone",
        country: "Unknown",
        rule: MatchRule::NorthernTemperate,
        wind_direction: "W",
        summer: baseline(21.0, 14.0, 65.0, 45.0, 6.0, 15.0),
        winter: baseline(2.0, 18.0, 78.0, 70.0, 1.5, 10.0),
    },
    ClimateEntry {
        name: "Temperate Waters",
        region: "Southern Temperate Zone",
        country: "Unknown",
        rule: MatchRule::SouthernTemperate,
        wind_direction: "W",
        summer: baseline(19.0, 16.0, 68.0, 50.0, 7.0, 15.0),
        winter: baseline(8.0, 20.0, 75.0, 65.0, 2.0, 12.0),
    },
    ClimateEntry {
        name: "Open Water",
        region: "Subtropical Zone",
        country: "Unknown",
        rule: MatchRule::Global,
        wind_direction: "NE",
        summer: baseline(27.0, 13.0, 60.0, 30.0, 9.0, 18.0),
        winter: baseline(17.0, 14.0, 60.0, 40.0, 5.0, 16.0),
    },
];

pub fn named_regions() -> &'static [ClimateEntry] {
    &NAMED_REGIONS
}

/// Resolve the climate profile for `coord` in calendar month `month` (1-12)
pub fn lookup(coord: &Coordinate, month: u32) -> RegionClimateProfile {
    let season = Season::for_month(coord.latitude(), month);
    let entry = NAMED_REGIONS
        .iter()
        .chain(CLIMATE_BANDS.iter())
        .find(|entry| entry.rule.matches(coord))
        .unwrap_or(&CLIMATE_BANDS[CLIMATE_BANDS.len() - 1]);
    entry.resolve(season)
}
