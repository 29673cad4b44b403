//! Rule-based paddling safety rating.
//!
//! Keyword deductions are applied before the threshold caps, so one extreme
//! condition always dominates the final score. Results are rounded down to
//! the nearest half point.

use crate::types::HourlyCondition;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;
/// Starting rating when the hour carries none
pub const NEUTRAL_RATING: f64 = 2.5;

pub const DANGER_DEDUCTION: f64 = 1.0;
pub const WARNING_DEDUCTION: f64 = 0.5;
pub const CAUTION_DEDUCTION: f64 = 0.25;

/// Inputs the scorer reads; `None` (or a non-finite value) means "unknown"
/// and never incurs a penalty.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInput {
    pub rating: Option<f64>,
    pub wind_speed_kph: Option<f64>,
    pub gust_speed_kph: Option<f64>,
    pub temperature_c: Option<f64>,
    pub visibility_km: Option<f64>,
}

impl From<&HourlyCondition> for ScoreInput {
    fn from(c: &HourlyCondition) -> Self {
        Self {
            rating: c.rating,
            wind_speed_kph: Some(c.wind_speed_kph),
            gust_speed_kph: Some(c.gust_speed_kph),
            temperature_c: Some(c.temperature_c),
            visibility_km: Some(c.visibility_km),
        }
    }
}

fn known(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Deduction for a single warning, by its strongest keyword
pub fn keyword_deduction(warning: &str) -> f64 {
    let upper = warning.to_uppercase();
    if upper.contains("DANGER") {
        DANGER_DEDUCTION
    } else if upper.contains("WARNING") {
        WARNING_DEDUCTION
    } else if upper.contains("CAUTION") {
        CAUTION_DEDUCTION
    } else {
        0.0
    }
}

/// Sum of keyword deductions across all warnings
pub fn warning_deduction<S: AsRef<str>>(warnings: &[S]) -> f64 {
    warnings.iter().map(|w| keyword_deduction(w.as_ref())).sum()
}

/// Round toward greater caution: down to the nearest 0.5
pub fn round_down_to_half(value: f64) -> f64 {
    (value * 2.0).floor() / 2.0
}

/// Clamp to the rating range and round down to a half point
pub fn normalize_rating(value: f64) -> f64 {
    if !value.is_finite() {
        return MIN_RATING;
    }
    round_down_to_half(value.clamp(MIN_RATING, MAX_RATING))
}

/// Score one hour. Total: any input yields a multiple of 0.5 in [1.0, 5.0].
pub fn score<S: AsRef<str>>(input: &ScoreInput, warnings: &[S]) -> f64 {
    let mut rating = known(input.rating).unwrap_or(NEUTRAL_RATING);

    rating -= warning_deduction(warnings);

    let wind = known(input.wind_speed_kph);
    let gust = known(input.gust_speed_kph);
    let above = |value: Option<f64>, limit: f64| value.is_some_and(|v| v > limit);

    if above(wind, 30.0) || above(gust, 40.0) {
        rating = rating.min(1.0);
    }
    if above(wind, 25.0) || above(gust, 35.0) {
        rating = rating.min(2.0);
    }
    if known(input.temperature_c).is_some_and(|t| t < 10.0) {
        rating = rating.min(1.5);
    }
    if known(input.visibility_km).is_some_and(|v| v < 3.0) {
        rating = rating.min(1.0);
    }

    normalize_rating(rating)
}

/// Score an hour using its own warnings
pub fn score_hour(condition: &HourlyCondition) -> f64 {
    score(&ScoreInput::from(condition), &condition.warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    fn calm(rating: f64) -> ScoreInput {
        ScoreInput {
            rating: Some(rating),
            wind_speed_kph: Some(10.0),
            gust_speed_kph: Some(14.0),
            temperature_c: Some(22.0),
            visibility_km: Some(15.0),
        }
    }

    #[test]
    fn test_ideal_conditions_keep_top_rating() {
        assert_eq!(score(&calm(5.0), &NONE), 5.0);
    }

    #[test]
    fn test_missing_rating_is_neutral() {
        let input = ScoreInput {
            rating: None,
            ..calm(0.0)
        };
        assert_eq!(score(&input, &NONE), 2.5);
        assert_eq!(score(&ScoreInput::default(), &NONE), 2.5);
    }

    #[test]
    fn test_danger_deducts_one_point_each() {
        assert_eq!(score(&calm(5.0), &["DANGER: rip current"]), 4.0);
        assert_eq!(score(&calm(5.0), &["danger: lightning", "Danger: surf"]), 3.0);
        assert_eq!(
            score(&calm(3.0), &["DANGER", "DANGER", "DANGER", "DANGER"]),
            1.0
        );
    }

    #[test]
    fn test_deductions_stack() {
        // 5.0 - 0.5 - 0.25 = 4.25 -> 4.0
        assert_eq!(score(&calm(5.0), &["WARNING: wind", "caution: sun"]), 4.0);
        // 4.0 - 0.25 * 2 = 3.5
        assert_eq!(score(&calm(4.0), &["CAUTION", "CAUTION"]), 3.5);
        // unrecognised text costs nothing
        assert_eq!(score(&calm(4.0), &["Bring a spare paddle"]), 4.0);
    }

    #[test]
    fn test_strong_wind_caps_at_two() {
        for base in [1.0, 2.5, 4.0, 5.0, 9.0] {
            let input = ScoreInput {
                wind_speed_kph: Some(27.0),
                ..calm(base)
            };
            assert!(score(&input, &NONE) <= 2.0);
        }
    }

    #[test]
    fn test_wind_35_never_above_two() {
        let input = ScoreInput {
            wind_speed_kph: Some(35.0),
            ..calm(5.0)
        };
        assert!(score(&input, &NONE) <= 2.0);
        assert_eq!(score(&input, &NONE), 1.0);
    }

    #[test]
    fn test_gust_caps() {
        let strong = ScoreInput {
            gust_speed_kph: Some(36.0),
            ..calm(5.0)
        };
        let severe = ScoreInput {
            gust_speed_kph: Some(41.0),
            ..calm(5.0)
        };
        assert_eq!(score(&strong, &NONE), 2.0);
        assert_eq!(score(&severe, &NONE), 1.0);
    }

    #[test]
    fn test_cold_and_fog_caps() {
        let cold = ScoreInput {
            temperature_c: Some(8.0),
            ..calm(5.0)
        };
        let fog = ScoreInput {
            visibility_km: Some(2.0),
            ..calm(5.0)
        };
        assert_eq!(score(&cold, &NONE), 1.5);
        assert_eq!(score(&fog, &NONE), 1.0);
    }

    #[test]
    fn test_caps_never_raise() {
        let input = ScoreInput {
            temperature_c: Some(5.0),
            ..calm(1.0)
        };
        assert_eq!(score(&input, &NONE), 1.0);
    }

    #[test]
    fn test_rounds_down_to_half() {
        assert_eq!(score(&calm(4.9), &NONE), 4.5);
        assert_eq!(score(&calm(3.49), &NONE), 3.0);
        assert_eq!(score(&calm(3.5), &NONE), 3.5);
    }

    #[test]
    fn test_just_below_half_point_rounds_down() {
        let input = |rating: f64| ScoreInput {
            rating: Some(rating),
            ..ScoreInput::default()
        };
        assert_eq!(score(&input(4.4999999999), &NONE), 4.0);
        assert_eq!(score(&input(2.4999999996), &NONE), 2.0);
        assert_eq!(round_down_to_half(4.9999999), 4.5);
    }

    #[test]
    fn test_output_always_on_half_grid() {
        let warnings = ["WARNING", "caution", "DANGER"];
        for rating in [-3.0, 0.0, 1.1, 2.2, 3.3, 4.4, 5.5, 12.0, f64::NAN] {
            for wind in [None, Some(0.0), Some(26.0), Some(31.0), Some(f64::INFINITY)] {
                for n in 0..=warnings.len() {
                    let input = ScoreInput {
                        rating: Some(rating),
                        wind_speed_kph: wind,
                        ..ScoreInput::default()
                    };
                    let s = score(&input, &warnings[..n]);
                    assert!((MIN_RATING..=MAX_RATING).contains(&s), "{s}");
                    assert_eq!((s * 2.0).fract(), 0.0, "{s}");
                }
            }
        }
    }

    #[test]
    fn test_score_hour_uses_own_warnings() {
        let condition = HourlyCondition {
            hour: 12,
            temperature_c: 22.0,
            wind_speed_kph: 10.0,
            wind_direction: "N".to_string(),
            gust_speed_kph: 12.0,
            humidity_pct: 50.0,
            cloud_cover_pct: 10.0,
            uv_index: 5.0,
            visibility_km: 15.0,
            warnings: vec!["DANGER: lightning".to_string()],
            rating: Some(5.0),
            source: crate::types::DataSource::Api,
        };
        assert_eq!(score_hour(&condition), 4.0);
    }
}
