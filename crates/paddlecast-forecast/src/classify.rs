//! Skill bands and plain-language hazard explanations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scoring::{self, ScoreInput};
use crate::types::HourlyCondition;

/// Combined deductions at or above this add a "multiple hazards" line
pub const MULTIPLE_HAZARDS_THRESHOLD: f64 = 2.0;

/// Recommended paddler experience for a rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillBand {
    BeginnerFriendly,
    IntermediatePlus,
    Experienced,
    ExpertLevel,
    NotRecommended,
}

impl SkillBand {
    /// Lower-inclusive thresholds: 4.5, 3.5, 2.5, 1.5
    pub fn from_rating(rating: f64) -> Self {
        match rating {
            r if r >= 4.5 => Self::BeginnerFriendly,
            r if r >= 3.5 => Self::IntermediatePlus,
            r if r >= 2.5 => Self::Experienced,
            r if r >= 1.5 => Self::ExpertLevel,
            _ => Self::NotRecommended,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BeginnerFriendly => "Beginner-Friendly",
            Self::IntermediatePlus => "Intermediate+",
            Self::Experienced => "Experienced",
            Self::ExpertLevel => "Expert-Level",
            Self::NotRecommended => "Not-Recommended",
        }
    }
}

impl fmt::Display for SkillBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Advisory,
    Caution,
    Warning,
    Danger,
}

impl Severity {
    fn of(warning: &str) -> Self {
        let upper = warning.to_uppercase();
        if upper.contains("DANGER") {
            Self::Danger
        } else if upper.contains("WARNING") {
            Self::Warning
        } else if upper.contains("CAUTION") {
            Self::Caution
        } else {
            Self::Advisory
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Advisory => "ADVISORY",
            Self::Caution => "CAUTION",
            Self::Warning => "WARNING",
            Self::Danger => "DANGER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardCategory {
    Wind,
    WaterState,
    Cold,
    HeatUv,
    Visibility,
    Combined,
    Other,
}

// Checked in this order; the first category with a matching keyword wins.
const CATEGORY_KEYWORDS: &[(HazardCategory, &[&str])] = &[
    (HazardCategory::Wind, &["wind", "gust", "gale", "squall"]),
    (
        HazardCategory::WaterState,
        &["wave", "swell", "chop", "surf", "current", "tide", "rapids", "flood"],
    ),
    (
        HazardCategory::Cold,
        &["cold", "hypotherm", "freez", "frost", "icy", " ice", "chill"],
    ),
    (
        HazardCategory::HeatUv,
        &["heat", "hot weather", "high temperature", "uv", "sunburn"],
    ),
    (
        HazardCategory::Visibility,
        &["visibility", "fog", "mist", "haze", "smoke", "darkness"],
    ),
];

fn categorize(warning: &str) -> HazardCategory {
    let lower = warning.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(HazardCategory::Other)
}

fn phrase(category: HazardCategory, severity: Severity) -> &'static str {
    use HazardCategory as C;
    use Severity as S;
    match (category, severity) {
        (C::Wind, S::Danger) => "Dangerous winds: paddling is not advised",
        (C::Wind, S::Warning) => "Strong winds: expect hard work and drift off course",
        (C::Wind, _) => "Breezy conditions: stay close to shore",
        (C::WaterState, S::Danger) => "Hazardous water: large waves or strong currents",
        (C::WaterState, S::Warning) => "Rough water: waves and chop likely",
        (C::WaterState, _) => "Choppy water possible",
        (C::Cold, S::Danger) => "Extreme cold: immersion could be life-threatening",
        (C::Cold, S::Warning) => "Cold conditions: wear a wetsuit or drysuit",
        (C::Cold, _) => "Cool conditions: dress for immersion",
        (C::HeatUv, S::Danger) => "Extreme heat: high risk of heat illness",
        (C::HeatUv, S::Warning) => "High heat or UV: hydrate and cover up",
        (C::HeatUv, _) => "Strong sun: use sun protection",
        (C::Visibility, S::Danger) => "Very poor visibility: navigation is hazardous",
        (C::Visibility, S::Warning) => "Poor visibility: stay near shore and carry a light",
        (C::Visibility, _) => "Reduced visibility",
        (C::Combined, _) => "Multiple hazards present: use extra caution",
        (C::Other, _) => "Additional hazard reported",
    }
}

/// One standardized, severity-flagged explanation line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub severity: Severity,
    pub category: HazardCategory,
    pub message: String,
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity.label(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub band: SkillBand,
    pub explanations: Vec<Explanation>,
}

fn explain(warning: &str) -> Explanation {
    let severity = Severity::of(warning);
    let category = categorize(warning);
    let message = match category {
        // Keep the original text so unknown hazards are never lost
        HazardCategory::Other => format!("{}: {}", phrase(category, severity), warning.trim()),
        _ => phrase(category, severity).to_string(),
    };
    Explanation {
        severity,
        category,
        message,
    }
}

/// Band a rating and explain each warning, in input order
pub fn classify<S: AsRef<str>>(rating: f64, warnings: &[S]) -> Classification {
    let mut explanations: Vec<Explanation> =
        warnings.iter().map(|w| explain(w.as_ref())).collect();

    if scoring::warning_deduction(warnings) >= MULTIPLE_HAZARDS_THRESHOLD {
        explanations.push(Explanation {
            severity: Severity::Warning,
            category: HazardCategory::Combined,
            message: phrase(HazardCategory::Combined, Severity::Warning).to_string(),
        });
    }

    Classification {
        band: SkillBand::from_rating(rating),
        explanations,
    }
}

/// Score and classify one hour for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourAssessment {
    pub rating: f64,
    pub band: SkillBand,
    pub explanations: Vec<Explanation>,
}

pub fn assess_hour(condition: &HourlyCondition) -> HourAssessment {
    let rating = scoring::score(&ScoreInput::from(condition), &condition.warnings);
    let Classification { band, explanations } = classify(rating, &condition.warnings);
    HourAssessment {
        rating,
        band,
        explanations,
    }
}
