//! Life expectancy projection layered on top of a finished lifestyle assessment.
//!
//! The projection starts from a baseline by sex and moves it by a bounded amount
//! proportional to how far the risk percentage is from a 30% reference point.
//! Specific answers are reported as named lifestyle factors next to it.

use std::collections::BTreeMap;

use crate::quiz::session::CompletionEvent;

/// The catalog quiz whose answers feed the projection.
pub const LIFESTYLE_QUIZ_ID: &str = "lifestyle-longevity";

const MALE_BASELINE: f64 = 70.8;
const FEMALE_BASELINE: f64 = 74.2;

const REFERENCE_RISK_PERCENT: f64 = 30.0;
const YEARS_PER_RISK_PERCENT: f64 = 0.4;
const MIN_ADJUSTMENT: f64 = -15.0;
const MAX_ADJUSTMENT: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn baseline(&self) -> f64 {
        match self {
            Sex::Male => MALE_BASELINE,
            Sex::Female => FEMALE_BASELINE,
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "male" | "m" | "man" => Some(Sex::Male),
            "female" | "f" | "woman" => Some(Sex::Female),
            _ => None,
        }
    }
}

/// A named habit and the years it adds or takes away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifestyleFactor {
    pub question_id: &'static str,
    pub answer_key: &'static str,
    pub label: &'static str,
    pub years: f64,
}

pub const LIFESTYLE_FACTORS: &[LifestyleFactor] = &[
    LifestyleFactor {
        question_id: "smoking_habits",
        answer_key: "heavy",
        label: "🚬 Heavy smoking",
        years: -6.2,
    },
    LifestyleFactor {
        question_id: "smoking_habits",
        answer_key: "light",
        label: "🚬 Light smoking",
        years: -2.8,
    },
    LifestyleFactor {
        question_id: "exercise_frequency",
        answer_key: "rarely",
        label: "🏃 Lack of exercise",
        years: -4.1,
    },
    LifestyleFactor {
        question_id: "exercise_frequency",
        answer_key: "daily",
        label: "💪 Regular exercise",
        years: 3.2,
    },
    LifestyleFactor {
        question_id: "sleep_hours",
        answer_key: "very_less",
        label: "😴 Severe sleep deprivation",
        years: -3.5,
    },
    LifestyleFactor {
        question_id: "sleep_hours",
        answer_key: "less",
        label: "😴 Poor sleep",
        years: -1.8,
    },
    LifestyleFactor {
        question_id: "diet_quality",
        answer_key: "very_poor",
        label: "🍔 Very poor diet",
        years: -3.9,
    },
    LifestyleFactor {
        question_id: "diet_quality",
        answer_key: "excellent",
        label: "🥗 Excellent diet",
        years: 2.7,
    },
    LifestyleFactor {
        question_id: "stress_levels",
        answer_key: "very_high",
        label: "😰 Very high stress",
        years: -2.4,
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct LifeExpectancy {
    pub baseline: f64,
    pub risk_percent: f64,
    pub adjustment: f64,
    pub predicted_age: f64,
    pub remaining_years: f64,
    pub difference: f64,
    pub days_remaining: i64,
    pub weeks_remaining: i64,
    pub impacts: Vec<LifestyleFactor>,
}

impl LifeExpectancy {
    pub fn impact_total(&self) -> f64 {
        round1(self.impacts.iter().map(|i| i.years).sum())
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn risk_percent(total_score: i64, max_score: i64) -> f64 {
    if max_score <= 0 {
        return 0.0;
    }
    total_score as f64 / max_score as f64 * 100.0
}

pub fn risk_adjustment(risk_percent: f64) -> f64 {
    ((REFERENCE_RISK_PERCENT - risk_percent) * YEARS_PER_RISK_PERCENT).clamp(MIN_ADJUSTMENT, MAX_ADJUSTMENT)
}

/// Factors whose answer matches, in table order.
pub fn lifestyle_impacts(answer_keys: &BTreeMap<String, String>) -> Vec<LifestyleFactor> {
    LIFESTYLE_FACTORS
        .iter()
        .filter(|f| answer_keys.get(f.question_id).map(String::as_str) == Some(f.answer_key))
        .copied()
        .collect()
}

pub fn project(total_score: i64, max_score: i64, age: u32, sex: Sex, answer_keys: &BTreeMap<String, String>) -> LifeExpectancy {
    let baseline = sex.baseline();
    let risk_percent = risk_percent(total_score, max_score);
    let adjustment = risk_adjustment(risk_percent);
    let predicted_age = baseline + adjustment;
    let remaining_years = (predicted_age - f64::from(age)).max(0.0);

    LifeExpectancy {
        baseline,
        risk_percent,
        adjustment,
        predicted_age: round1(predicted_age),
        remaining_years: round1(remaining_years),
        difference: round1(predicted_age - baseline),
        days_remaining: (remaining_years * 365.0).round() as i64,
        weeks_remaining: (remaining_years * 52.0).round() as i64,
        impacts: lifestyle_impacts(answer_keys),
    }
}

pub fn project_completion(event: &CompletionEvent, age: u32, sex: Sex) -> LifeExpectancy {
    project(event.total_score(), event.max_score(), age, sex, event.answer_keys())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(q, k)| (q.to_string(), k.to_string())).collect()
    }

    #[test]
    fn test_adjustment_is_bounded() {
        assert_eq!(risk_adjustment(0.0), 8.0);
        assert_eq!(risk_adjustment(100.0), -15.0);
        assert!((risk_adjustment(30.0)).abs() < 1e-9);
        assert!((risk_adjustment(50.0) + 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_max_score_is_zero_risk() {
        assert_eq!(risk_percent(5, 0), 0.0);
    }

    #[test]
    fn test_projection_for_healthy_female() {
        let projection = project(0, 17, 30, Sex::Female, &BTreeMap::new());
        assert_eq!(projection.predicted_age, 82.2);
        assert_eq!(projection.remaining_years, 52.2);
        assert_eq!(projection.difference, 8.0);
        assert_eq!(projection.days_remaining, 19053);
        assert_eq!(projection.weeks_remaining, 2714);
    }

    #[test]
    fn test_remaining_years_never_negative() {
        let projection = project(17, 17, 90, Sex::Male, &BTreeMap::new());
        assert_eq!(projection.predicted_age, 55.8);
        assert_eq!(projection.remaining_years, 0.0);
        assert_eq!(projection.days_remaining, 0);
    }

    #[test]
    fn test_all_matching_factors_are_reported() {
        let answers = keys(&[
            ("smoking_habits", "heavy"),
            ("exercise_frequency", "daily"),
            ("sleep_hours", "normal"),
            ("stress_levels", "very_high"),
        ]);
        let projection = project(8, 17, 40, Sex::Male, &answers);
        let labels: Vec<_> = projection.impacts.iter().map(|i| i.label).collect();
        assert_eq!(labels, vec!["🚬 Heavy smoking", "💪 Regular exercise", "😰 Very high stress"]);
        assert_eq!(projection.impact_total(), -5.4);
    }

    #[test]
    fn test_one_factor_per_category() {
        for question_id in ["smoking_habits", "exercise_frequency", "sleep_hours", "diet_quality", "stress_levels"] {
            let tiers: Vec<_> = LIFESTYLE_FACTORS.iter().filter(|f| f.question_id == question_id).collect();
            for key in tiers.iter().map(|f| f.answer_key) {
                let impacts = lifestyle_impacts(&keys(&[(question_id, key)]));
                assert_eq!(impacts.len(), 1);
            }
        }
    }

    #[test]
    fn test_parse_sex() {
        assert_eq!(Sex::parse(" Female "), Some(Sex::Female));
        assert_eq!(Sex::parse("M"), Some(Sex::Male));
        assert_eq!(Sex::parse("other"), None);
    }
}
