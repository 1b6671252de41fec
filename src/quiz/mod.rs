pub mod ai_helper;
pub mod catalog;
pub mod error;
pub mod life_expectancy;
pub mod scoring;
pub mod session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A health self-assessment: an ordered list of questions plus the table used to
/// turn the final score into a risk tier.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub estimated_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub questions: Vec<Question>,
    pub risk_levels: RiskLevels,
}

impl Quiz {
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Lowest total a user can reach by picking the cheapest option everywhere.
    pub fn min_score(&self) -> i64 {
        self.questions.iter().map(Question::min_score).sum()
    }

    /// Highest total a user can reach by picking the most expensive option everywhere.
    pub fn max_score(&self) -> i64 {
        self.questions.iter().map(Question::max_score).sum()
    }

    pub fn risk_level(&self, tier: RiskTier) -> &RiskLevel {
        self.risk_levels.get(tier)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    pub scores: Vec<i64>,
    pub category: String,
    /// Machine keys parallel to `options`, only needed by the lifestyle factor table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
}

impl Question {
    pub fn min_score(&self) -> i64 {
        self.scores.iter().copied().min().unwrap_or(0)
    }

    pub fn max_score(&self) -> i64 {
        self.scores.iter().copied().max().unwrap_or(0)
    }

    pub fn option_index(&self, label: &str) -> Option<usize> {
        self.options.iter().position(|o| o == label)
    }

    /// The key of an option, falling back to its label when the question has no keys.
    pub fn option_key(&self, index: usize) -> Option<&str> {
        match &self.keys {
            Some(keys) => keys.get(index).map(String::as_str),
            None => self.options.get(index).map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Tiers in ascending order of severity.
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    pub fn name(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RiskLevels {
    pub low: RiskLevel,
    pub medium: RiskLevel,
    pub high: RiskLevel,
}

impl RiskLevels {
    pub fn get(&self, tier: RiskTier) -> &RiskLevel {
        match tier {
            RiskTier::Low => &self.low,
            RiskTier::Medium => &self.medium,
            RiskTier::High => &self.high,
        }
    }

    /// Tiers with their levels, in ascending order of severity.
    pub fn iter(&self) -> impl Iterator<Item = (RiskTier, &RiskLevel)> {
        RiskTier::ALL.into_iter().map(move |tier| (tier, self.get(tier)))
    }

    pub fn ranges(&self) -> [(i64, i64); 3] {
        RiskTier::ALL.map(|tier| {
            let level = self.get(tier);
            (level.min, level.max)
        })
    }
}

/// Inclusive score range of a tier, with the text shown to the user.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RiskLevel {
    pub min: i64,
    pub max: i64,
    pub message: String,
    /// Display hint, opaque to the engine.
    pub color: String,
}

impl RiskLevel {
    pub fn contains(&self, score: i64) -> bool {
        (self.min..=self.max).contains(&score)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn question(id: &str, scores: &[i64]) -> Question {
        Question {
            id: id.to_string(),
            prompt: format!("Question {id}?"),
            options: scores.iter().map(|s| format!("Option worth {s}")).collect(),
            scores: scores.to_vec(),
            category: "test".to_string(),
            keys: None,
        }
    }

    pub fn level(min: i64, max: i64, message: &str) -> RiskLevel {
        RiskLevel {
            min,
            max,
            message: message.to_string(),
            color: "text-gray-600".to_string(),
        }
    }

    /// Three questions worth 0..=2 each, tiers 0-2 / 3-4 / 5-6.
    pub fn small_quiz() -> Quiz {
        Quiz {
            id: "small".to_string(),
            title: "Small Quiz".to_string(),
            description: "A quiz for tests".to_string(),
            category: "Testing".to_string(),
            difficulty: Difficulty::Easy,
            estimated_time: "1 minute".to_string(),
            icon: None,
            questions: vec![
                question("q1", &[0, 1, 2]),
                question("q2", &[0, 1, 2]),
                question("q3", &[0, 1, 2]),
            ],
            risk_levels: RiskLevels {
                low: level(0, 2, "Low"),
                medium: level(3, 4, "Medium"),
                high: level(5, 6, "High"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_score_bounds() {
        let mut quiz = small_quiz();
        quiz.questions.push(question("q4", &[1, 0, 1, 2, 3]));
        assert_eq!(quiz.min_score(), 0);
        assert_eq!(quiz.max_score(), 9);
    }

    #[test]
    fn test_option_key_falls_back_to_label() {
        let mut q = question("smoking_habits", &[0, 2, 4]);
        assert_eq!(q.option_key(1), Some("Option worth 2"));
        q.keys = Some(vec!["never".into(), "light".into(), "heavy".into()]);
        assert_eq!(q.option_key(2), Some("heavy"));
        assert_eq!(q.option_key(3), None);
    }

    #[test]
    fn test_tiers_are_ordered_by_severity() {
        assert!(RiskTier::Low < RiskTier::Medium);
        assert!(RiskTier::Medium < RiskTier::High);
        assert_eq!(RiskTier::High.to_string(), "high");
    }

    #[test]
    fn test_risk_levels_follow_severity_order() {
        let quiz = small_quiz();
        let tiers: Vec<_> = quiz.risk_levels.iter().map(|(tier, level)| (tier, level.message.as_str())).collect();
        assert_eq!(
            tiers,
            vec![(RiskTier::Low, "Low"), (RiskTier::Medium, "Medium"), (RiskTier::High, "High")]
        );
        assert_eq!(quiz.risk_levels.ranges(), [(0, 2), (3, 4), (5, 6)]);
        assert_eq!(quiz.risk_level(RiskTier::Medium).min, 3);
    }
}
