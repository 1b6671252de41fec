use std::collections::HashSet;
use std::path::Path;

use log::{debug, warn};

use crate::quiz::error::CatalogError;
use crate::quiz::{Quiz, RiskTier};

const BUILTIN_CATALOG: &str = include_str!("../../catalog/health_quizzes.yaml");

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    quizzes: Vec<Quiz>,
}

/// Read-only collection of quizzes, validated once when loaded.
#[derive(Debug, Clone)]
pub struct Catalog {
    quizzes: Vec<Quiz>,
}

impl Catalog {
    /// The catalog shipped with the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Loads `path` when given, the builtin catalog otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::builtin(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        debug!("Loading quiz catalog from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        Self::new(file.quizzes)
    }

    pub fn new(quizzes: Vec<Quiz>) -> Result<Self, CatalogError> {
        if quizzes.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for quiz in &quizzes {
            if !seen.insert(quiz.id.as_str()) {
                return Err(CatalogError::DuplicateQuiz {
                    id: quiz.id.clone(),
                });
            }
            validate(quiz)?;
        }
        debug!("Loaded {} quizzes", quizzes.len());
        Ok(Self { quizzes })
    }

    pub fn get(&self, id: &str) -> Result<&Quiz, CatalogError> {
        self.quizzes
            .iter()
            .find(|q| q.id == id)
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })
    }

    pub fn get_by_title(&self, title: &str) -> Option<&Quiz> {
        self.quizzes.iter().find(|q| q.title == title)
    }

    pub fn quizzes(&self) -> &[Quiz] {
        &self.quizzes
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.quizzes.iter().map(|q| q.id.as_str())
    }
}

/// Checks the structural invariants of a single quiz.
pub fn validate(quiz: &Quiz) -> Result<(), CatalogError> {
    let quiz_id = || quiz.id.clone();

    if quiz.questions.is_empty() {
        return Err(CatalogError::NoQuestions { quiz_id: quiz_id() });
    }

    let mut question_ids = HashSet::new();
    for question in &quiz.questions {
        if !question_ids.insert(question.id.as_str()) {
            return Err(CatalogError::DuplicateQuestion {
                quiz_id: quiz_id(),
                question_id: question.id.clone(),
            });
        }
        if question.options.len() < 2 {
            return Err(CatalogError::TooFewOptions {
                quiz_id: quiz_id(),
                question_id: question.id.clone(),
                options: question.options.len(),
            });
        }
        if question.options.len() != question.scores.len() {
            return Err(CatalogError::ScoreCountMismatch {
                quiz_id: quiz_id(),
                question_id: question.id.clone(),
                options: question.options.len(),
                scores: question.scores.len(),
            });
        }
        if let Some(keys) = &question.keys {
            if keys.len() != question.options.len() {
                return Err(CatalogError::KeyCountMismatch {
                    quiz_id: quiz_id(),
                    question_id: question.id.clone(),
                    options: question.options.len(),
                    keys: keys.len(),
                });
            }
        }
    }

    for (tier, level) in quiz.risk_levels.iter() {
        if level.min > level.max {
            return Err(CatalogError::EmptyTier {
                quiz_id: quiz_id(),
                tier,
                min: level.min,
                max: level.max,
            });
        }
    }

    let levels = &quiz.risk_levels;
    for (lower, upper) in [(RiskTier::Low, RiskTier::Medium), (RiskTier::Medium, RiskTier::High)] {
        let (lower_max, upper_min) = (quiz.risk_level(lower).max, quiz.risk_level(upper).min);
        if lower_max + 1 != upper_min {
            return Err(CatalogError::TierGap {
                quiz_id: quiz_id(),
                lower,
                lower_max,
                upper,
                upper_min,
            });
        }
    }

    let (min_score, max_score) = (quiz.min_score(), quiz.max_score());
    if levels.low.min > min_score || levels.high.max < max_score {
        return Err(CatalogError::Uncovered {
            quiz_id: quiz_id(),
            low_min: levels.low.min,
            high_max: levels.high.max,
            min_score,
            max_score,
        });
    }
    if levels.low.min != min_score || levels.high.max != max_score {
        warn!(
            "Quiz {}: tiers span [{}, {}] but achievable scores are [{}, {}]",
            quiz.id, levels.low.min, levels.high.max, min_score, max_score
        );
    }

    Ok(())
}
