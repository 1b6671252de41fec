use thiserror::Error;

use crate::quiz::RiskTier;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("quiz not found: {id}")]
    NotFound { id: String },
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("catalog is empty")]
    Empty,
    #[error("duplicate quiz id: {id}")]
    DuplicateQuiz { id: String },
    #[error("quiz {quiz_id} has no questions")]
    NoQuestions { quiz_id: String },
    #[error("quiz {quiz_id}: duplicate question id {question_id}")]
    DuplicateQuestion { quiz_id: String, question_id: String },
    #[error("quiz {quiz_id}: question {question_id} needs at least 2 options, has {options}")]
    TooFewOptions {
        quiz_id: String,
        question_id: String,
        options: usize,
    },
    #[error("quiz {quiz_id}: question {question_id} has {options} options but {scores} scores")]
    ScoreCountMismatch {
        quiz_id: String,
        question_id: String,
        options: usize,
        scores: usize,
    },
    #[error("quiz {quiz_id}: question {question_id} has {options} options but {keys} keys")]
    KeyCountMismatch {
        quiz_id: String,
        question_id: String,
        options: usize,
        keys: usize,
    },
    #[error("quiz {quiz_id}: {tier} tier range [{min}, {max}] is empty")]
    EmptyTier {
        quiz_id: String,
        tier: RiskTier,
        min: i64,
        max: i64,
    },
    #[error("quiz {quiz_id}: {lower} tier ends at {lower_max} but {upper} tier starts at {upper_min}")]
    TierGap {
        quiz_id: String,
        lower: RiskTier,
        lower_max: i64,
        upper: RiskTier,
        upper_min: i64,
    },
    #[error("quiz {quiz_id}: tiers cover [{low_min}, {high_max}] but achievable scores are [{min_score}, {max_score}]")]
    Uncovered {
        quiz_id: String,
        low_min: i64,
        high_max: i64,
        min_score: i64,
        max_score: i64,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("score {score} of quiz {quiz_id} falls outside every risk tier {ranges:?}")]
pub struct ClassifyError {
    pub quiz_id: String,
    pub score: i64,
    pub ranges: [(i64, i64); 3],
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("select an answer to continue")]
    MustSelectFirst,
    #[error("option {index} out of range, question has {len} options")]
    OptionOutOfRange { index: usize, len: usize },
    #[error("already at the first question")]
    AtFirstQuestion,
    #[error("assessment already completed")]
    AlreadyCompleted,
    #[error("no question at index {index}, quiz has {len}")]
    QuestionMissing { index: usize, len: usize },
    #[error(transparent)]
    Unclassifiable(#[from] ClassifyError),
}

impl SessionError {
    /// Errors that can only come from a caller bug, as opposed to user input.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            SessionError::OptionOutOfRange { .. }
                | SessionError::AtFirstQuestion
                | SessionError::AlreadyCompleted
                | SessionError::QuestionMissing { .. }
        )
    }
}
