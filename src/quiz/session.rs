use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::quiz::error::{CatalogError, SessionError};
use crate::quiz::scoring::{classify, score};
use crate::quiz::{Question, Quiz, RiskTier};

/// A committed answer. The option index is kept next to the score so that going back
/// recalls the exact option, even when two options are worth the same points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Answer {
    pub option_index: usize,
    pub score: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Position {
    AtQuestion(usize),
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Moved on to the question at this index.
    Next(usize),
    Completed(CompletionEvent),
}

/// One user's attempt at a quiz.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssessmentSession {
    quiz: Quiz,
    position: Position,
    pending: Option<usize>,
    answers: BTreeMap<String, Answer>,
}

impl AssessmentSession {
    pub fn start(quiz: Quiz) -> Result<Self, CatalogError> {
        if quiz.questions.is_empty() {
            return Err(CatalogError::NoQuestions { quiz_id: quiz.id });
        }
        debug!("Starting assessment {}", quiz.id);
        Ok(Self {
            quiz,
            position: Position::AtQuestion(0),
            pending: None,
            answers: BTreeMap::new(),
        })
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn quiz_id(&self) -> &str {
        &self.quiz.id
    }

    pub fn is_completed(&self) -> bool {
        self.position == Position::Completed
    }

    /// Index of the question being shown; the last index once completed.
    pub fn current_index(&self) -> usize {
        match self.position {
            Position::AtQuestion(index) => index,
            Position::Completed => self.quiz.questions.len().saturating_sub(1),
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.position {
            Position::AtQuestion(index) => self.quiz.question(index),
            Position::Completed => None,
        }
    }

    pub fn pending(&self) -> Option<usize> {
        self.pending
    }

    pub fn answers(&self) -> &BTreeMap<String, Answer> {
        &self.answers
    }

    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn progress_percent(&self) -> f64 {
        match self.position {
            Position::AtQuestion(index) => (index + 1) as f64 / self.question_count() as f64 * 100.0,
            Position::Completed => 100.0,
        }
    }

    pub fn total_score(&self) -> i64 {
        score(self.answers.values().map(|a| a.score))
    }

    fn active_index(&self) -> Result<usize, SessionError> {
        match self.position {
            Position::AtQuestion(index) => Ok(index),
            Position::Completed => Err(SessionError::AlreadyCompleted),
        }
    }

    /// Stages an option for the current question without committing it.
    pub fn select_option(&mut self, option_index: usize) -> Result<(), SessionError> {
        let index = self.active_index()?;
        let len = question_at(&self.quiz, index)?.options.len();
        if option_index >= len {
            return Err(SessionError::OptionOutOfRange {
                index: option_index,
                len,
            });
        }
        self.pending = Some(option_index);
        Ok(())
    }

    /// Commits the pending option and moves forward. Answering the last question
    /// completes the assessment. On error the session is left untouched.
    pub fn advance(&mut self) -> Result<Step, SessionError> {
        let index = self.active_index()?;
        let question = question_at(&self.quiz, index)?;
        let option_index = self.pending.ok_or(SessionError::MustSelectFirst)?;
        let points = *question
            .scores
            .get(option_index)
            .ok_or(SessionError::OptionOutOfRange {
                index: option_index,
                len: question.scores.len(),
            })?;
        let answer = Answer {
            option_index,
            score: points,
        };

        if index + 1 < self.question_count() {
            self.answers.insert(question.id.clone(), answer);
            self.position = Position::AtQuestion(index + 1);
            self.pending = None;
            debug!("Assessment {} moved to question {}", self.quiz.id, index + 1);
            return Ok(Step::Next(index + 1));
        }

        let mut answers = self.answers.clone();
        answers.insert(question.id.clone(), answer);
        let total_score = score(answers.values().map(|a| a.score));
        let tier = classify(&self.quiz, total_score)?;

        self.answers = answers;
        self.position = Position::Completed;
        self.pending = None;

        let event = CompletionEvent::new(&self.quiz, self.answers.clone(), total_score, tier);
        info!(
            "Assessment {} completed with score {}/{} ({})",
            event.quiz_id, event.total_score, event.max_score, event.tier
        );
        Ok(Step::Completed(event))
    }

    /// Goes back one question and restores the option committed there.
    pub fn retreat(&mut self) -> Result<usize, SessionError> {
        let index = self.active_index()?;
        if index == 0 {
            return Err(SessionError::AtFirstQuestion);
        }
        question_at(&self.quiz, index)?;
        let previous = index - 1;
        let question_id = &question_at(&self.quiz, previous)?.id;
        self.pending = self.answers.get(question_id).map(|a| a.option_index);
        self.position = Position::AtQuestion(previous);
        debug!("Assessment {} moved back to question {}", self.quiz.id, previous);
        Ok(previous)
    }

    /// Discards every answer and returns to the first question.
    pub fn reset(&mut self) {
        self.position = Position::AtQuestion(0);
        self.pending = None;
        self.answers.clear();
        debug!("Assessment {} reset", self.quiz.id);
    }
}

/// Sessions come back from the dialogue store without passing through `start`,
/// so positions are checked on every use.
fn question_at(quiz: &Quiz, index: usize) -> Result<&Question, SessionError> {
    quiz.questions.get(index).ok_or(SessionError::QuestionMissing {
        index,
        len: quiz.questions.len(),
    })
}

/// The outcome of a finished assessment. Read-only once emitted.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompletionEvent {
    quiz_id: String,
    total_score: i64,
    max_score: i64,
    tier: RiskTier,
    answers: BTreeMap<String, Answer>,
    answer_keys: BTreeMap<String, String>,
    completed_at: DateTime<Utc>,
}

impl CompletionEvent {
    fn new(quiz: &Quiz, answers: BTreeMap<String, Answer>, total_score: i64, tier: RiskTier) -> Self {
        let answer_keys = quiz
            .questions
            .iter()
            .filter_map(|q| {
                let answer = answers.get(&q.id)?;
                let key = q.option_key(answer.option_index)?;
                Some((q.id.clone(), key.to_string()))
            })
            .collect();
        Self {
            quiz_id: quiz.id.clone(),
            total_score,
            max_score: quiz.max_score(),
            tier,
            answers,
            answer_keys,
            completed_at: Utc::now(),
        }
    }

    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    pub fn total_score(&self) -> i64 {
        self.total_score
    }

    pub fn max_score(&self) -> i64 {
        self.max_score
    }

    pub fn tier(&self) -> RiskTier {
        self.tier
    }

    pub fn answers(&self) -> &BTreeMap<String, Answer> {
        &self.answers
    }

    /// Question id to the key (or label) of the chosen option.
    pub fn answer_keys(&self) -> &BTreeMap<String, String> {
        &self.answer_keys
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
