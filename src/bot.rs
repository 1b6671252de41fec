//! Keyboards, reply parsing and message rendering for the Telegram front end.

use teloxide::types::{KeyboardButton, KeyboardMarkup};
use teloxide::utils::html;

use crate::quiz::catalog::Catalog;
use crate::quiz::life_expectancy::LifeExpectancy;
use crate::quiz::session::{AssessmentSession, CompletionEvent};
use crate::quiz::{Question, Quiz, RiskTier};

pub const PREVIOUS: &str = "⬅ Previous";
pub const NEXT: &str = "Next ➡";
pub const RESTART: &str = "🔄 Restart";
pub const MENU: &str = "🏠 Menu";
pub const ASK_ASSISTANT: &str = "💬 Ask the assistant";
pub const MALE: &str = "Male";
pub const FEMALE: &str = "Female";

pub const MUST_SELECT_FIRST_TEXT: &str = "Please select an answer before proceeding.";

const HIGH_RISK_ACTIONS: [&str; 4] = [
    "Schedule an appointment with a healthcare provider",
    "Ask your doctor which tests make sense for you",
    "Cut back on alcohol and tobacco",
    "Maintain a healthy diet and exercise routine",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizAction {
    Choose(usize),
    Next,
    Previous,
    Restart,
    Menu,
    Unknown,
}

impl QuizAction {
    pub fn parse(text: &str, question: &Question) -> Self {
        match text {
            NEXT => QuizAction::Next,
            PREVIOUS => QuizAction::Previous,
            RESTART => QuizAction::Restart,
            MENU => QuizAction::Menu,
            other => match question.option_index(other) {
                Some(index) => QuizAction::Choose(index),
                None => QuizAction::Unknown,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Quiz(String),
    Assistant,
    Unknown,
}

impl MenuChoice {
    pub fn parse(text: &str, catalog: &Catalog) -> Self {
        if text == ASK_ASSISTANT {
            return MenuChoice::Assistant;
        }
        catalog
            .quizzes()
            .iter()
            .find(|q| quiz_button_label(q) == text || q.title == text)
            .map(|q| MenuChoice::Quiz(q.id.clone()))
            .unwrap_or(MenuChoice::Unknown)
    }
}

pub fn quiz_button_label(quiz: &Quiz) -> String {
    match &quiz.icon {
        Some(icon) => format!("{} {}", icon, quiz.title),
        None => quiz.title.clone(),
    }
}

pub fn main_menu(catalog: &Catalog) -> KeyboardMarkup {
    let mut rows: Vec<Vec<KeyboardButton>> = catalog
        .quizzes()
        .iter()
        .map(|q| vec![KeyboardButton::new(quiz_button_label(q))])
        .collect();
    rows.push(vec![KeyboardButton::new(ASK_ASSISTANT)]);
    KeyboardMarkup::new(rows)
}

pub fn question_keyboard(session: &AssessmentSession) -> KeyboardMarkup {
    let mut rows: Vec<Vec<KeyboardButton>> = session
        .current_question()
        .map(|q| q.options.iter().map(|o| vec![KeyboardButton::new(o.clone())]).collect())
        .unwrap_or_default();

    let mut navigation = Vec::new();
    if session.current_index() > 0 {
        navigation.push(KeyboardButton::new(PREVIOUS));
    }
    if session.pending().is_some() {
        navigation.push(KeyboardButton::new(NEXT));
    }
    if !navigation.is_empty() {
        rows.push(navigation);
    }
    rows.push(vec![KeyboardButton::new(RESTART), KeyboardButton::new(MENU)]);
    KeyboardMarkup::new(rows)
}

pub fn chat_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(MENU)]])
}

pub fn sex_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(MALE), KeyboardButton::new(FEMALE)]])
}

pub fn parse_age(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok().filter(|age| (1..=120).contains(age))
}

pub fn quiz_intro_text(quiz: &Quiz) -> String {
    format!(
        "{}\n{}\n\n{} · {:?} · {}",
        html::bold(&html::escape(&quiz_button_label(quiz))),
        html::escape(&quiz.description),
        html::escape(&quiz.category),
        quiz.difficulty,
        html::escape(&quiz.estimated_time),
    )
}

pub fn question_text(session: &AssessmentSession) -> String {
    let Some(question) = session.current_question() else {
        return String::new();
    };
    let mut text = format!(
        "Question {} of {} · {:.0}% complete\n\n{}\n\n{}",
        session.current_index() + 1,
        session.question_count(),
        session.progress_percent(),
        html::bold(&html::escape(&question.prompt)),
        html::italic(&format!("Category: {}", html::escape(&question.category))),
    );
    if let Some(option) = session.pending().and_then(|i| question.options.get(i)) {
        text.push_str(&format!("\n\nYour answer: {}", html::escape(option)));
    }
    text
}

pub fn result_text(quiz: &Quiz, event: &CompletionEvent) -> String {
    let level = quiz.risk_level(event.tier());
    let mut text = format!(
        "{}\n\nScore: {}/{}\nRisk Level: {}\n\n{}",
        html::bold(&html::escape(&format!("{} Results", quiz.title))),
        event.total_score(),
        event.max_score(),
        event.tier().name().to_uppercase(),
        html::escape(&level.message),
    );
    if event.tier() == RiskTier::High {
        text.push_str("\n\n");
        text.push_str(&html::bold("Recommended Actions:"));
        for action in HIGH_RISK_ACTIONS {
            text.push_str(&format!("\n• {}", action));
        }
    }
    text
}

pub fn life_expectancy_text(projection: &LifeExpectancy) -> String {
    let mut text = format!(
        "{}\n\nPredicted age: {} years\nThat's approximately {} more years ({} days, {} weeks).\nAverage for your sex: {} years",
        html::bold("🔮 Your Life Expectancy Prediction"),
        projection.predicted_age,
        projection.remaining_years,
        projection.days_remaining,
        projection.weeks_remaining,
        projection.baseline,
    );
    if projection.difference >= 0.0 {
        text.push_str(&format!("\n🎉 You're living {} years longer than average!", projection.difference.abs()));
    } else {
        text.push_str(&format!("\n⚠️ You could gain {} years with better habits", projection.difference.abs()));
    }
    if !projection.impacts.is_empty() {
        text.push_str("\n\n");
        text.push_str(&html::bold("What's affecting your lifespan:"));
        for impact in &projection.impacts {
            let sign = if impact.years > 0.0 { "+" } else { "" };
            text.push_str(&format!("\n{}: {}{} years", impact.label, sign, impact.years));
        }
    }
    text
}
