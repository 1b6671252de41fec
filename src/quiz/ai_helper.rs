use std::time::Duration;

use chatgpt::client::ChatGPT;
use chatgpt::config::ChatGPTEngine;
use chatgpt::types::{ChatMessage, CompletionResponse, Role};
use log::{debug, warn};
use thiserror::Error;

use crate::quiz::session::CompletionEvent;
use crate::quiz::Quiz;

const SYSTEM_PROMPT: &str = "You are FitScan's medical AI assistant. Give clear, concise answers (3-4 sentences max). Avoid long paragraphs. Always include a disclaimer.";

pub const DISCLAIMER: &str = "💡 Disclaimer: This is AI-generated health information. Always consult a qualified doctor for medical advice.";

pub const UNAVAILABLE_REPLY: &str = "Sorry, the AI is temporarily unavailable. Please try again later.";

const EMERGENCY_NOTICE: &str = "🚨 Chest pain or shortness of breath can be a medical emergency. If the symptoms are severe or sudden, call your local emergency number now and do not drive yourself to the hospital.";

const EMERGENCY_KEYWORDS: [&str; 2] = ["chest pain", "shortness of breath"];

/// Turns of earlier conversation sent along with a new message.
const HISTORY_WINDOW: usize = 3;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("assistant is not configured")]
    Disabled,
    #[error("completion request failed: {0}")]
    ChatGPT(#[from] chatgpt::err::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatTurn {
    pub is_user: bool,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            is_user: true,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            is_user: false,
            text: text.into(),
        }
    }
}

pub struct HealthAssistant {
    chat_gpt: Option<ChatGPT>,
}

impl HealthAssistant {
    pub fn new(chat_gpt: ChatGPT) -> Self {
        Self {
            chat_gpt: Some(chat_gpt),
        }
    }

    /// An assistant that always fails, used when no API key is configured.
    pub fn disabled() -> Self {
        Self { chat_gpt: None }
    }

    pub fn connect(api_key: &str, timeout: Duration) -> Result<Self, AssistantError> {
        let mut gpt = ChatGPT::new(api_key)?;

        gpt.config.engine = ChatGPTEngine::Gpt35Turbo;
        gpt.config.timeout = timeout;
        gpt.config.temperature = 0.5;
        gpt.config.top_p = 0.9;

        Ok(Self::new(gpt))
    }

    pub fn is_enabled(&self) -> bool {
        self.chat_gpt.is_some()
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AssistantError> {
        let chat_gpt = self.chat_gpt.as_ref().ok_or(AssistantError::Disabled)?;
        let response: CompletionResponse = chat_gpt.send_history(&messages).await?;
        let content = response.message().clone().content;

        debug!("Completion: {:?}", content);

        Ok(content)
    }

    /// Answers a free-form health question given the earlier conversation.
    pub async fn reply(&self, message: &str, history: &[ChatTurn]) -> Result<String, AssistantError> {
        debug!("Generating reply to: {:?}", message);
        let content = self.complete(build_messages(message, history)).await?;
        Ok(finish_reply(message, &content))
    }

    /// Like `reply`, but never fails: errors turn into a canned apology.
    pub async fn reply_or_fallback(&self, message: &str, history: &[ChatTurn]) -> String {
        match self.reply(message, history).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!("Assistant reply failed: {}", err);
                finish_reply(message, UNAVAILABLE_REPLY)
            }
        }
    }

    /// A few sentences putting a finished assessment into context.
    pub async fn explain_result(&self, quiz: &Quiz, event: &CompletionEvent) -> Result<String, AssistantError> {
        debug!("Generating explanation for {}", event.quiz_id());
        let prompt = result_prompt(quiz, event);
        let content = self
            .complete(vec![
                ChatMessage {
                    role: Role::System,
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: prompt,
                },
            ])
            .await?;
        Ok(format!("{}\n\n{}", content.trim(), DISCLAIMER))
    }
}

/// Records a question and its reply, keeping only the turns that would be sent next time.
pub fn push_exchange(history: &mut Vec<ChatTurn>, message: &str, reply: &str) {
    history.push(ChatTurn::user(message));
    history.push(ChatTurn::assistant(reply));
    let excess = history.len().saturating_sub(HISTORY_WINDOW);
    history.drain(..excess);
}

fn build_messages(message: &str, history: &[ChatTurn]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage {
        role: Role::System,
        content: SYSTEM_PROMPT.to_string(),
    }];

    let skip = history.len().saturating_sub(HISTORY_WINDOW);
    messages.extend(history.iter().skip(skip).map(|turn| ChatMessage {
        role: if turn.is_user { Role::User } else { Role::Assistant },
        content: turn.text.clone(),
    }));

    messages.push(ChatMessage {
        role: Role::User,
        content: message.to_string(),
    });
    messages
}

fn mentions_emergency(message: &str) -> bool {
    let message = message.to_lowercase();
    EMERGENCY_KEYWORDS.iter().any(|k| message.contains(k))
}

fn finish_reply(message: &str, content: &str) -> String {
    let mut reply = String::new();
    if mentions_emergency(message) {
        reply.push_str(EMERGENCY_NOTICE);
        reply.push_str("\n\n");
    }
    reply.push_str(content.trim());
    reply.push_str("\n\n");
    reply.push_str(DISCLAIMER);
    reply
}

fn result_prompt(quiz: &Quiz, event: &CompletionEvent) -> String {
    let answers = quiz
        .questions
        .iter()
        .filter_map(|q| {
            let answer = event.answers().get(&q.id)?;
            let option = q.options.get(answer.option_index)?;
            Some(format!("- {} {}", q.prompt, option))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "A user just completed the \"{}\" self-assessment.
        Their score is {} out of {}, which is {} risk: \"{}\".
        Their answers were:
        {}
        In 3-4 sentences, explain what this result means and suggest the most useful next steps.",
        quiz.title,
        event.total_score(),
        event.max_score(),
        event.tier(),
        quiz.risk_level(event.tier()).message,
        answers
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::catalog::Catalog;
    use crate::quiz::session::{AssessmentSession, Step};

    fn roles(messages: &[ChatMessage]) -> Vec<&str> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
                _ => "other",
            })
            .collect()
    }

    #[test]
    fn test_only_recent_history_is_sent() {
        let history = vec![
            ChatTurn::user("first"),
            ChatTurn::assistant("second"),
            ChatTurn::user("third"),
            ChatTurn::assistant("fourth"),
        ];
        let messages = build_messages("fifth", &history);
        assert_eq!(roles(&messages), vec!["system", "assistant", "user", "assistant", "user"]);
        assert_eq!(messages[1].content, "second");
        assert_eq!(messages[4].content, "fifth");
    }

    #[test]
    fn test_push_exchange_keeps_recent_turns() {
        let mut history = Vec::new();
        push_exchange(&mut history, "one", "two");
        assert_eq!(history.len(), 2);
        push_exchange(&mut history, "three", "four");
        assert_eq!(
            history,
            vec![ChatTurn::assistant("two"), ChatTurn::user("three"), ChatTurn::assistant("four")]
        );
    }

    #[test]
    fn test_reply_always_ends_with_disclaimer() {
        let reply = finish_reply("how much water should I drink?", "  About two litres a day.  ");
        assert!(reply.starts_with("About two litres a day."));
        assert!(reply.ends_with(DISCLAIMER));
    }

    #[test]
    fn test_emergency_keywords_prepend_notice() {
        let reply = finish_reply("I have CHEST PAIN since this morning", "Please seek care.");
        assert!(reply.starts_with(EMERGENCY_NOTICE));
        assert!(!finish_reply("I have a headache", "Rest.").contains(EMERGENCY_NOTICE));
    }

    #[test]
    fn test_result_prompt_lists_answers() {
        let catalog = Catalog::builtin().unwrap();
        let quiz = catalog.get("liver-health").unwrap();
        let mut session = AssessmentSession::start(quiz.clone()).unwrap();
        let event = loop {
            session.select_option(0).unwrap();
            if let Step::Completed(event) = session.advance().unwrap() {
                break event;
            }
        };
        let prompt = result_prompt(quiz, &event);
        assert!(prompt.contains("Liver Health Assessment"));
        assert!(prompt.contains("score is 0 out of 26, which is low risk"));
        assert!(prompt.contains("- How often do you consume alcohol? Never"));
    }

    #[tokio::test]
    async fn test_disabled_assistant_fails_closed() {
        let assistant = HealthAssistant::disabled();
        assert!(!assistant.is_enabled());
        assert!(matches!(assistant.reply("hello", &[]).await, Err(AssistantError::Disabled)));

        let reply = assistant.reply_or_fallback("hello", &[]).await;
        assert!(reply.starts_with(UNAVAILABLE_REPLY));
        assert!(reply.ends_with(DISCLAIMER));
    }
}
