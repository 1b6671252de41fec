use std::sync::Arc;

use dotenv::dotenv;
use fitscan::bot::{self, MenuChoice, QuizAction, MENU, MUST_SELECT_FIRST_TEXT};
use fitscan::config::Config;
use fitscan::quiz::ai_helper::{push_exchange, AssistantError, ChatTurn, HealthAssistant};
use fitscan::quiz::catalog::Catalog;
use fitscan::quiz::error::SessionError;
use fitscan::quiz::life_expectancy::{project_completion, Sex, LIFESTYLE_QUIZ_ID};
use fitscan::quiz::session::{AssessmentSession, CompletionEvent, Step};
use log::{debug, error, info, warn};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatAction, KeyboardRemove, ParseMode},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveMenuChoice,
    TakingQuiz {
        session: AssessmentSession,
    },
    Chat {
        history: Vec<ChatTurn>,
    },
    ReceiveAge {
        completion: CompletionEvent,
    },
    ReceiveSex {
        completion: CompletionEvent,
        age: u32,
    },
}

type DialogueStorage = Arc<ErasedStorage<State>>;

const GREETING_TEXT: &str = "👋 Welcome to FitScan!\n\nTake a short self-assessment to estimate your health risk, or ask the assistant a question.\n\nThese quizzes are not a diagnosis. Always consult a qualified doctor.";

#[tokio::main]
async fn main() -> HandlerResult {
    let dotenv_result = dotenv();
    pretty_env_logger::init();
    if let Err(err) = dotenv_result {
        debug!("No .env file loaded: {}", err);
    }
    info!("Starting health assessment bot...");

    let config = Config::from_env()?;

    let catalog = Arc::new(Catalog::load(config.quiz_catalog_path.as_deref())?);
    info!("Loaded {} quizzes", catalog.quizzes().len());

    let assistant = match &config.chatgpt_api_key {
        Some(key) => HealthAssistant::connect(key, config.chatgpt_timeout)?,
        None => {
            warn!("CHATGPT_API_KEY is not set, the assistant is disabled");
            HealthAssistant::disabled()
        }
    };
    let assistant = Arc::new(assistant);

    let bot = Bot::from_env();

    info!("Opening dialogue storage at {}", config.dialogue_db_path);
    let storage: DialogueStorage = SqliteStorage::open(&config.dialogue_db_path, Json).await?.erase();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveMenuChoice].endpoint(receive_menu_choice))
            .branch(dptree::case![State::TakingQuiz { session }].endpoint(taking_quiz))
            .branch(dptree::case![State::Chat { history }].endpoint(chat))
            .branch(dptree::case![State::ReceiveAge { completion }].endpoint(receive_age))
            .branch(dptree::case![State::ReceiveSex { completion, age }].endpoint(receive_sex)),
    )
    .dependencies(dptree::deps![storage, catalog, assistant])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

async fn show_menu(bot: &Bot, chat_id: ChatId, dialogue: &QuizDialogue, catalog: &Catalog) -> HandlerResult {
    bot.send_message(chat_id, "What would you like to do?")
        .reply_markup(bot::main_menu(catalog))
        .await?;
    dialogue.update(State::ReceiveMenuChoice).await?;
    Ok(())
}

async fn send_question(bot: &Bot, chat_id: ChatId, session: &AssessmentSession) -> HandlerResult {
    bot.send_message(chat_id, bot::question_text(session))
        .parse_mode(ParseMode::Html)
        .reply_markup(bot::question_keyboard(session))
        .await?;
    Ok(())
}

async fn start(bot: Bot, dialogue: QuizDialogue, catalog: Arc<Catalog>, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;
    show_menu(&bot, msg.chat.id, &dialogue, &catalog).await
}

async fn receive_menu_choice(bot: Bot, dialogue: QuizDialogue, catalog: Arc<Catalog>, msg: Message) -> HandlerResult {
    let choice = msg
        .text()
        .map(|text| MenuChoice::parse(text, &catalog))
        .unwrap_or(MenuChoice::Unknown);

    match choice {
        MenuChoice::Quiz(id) => {
            let quiz = catalog.get(&id)?.clone();
            let session = AssessmentSession::start(quiz)?;
            info!("Chat {} started {}", msg.chat.id, id);

            bot.send_message(msg.chat.id, bot::quiz_intro_text(session.quiz()))
                .parse_mode(ParseMode::Html)
                .await?;
            send_question(&bot, msg.chat.id, &session).await?;
            dialogue.update(State::TakingQuiz { session }).await?;
        }
        MenuChoice::Assistant => {
            bot.send_message(msg.chat.id, "Ask me anything about your health. Press the menu button to go back.")
                .reply_markup(bot::chat_keyboard())
                .await?;
            dialogue.update(State::Chat { history: Vec::new() }).await?;
        }
        MenuChoice::Unknown => {
            bot.send_message(msg.chat.id, "Please choose one of the options below")
                .reply_markup(bot::main_menu(&catalog))
                .await?;
        }
    }

    Ok(())
}

async fn taking_quiz(
    bot: Bot,
    dialogue: QuizDialogue,
    session: AssessmentSession,
    catalog: Arc<Catalog>,
    assistant: Arc<HealthAssistant>,
    msg: Message,
) -> HandlerResult {
    let mut session = session;

    let Some(question) = session.current_question() else {
        warn!("Chat {} had a finished session in progress", msg.chat.id);
        return show_menu(&bot, msg.chat.id, &dialogue, &catalog).await;
    };

    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please choose one of the options below")
            .reply_markup(bot::question_keyboard(&session))
            .await?;
        return Ok(());
    };

    let outcome = match QuizAction::parse(text, question) {
        QuizAction::Menu => return show_menu(&bot, msg.chat.id, &dialogue, &catalog).await,
        QuizAction::Unknown => {
            bot.send_message(msg.chat.id, "Please choose one of the options below")
                .reply_markup(bot::question_keyboard(&session))
                .await?;
            return Ok(());
        }
        QuizAction::Restart => {
            session.reset();
            Ok(None)
        }
        QuizAction::Previous => session.retreat().map(|_| None),
        QuizAction::Next => session.advance().map(Some),
        QuizAction::Choose(index) => session.select_option(index).and_then(|()| session.advance()).map(Some),
    };

    match outcome {
        Ok(Some(Step::Completed(event))) => {
            finish_quiz(&bot, msg.chat.id, &dialogue, &session, &catalog, &assistant, event).await?;
        }
        Ok(_) => {
            send_question(&bot, msg.chat.id, &session).await?;
            dialogue.update(State::TakingQuiz { session }).await?;
        }
        Err(SessionError::MustSelectFirst) => {
            bot.send_message(msg.chat.id, MUST_SELECT_FIRST_TEXT)
                .reply_markup(bot::question_keyboard(&session))
                .await?;
        }
        Err(err) if err.is_contract_violation() => {
            error!("Chat {}: {}", msg.chat.id, err);
            send_question(&bot, msg.chat.id, &session).await?;
        }
        Err(err) => {
            error!("Chat {} could not finish {}: {}", msg.chat.id, session.quiz_id(), err);
            bot.send_message(msg.chat.id, "Sorry, this assessment can't be scored right now.")
                .await?;
            show_menu(&bot, msg.chat.id, &dialogue, &catalog).await?;
        }
    }

    Ok(())
}

async fn finish_quiz(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &QuizDialogue,
    session: &AssessmentSession,
    catalog: &Catalog,
    assistant: &HealthAssistant,
    event: CompletionEvent,
) -> HandlerResult {
    let quiz = session.quiz();

    bot.send_message(chat_id, bot::result_text(quiz, &event))
        .parse_mode(ParseMode::Html)
        .reply_markup(KeyboardRemove::new())
        .await?;

    if assistant.is_enabled() {
        bot.send_chat_action(chat_id, ChatAction::Typing).await?;
    }
    match assistant.explain_result(quiz, &event).await {
        Ok(explanation) => {
            bot.send_message(chat_id, explanation).await?;
        }
        Err(AssistantError::Disabled) => {}
        Err(err) => warn!("Could not explain {} result: {}", event.quiz_id(), err),
    }

    if event.quiz_id() == LIFESTYLE_QUIZ_ID {
        bot.send_message(chat_id, "🔮 Want a life expectancy estimate? How old are you?")
            .await?;
        dialogue.update(State::ReceiveAge { completion: event }).await?;
        return Ok(());
    }

    show_menu(bot, chat_id, dialogue, catalog).await
}

async fn chat(
    bot: Bot,
    dialogue: QuizDialogue,
    history: Vec<ChatTurn>,
    catalog: Arc<Catalog>,
    assistant: Arc<HealthAssistant>,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send your question as text")
            .reply_markup(bot::chat_keyboard())
            .await?;
        return Ok(());
    };

    if text == MENU {
        return show_menu(&bot, msg.chat.id, &dialogue, &catalog).await;
    }

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;
    let reply = assistant.reply_or_fallback(text, &history).await;

    bot.send_message(msg.chat.id, reply.as_str())
        .reply_markup(bot::chat_keyboard())
        .await?;

    let mut history = history;
    push_exchange(&mut history, text, &reply);
    dialogue.update(State::Chat { history }).await?;

    Ok(())
}

async fn receive_age(bot: Bot, dialogue: QuizDialogue, completion: CompletionEvent, msg: Message) -> HandlerResult {
    match msg.text().and_then(bot::parse_age) {
        Some(age) => {
            bot.send_message(msg.chat.id, "And your sex?")
                .reply_markup(bot::sex_keyboard())
                .await?;
            dialogue.update(State::ReceiveSex { completion, age }).await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Please enter your age as a number between 1 and 120")
                .await?;
        }
    }

    Ok(())
}

async fn receive_sex(
    bot: Bot,
    dialogue: QuizDialogue,
    (completion, age): (CompletionEvent, u32),
    catalog: Arc<Catalog>,
    msg: Message,
) -> HandlerResult {
    let Some(sex) = msg.text().and_then(Sex::parse) else {
        bot.send_message(msg.chat.id, "Please choose one of the options below")
            .reply_markup(bot::sex_keyboard())
            .await?;
        return Ok(());
    };

    let projection = project_completion(&completion, age, sex);
    debug!("Projection for chat {}: {:?}", msg.chat.id, projection);

    bot.send_message(msg.chat.id, bot::life_expectancy_text(&projection))
        .parse_mode(ParseMode::Html)
        .await?;

    show_menu(&bot, msg.chat.id, &dialogue, &catalog).await
}
