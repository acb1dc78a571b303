//! Conversational front: routes commands and button presses to the authoring flow and
//! the play engine, and renders their results through the transport.

use tracing::{info, warn};

use crate::{
    dto::chat::{Button, CallbackAction, Keyboard},
    error::ServiceError,
    services::{
        authoring_service::{self, AuthoringReply},
        play_service::{self, PlayError},
        transport::OutboundQuestion,
    },
    state::{
        SharedState,
        authoring::{AuthoringError, AuthoringInput, AuthoringPrompt},
        quiz::{ChatId, QuizId, UserId},
        shuffle::ShuffleMode,
    },
};

const WELCOME: &str = "This bot will help you create a quiz with multiple choice questions.";

/// Handle a text message or command. Returns whether it applied to anything.
pub async fn handle_message(
    state: &SharedState,
    chat_id: ChatId,
    user_id: UserId,
    text: &str,
) -> Result<bool, ServiceError> {
    let result = match text.trim() {
        "/start" => send_welcome(state, chat_id).await.map(|()| true),
        "/skip" => author(state, chat_id, user_id, AuthoringInput::Skip).await,
        "/cancel" => cancel(state, chat_id, user_id).await,
        command if command.starts_with('/') => Ok(false),
        _ => author(state, chat_id, user_id, AuthoringInput::Text(text.to_owned())).await,
    };
    notify_failure(state, chat_id, result).await
}

/// Handle an inline button press.
pub async fn handle_callback(
    state: &SharedState,
    chat_id: ChatId,
    user_id: UserId,
    data: &str,
) -> Result<bool, ServiceError> {
    let action = data
        .parse::<CallbackAction>()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let result = match action {
        CallbackAction::CreateQuiz => author(state, chat_id, user_id, AuthoringInput::Begin).await,
        CallbackAction::ViewQuizzes => view_quizzes(state, chat_id, user_id).await,
        CallbackAction::AddOption => {
            author(state, chat_id, user_id, AuthoringInput::AddOption).await
        }
        CallbackAction::DoneOptions => {
            author(state, chat_id, user_id, AuthoringInput::DoneOptions).await
        }
        CallbackAction::Correct(index) => {
            author(state, chat_id, user_id, AuthoringInput::CorrectOption(index)).await
        }
        CallbackAction::NewQuestion => {
            author(state, chat_id, user_id, AuthoringInput::AnotherQuestion).await
        }
        CallbackAction::FinishQuiz => author(state, chat_id, user_id, AuthoringInput::Finish).await,
        CallbackAction::Play(quiz_id) => offer_shuffle_modes(state, chat_id, quiz_id).await,
        CallbackAction::Shuffle(quiz_id, mode) => {
            choose_shuffle(state, chat_id, user_id, quiz_id, mode).await
        }
        CallbackAction::Timer(secs) => choose_timer(state, user_id, secs).await,
    };
    notify_failure(state, chat_id, result).await
}

async fn send_welcome(state: &SharedState, chat_id: ChatId) -> Result<(), ServiceError> {
    let keyboard = Keyboard::column([
        Button::new("🆕 Create New Quiz", &CallbackAction::CreateQuiz),
        Button::new("📚 View My Quizzes", &CallbackAction::ViewQuizzes),
    ]);
    state
        .transport()
        .emit_prompt(chat_id, WELCOME.to_string(), keyboard)
        .await?;
    Ok(())
}

async fn cancel(state: &SharedState, chat_id: ChatId, user_id: UserId) -> Result<bool, ServiceError> {
    let authoring = authoring_service::handle_input(state, user_id, AuthoringInput::Cancel).await?;
    let playing = play_service::abandon(state, user_id).await;

    let text = match (authoring == AuthoringReply::Cancelled, playing) {
        (_, true) => "⏹️ Quiz stopped. No score was recorded.",
        (true, false) => "Quiz creation cancelled.",
        (false, false) => return Ok(false),
    };
    state.transport().emit_text(chat_id, text.to_string()).await?;
    Ok(true)
}

async fn author(
    state: &SharedState,
    chat_id: ChatId,
    user_id: UserId,
    input: AuthoringInput,
) -> Result<bool, ServiceError> {
    let reply = authoring_service::handle_input(state, user_id, input).await?;
    let transport = state.transport();

    match reply {
        AuthoringReply::Ignored => return Ok(false),
        AuthoringReply::Prompt(AuthoringPrompt::QuestionAdded { question }) => {
            let preview = OutboundQuestion {
                text: question.text.clone(),
                options: question.options.clone(),
                correct_index: question.correct_index,
                open_period_secs: None,
            };
            // Preview tokens are never registered, so answering a preview scores nothing.
            if let Err(err) = transport.emit_question(chat_id, preview).await {
                warn!(user_id, error = %err, "failed to send question preview");
            }
            let keyboard = Keyboard::column([
                Button::new("➕ Add Another Question", &CallbackAction::NewQuestion),
                Button::new("✅ Finish Quiz", &CallbackAction::FinishQuiz),
            ]);
            transport
                .emit_prompt(chat_id, "Question added! What next?".to_string(), keyboard)
                .await?;
        }
        AuthoringReply::Prompt(AuthoringPrompt::OptionOrDone) => {
            let keyboard = Keyboard::column([
                Button::new("➕ Add More Option", &CallbackAction::AddOption),
                Button::new("✅ Done", &CallbackAction::DoneOptions),
            ]);
            transport
                .emit_prompt(chat_id, "Option saved. Choose next action:".to_string(), keyboard)
                .await?;
        }
        AuthoringReply::Prompt(AuthoringPrompt::CorrectOption { options }) => {
            let keyboard = Keyboard::column(
                options
                    .into_iter()
                    .enumerate()
                    .map(|(index, option)| Button::new(option, &CallbackAction::Correct(index))),
            );
            transport
                .emit_prompt(chat_id, "Which one is the correct option?".to_string(), keyboard)
                .await?;
        }
        AuthoringReply::Prompt(prompt) => {
            let text = match prompt {
                AuthoringPrompt::Title => "Send the title of your quiz.".to_string(),
                AuthoringPrompt::Description => {
                    "Send the description of your quiz or type /skip.".to_string()
                }
                AuthoringPrompt::FirstQuestion => "Send the first question.".to_string(),
                AuthoringPrompt::NextQuestion => "Send the next question.".to_string(),
                AuthoringPrompt::Option { number } => format!("Send option {number}:"),
                // rendered with a keyboard above
                AuthoringPrompt::OptionOrDone
                | AuthoringPrompt::CorrectOption { .. }
                | AuthoringPrompt::QuestionAdded { .. } => return Ok(true),
            };
            transport.emit_text(chat_id, text).await?;
        }
        AuthoringReply::Saved { quiz_id, draft } => {
            let keyboard = Keyboard::column([Button::new(
                "▶️ Play now",
                &CallbackAction::Play(quiz_id),
            )]);
            transport
                .emit_prompt(
                    chat_id,
                    format!(
                        "✅ Quiz \"{}\" saved with {} question(s)!",
                        draft.title,
                        draft.questions.len()
                    ),
                    keyboard,
                )
                .await?;
        }
        AuthoringReply::Cancelled => {
            transport
                .emit_text(chat_id, "Quiz creation cancelled.".to_string())
                .await?;
        }
    }

    Ok(true)
}

async fn view_quizzes(
    state: &SharedState,
    chat_id: ChatId,
    user_id: UserId,
) -> Result<bool, ServiceError> {
    let store = state.require_quiz_store().await?;
    let quizzes = store.list_quizzes_by_owner(user_id).await?;

    if quizzes.is_empty() {
        state
            .transport()
            .emit_text(chat_id, "❌ You have no saved quizzes.".to_string())
            .await?;
        return Ok(true);
    }

    let keyboard = Keyboard::column(quizzes.into_iter().map(|quiz| {
        Button::new(format!("▶️ {}", quiz.title), &CallbackAction::Play(quiz.id))
    }));
    state
        .transport()
        .emit_prompt(chat_id, "📚 Your quizzes:".to_string(), keyboard)
        .await?;
    Ok(true)
}

async fn offer_shuffle_modes(
    state: &SharedState,
    chat_id: ChatId,
    quiz_id: QuizId,
) -> Result<bool, ServiceError> {
    let keyboard = Keyboard::column(
        ShuffleMode::ALL
            .into_iter()
            .map(|mode| Button::new(mode.label(), &CallbackAction::Shuffle(quiz_id, mode))),
    );
    state
        .transport()
        .emit_prompt(chat_id, "How should the quiz be shuffled?".to_string(), keyboard)
        .await?;
    Ok(true)
}

async fn choose_shuffle(
    state: &SharedState,
    chat_id: ChatId,
    user_id: UserId,
    quiz_id: QuizId,
    mode: ShuffleMode,
) -> Result<bool, ServiceError> {
    let selected = play_service::select_quiz(state, user_id, chat_id, quiz_id, mode).await?;

    let keyboard = Keyboard::row(
        state
            .config()
            .timer_choices_secs
            .iter()
            .map(|secs| Button::new(format!("{secs}s"), &CallbackAction::Timer(*secs))),
    );
    state
        .transport()
        .emit_prompt(
            chat_id,
            format!(
                "\"{}\" has {} question(s). Select time per question:",
                selected.title, selected.question_count
            ),
            keyboard,
        )
        .await?;
    Ok(true)
}

async fn choose_timer(state: &SharedState, user_id: UserId, secs: u64) -> Result<bool, ServiceError> {
    play_service::select_timer(state, user_id, secs)?;
    let running = play_service::start(state, user_id).await?;
    info!(
        user_id,
        session_id = %running.session_id,
        "quiz started from chat"
    );
    Ok(true)
}

/// Tell the user why their input failed, then hand the error back to the caller.
async fn notify_failure(
    state: &SharedState,
    chat_id: ChatId,
    result: Result<bool, ServiceError>,
) -> Result<bool, ServiceError> {
    let err = match result {
        Ok(handled) => return Ok(handled),
        Err(err) => err,
    };

    let text = match &err {
        ServiceError::Authoring(AuthoringError::Validation(issue)) => {
            format!("⚠️ {issue}. Please try again.")
        }
        ServiceError::Play(PlayError::QuizNotFound(_)) => "❌ Quiz not found!".to_string(),
        ServiceError::Play(PlayError::EmptyQuiz(_)) => {
            "❌ This quiz has no questions to play.".to_string()
        }
        ServiceError::Play(PlayError::TimerNotAllowed { .. }) => {
            "⚠️ Please pick one of the offered timers.".to_string()
        }
        ServiceError::Play(_) => "⚠️ Pick a quiz to play first.".to_string(),
        ServiceError::Unavailable(_) | ServiceError::Degraded => {
            "⚠️ Storage is unavailable right now, please retry later.".to_string()
        }
        ServiceError::InvalidInput(_) | ServiceError::NotFound(_) | ServiceError::Transport(_) => {
            return Err(err);
        }
    };

    if let Err(send_err) = state.transport().emit_text(chat_id, text).await {
        warn!(chat_id, error = %send_err, "failed to report error to chat");
    }
    Err(err)
}
