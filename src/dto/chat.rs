use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::validation::{validate_callback_data, validate_not_blank},
    state::{quiz::QuizId, shuffle::ShuffleMode},
};

/// Text or command typed by a user in a chat.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct InboundMessage {
    pub user_id: i64,
    #[validate(length(max = 4096), custom(function = "validate_not_blank"))]
    pub text: String,
}

/// Inline button pressed by a user.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct InboundCallback {
    pub user_id: i64,
    #[validate(custom(function = "validate_callback_data"))]
    pub data: String,
}

/// Answer to a previously emitted question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    #[validate(length(min = 1, max = 64))]
    pub token: String,
    pub option_index: usize,
}

/// Whether an answer contributed to a score.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    pub counted: bool,
}

/// Acknowledgement for inbound chat updates.
#[derive(Debug, Serialize, ToSchema)]
pub struct DispatchResponse {
    /// `false` when the update did not apply to the user's current conversation.
    pub handled: bool,
}

/// Inline button attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Button {
    pub label: String,
    /// Payload posted back to `/chats/{chat_id}/callbacks` when pressed.
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: &CallbackAction) -> Self {
        Self {
            label: label.into(),
            data: action.to_string(),
        }
    }
}

/// Rows of inline buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// One button per row.
    pub fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|button| vec![button]).collect(),
        }
    }

    /// All buttons on a single row.
    pub fn row(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: vec![buttons.into_iter().collect()],
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// Button payloads understood by the chat service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    CreateQuiz,
    ViewQuizzes,
    AddOption,
    DoneOptions,
    Correct(usize),
    NewQuestion,
    FinishQuiz,
    Play(QuizId),
    Shuffle(QuizId, ShuffleMode),
    Timer(u64),
}

/// Returned for button payloads that do not match any [`CallbackAction`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown callback `{0}`")]
pub struct UnknownCallback(pub String);

impl FromStr for CallbackAction {
    type Err = UnknownCallback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownCallback(s.to_owned());

        let action = match s {
            "create_quiz" => Self::CreateQuiz,
            "view_quizzes" => Self::ViewQuizzes,
            "add_option" => Self::AddOption,
            "done_options" => Self::DoneOptions,
            "new_question" => Self::NewQuestion,
            "finish_quiz" => Self::FinishQuiz,
            _ => {
                let (kind, rest) = s.split_once(':').ok_or_else(unknown)?;
                match kind {
                    "correct" => Self::Correct(rest.parse().map_err(|_| unknown())?),
                    "play" => Self::Play(Uuid::parse_str(rest).map_err(|_| unknown())?),
                    "shuffle" => {
                        let (quiz_id, mode) = rest.split_once(':').ok_or_else(unknown)?;
                        Self::Shuffle(
                            Uuid::parse_str(quiz_id).map_err(|_| unknown())?,
                            mode.parse().map_err(|_| unknown())?,
                        )
                    }
                    "timer" => Self::Timer(rest.parse().map_err(|_| unknown())?),
                    _ => return Err(unknown()),
                }
            }
        };

        Ok(action)
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateQuiz => f.write_str("create_quiz"),
            Self::ViewQuizzes => f.write_str("view_quizzes"),
            Self::AddOption => f.write_str("add_option"),
            Self::DoneOptions => f.write_str("done_options"),
            Self::Correct(index) => write!(f, "correct:{index}"),
            Self::NewQuestion => f.write_str("new_question"),
            Self::FinishQuiz => f.write_str("finish_quiz"),
            Self::Play(quiz_id) => write!(f, "play:{quiz_id}"),
            Self::Shuffle(quiz_id, mode) => write!(f, "shuffle:{quiz_id}:{mode}"),
            Self::Timer(secs) => write!(f, "timer:{secs}"),
        }
    }
}
