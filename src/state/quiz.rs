use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::{
    models::{NewQuizEntity, QuestionEntity, QuizEntity},
    storage::StorageError,
};

/// Opaque numeric identifier of a chat user.
pub type UserId = i64;
/// Identifier of the chat where messages for a user are delivered.
pub type ChatId = i64;
/// Identifier assigned by the store to a persisted quiz.
pub type QuizId = Uuid;

/// Maximum number of options a question may carry (chat quiz polls allow 2 to 10).
pub const MAX_OPTIONS: usize = 10;
/// Minimum number of options a question must carry.
pub const MIN_OPTIONS: usize = 2;
/// Maximum length (in characters) of a question text.
pub const MAX_QUESTION_CHARS: usize = 300;
/// Maximum length (in characters) of a single option.
pub const MAX_OPTION_CHARS: usize = 100;
/// Maximum length (in characters) of a quiz title.
pub const MAX_TITLE_CHARS: usize = 200;

/// Multiple-choice question. Immutable once authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Prompt displayed to the player.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// Position of the correct option inside `options`.
    pub correct_index: usize,
}

impl Question {
    /// Build a question, returning `None` when the correct index does not point at an option
    /// or fewer than [`MIN_OPTIONS`] options are given.
    pub fn new(text: String, options: Vec<String>, correct_index: usize) -> Option<Self> {
        if options.len() < MIN_OPTIONS || correct_index >= options.len() {
            return None;
        }
        Some(Self {
            text,
            options,
            correct_index,
        })
    }

    /// Text of the option marked as correct.
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }
}

/// Quiz loaded from the store, owned by exactly one author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub id: QuizId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub created_at: SystemTime,
}

/// Quiz assembled by the authoring flow, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
}

impl TryFrom<QuestionEntity> for Question {
    type Error = String;

    fn try_from(value: QuestionEntity) -> Result<Self, Self::Error> {
        let (options, correct_index) = (value.options.len(), value.correct_index);
        Question::new(value.text, value.options, value.correct_index).ok_or_else(|| {
            format!("correct index {correct_index} does not fit {options} option(s)")
        })
    }
}

impl From<Question> for QuestionEntity {
    fn from(value: Question) -> Self {
        Self {
            text: value.text,
            options: value.options,
            correct_index: value.correct_index,
        }
    }
}

/// Stored quizzes are checked again on load; a question breaking the option rules marks
/// the whole document as corrupted.
impl TryFrom<QuizEntity> for Quiz {
    type Error = StorageError;

    fn try_from(value: QuizEntity) -> Result<Self, Self::Error> {
        let id = value.id;
        let questions = value
            .questions
            .into_iter()
            .enumerate()
            .map(|(position, question)| {
                Question::try_from(question).map_err(|reason| StorageError::Corrupted {
                    id: id.to_string(),
                    reason: format!("question {}: {reason}", position + 1),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id,
            owner_id: value.owner_id,
            title: value.title,
            description: value.description,
            questions,
            created_at: value.created_at,
        })
    }
}

impl From<QuizDraft> for NewQuizEntity {
    fn from(value: QuizDraft) -> Self {
        Self {
            owner_id: value.owner_id,
            title: value.title,
            description: value.description,
            questions: value.questions.into_iter().map(Into::into).collect(),
        }
    }
}
