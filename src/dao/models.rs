use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Question stored inside a quiz document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Prompt displayed to the player.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// Position of the correct option inside `options`.
    pub correct_index: usize,
}

/// Quiz payload handed to the store on creation; the store assigns the identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewQuizEntity {
    /// Author of the quiz.
    pub owner_id: i64,
    /// Non-empty quiz title.
    pub title: String,
    /// Optional description (empty when skipped).
    pub description: String,
    /// Non-empty ordered list of questions.
    pub questions: Vec<QuestionEntity>,
}

/// Aggregate quiz entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizEntity {
    /// Primary key of the quiz.
    pub id: Uuid,
    /// Author of the quiz.
    pub owner_id: i64,
    /// Non-empty quiz title.
    pub title: String,
    /// Optional description (empty when skipped).
    pub description: String,
    /// Ordered list of questions.
    pub questions: Vec<QuestionEntity>,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Quiz list item entity (subset of QuizEntity) returned when listing by owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizSummaryEntity {
    /// Primary key of the quiz.
    pub id: Uuid,
    /// Non-empty quiz title.
    pub title: String,
    /// Number of questions in the quiz.
    pub question_count: usize,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Outcome of one finished play-through, used to build leaderboards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultEntity {
    /// Primary key of the result.
    pub id: Uuid,
    /// Quiz that was played.
    pub quiz_id: Uuid,
    /// Player.
    pub user_id: i64,
    pub correct: u32,
    pub wrong: u32,
    pub missed: u32,
    pub total: u32,
    /// When the session was finalized.
    pub finished_at: SystemTime,
}

impl NewQuizEntity {
    /// Materialise the entity once the store has assigned an identifier.
    pub fn into_entity(self, id: Uuid, created_at: SystemTime) -> QuizEntity {
        QuizEntity {
            id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            questions: self.questions,
            created_at,
        }
    }
}

impl From<&QuizEntity> for QuizSummaryEntity {
    fn from(entity: &QuizEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title.clone(),
            question_count: entity.questions.len(),
            created_at: entity.created_at,
        }
    }
}

/// Order results for a leaderboard: most correct answers first, earliest finish breaks ties.
pub fn leaderboard_order(a: &ResultEntity, b: &ResultEntity) -> std::cmp::Ordering {
    b.correct
        .cmp(&a.correct)
        .then_with(|| a.finished_at.cmp(&b.finished_at))
}
