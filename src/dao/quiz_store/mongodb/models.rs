use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{QuestionEntity, QuizEntity, QuizSummaryEntity, ResultEntity};

use super::error::MongoDaoError;

/// Quiz document stored in the `quizzes` collection. Identifiers are kept as hyphenated
/// strings so documents stay readable from the mongo shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuizDocument {
    #[serde(rename = "_id")]
    id: String,
    owner_id: i64,
    title: String,
    #[serde(default)]
    description: String,
    questions: Vec<QuestionEntity>,
    created_at: DateTime,
}

/// Result document stored in the `results` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoResultDocument {
    #[serde(rename = "_id")]
    id: String,
    quiz_id: String,
    user_id: i64,
    correct: u32,
    wrong: u32,
    missed: u32,
    total: u32,
    finished_at: DateTime,
}

impl From<QuizEntity> for MongoQuizDocument {
    fn from(value: QuizEntity) -> Self {
        Self {
            id: value.id.to_string(),
            owner_id: value.owner_id,
            title: value.title,
            description: value.description,
            questions: value.questions,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoQuizDocument> for QuizEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoQuizDocument) -> Result<Self, Self::Error> {
        let id = parse_id(&value.id)?;
        Ok(Self {
            id,
            owner_id: value.owner_id,
            title: value.title,
            description: value.description,
            questions: value.questions,
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl TryFrom<MongoQuizDocument> for QuizSummaryEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoQuizDocument) -> Result<Self, Self::Error> {
        let entity = QuizEntity::try_from(value)?;
        Ok((&entity).into())
    }
}

impl From<ResultEntity> for MongoResultDocument {
    fn from(value: ResultEntity) -> Self {
        Self {
            id: value.id.to_string(),
            quiz_id: value.quiz_id.to_string(),
            user_id: value.user_id,
            correct: value.correct,
            wrong: value.wrong,
            missed: value.missed,
            total: value.total,
            finished_at: DateTime::from_system_time(value.finished_at),
        }
    }
}

impl TryFrom<MongoResultDocument> for ResultEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoResultDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&value.id)?,
            quiz_id: parse_id(&value.quiz_id)?,
            user_id: value.user_id,
            correct: value.correct,
            wrong: value.wrong,
            missed: value.missed,
            total: value.total,
            finished_at: value.finished_at.to_system_time(),
        })
    }
}

fn parse_id(raw: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::CorruptedDocument {
        id: raw.to_owned(),
        reason: err.to_string(),
    })
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}
