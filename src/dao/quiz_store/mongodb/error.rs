use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save quiz `{id}`")]
    SaveQuiz {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load quiz `{id}`")]
    LoadQuiz {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list quizzes of owner {owner_id}")]
    ListQuizzes {
        owner_id: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to save result `{id}`")]
    SaveResult {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load results of quiz `{quiz_id}`")]
    LoadResults {
        quiz_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("document `{id}` is corrupted: {reason}")]
    CorruptedDocument { id: String, reason: String },
}
