pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{NewQuizEntity, QuizEntity, QuizSummaryEntity, ResultEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

pub use memory::InMemoryQuizStore;

/// Abstraction over the persistence layer for quizzes and play results.
///
/// A fetch returns either a complete quiz or nothing; no transactional coordination is
/// expected from implementations.
pub trait QuizStore: Send + Sync {
    /// Persist a new quiz and return the identifier assigned to it.
    fn create_quiz(&self, quiz: NewQuizEntity) -> BoxFuture<'static, StorageResult<Uuid>>;
    /// List the quizzes authored by `owner_id`, oldest first.
    fn list_quizzes_by_owner(
        &self,
        owner_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizSummaryEntity>>>;
    fn find_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    fn save_result(&self, result: ResultEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Best results recorded for a quiz, ordered for display.
    fn top_results(
        &self,
        quiz_id: Uuid,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ResultEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
