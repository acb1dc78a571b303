//! Process-local [`QuizStore`] used when no database is configured and by the test suite.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::SystemTime,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{NewQuizEntity, QuizEntity, QuizSummaryEntity, ResultEntity, leaderboard_order},
    quiz_store::QuizStore,
    storage::{StorageError, StorageResult},
};

/// In-memory quiz store. Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct InMemoryQuizStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    quizzes: DashMap<Uuid, QuizEntity>,
    results: DashMap<Uuid, ResultEntity>,
    offline: AtomicBool,
}

impl InMemoryQuizStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every operation fails with [`StorageError::Unavailable`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Insert a fully formed quiz, bypassing creation (fixtures).
    pub fn insert_quiz(&self, quiz: QuizEntity) {
        self.inner.quizzes.insert(quiz.id, quiz);
    }

    /// Snapshot of every stored quiz.
    pub fn quizzes(&self) -> Vec<QuizEntity> {
        self.inner
            .quizzes
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Snapshot of every stored result.
    pub fn results(&self) -> Vec<ResultEntity> {
        self.inner
            .results
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                "in-memory store is offline".into(),
                io::Error::new(io::ErrorKind::NotConnected, "offline"),
            ));
        }
        Ok(())
    }
}

impl QuizStore for InMemoryQuizStore {
    fn create_quiz(&self, quiz: NewQuizEntity) -> BoxFuture<'static, StorageResult<Uuid>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let id = Uuid::new_v4();
            store
                .inner
                .quizzes
                .insert(id, quiz.into_entity(id, SystemTime::now()));
            Ok(id)
        })
    }

    fn list_quizzes_by_owner(
        &self,
        owner_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizSummaryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let mut summaries: Vec<QuizSummaryEntity> = store
                .inner
                .quizzes
                .iter()
                .filter(|entry| entry.owner_id == owner_id)
                .map(|entry| QuizSummaryEntity::from(entry.value()))
                .collect();
            summaries.sort_by_key(|summary| summary.created_at);
            Ok(summaries)
        })
    }

    fn find_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store.inner.quizzes.get(&id).map(|entry| entry.clone()))
        })
    }

    fn save_result(&self, result: ResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            store.inner.results.insert(result.id, result);
            Ok(())
        })
    }

    fn top_results(
        &self,
        quiz_id: Uuid,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ResultEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let mut results: Vec<ResultEntity> = store
                .inner
                .results
                .iter()
                .filter(|entry| entry.quiz_id == quiz_id)
                .map(|entry| entry.value().clone())
                .collect();
            results.sort_by(leaderboard_order);
            results.truncate(limit);
            Ok(results)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dao::models::QuestionEntity;

    fn new_quiz(owner_id: i64, title: &str) -> NewQuizEntity {
        NewQuizEntity {
            owner_id,
            title: title.into(),
            description: String::new(),
            questions: vec![QuestionEntity {
                text: "2 + 2?".into(),
                options: vec!["4".into(), "5".into()],
                correct_index: 0,
            }],
        }
    }

    fn result(quiz_id: Uuid, user_id: i64, correct: u32, finished_secs: u64) -> ResultEntity {
        ResultEntity {
            id: Uuid::new_v4(),
            quiz_id,
            user_id,
            correct,
            wrong: 0,
            missed: 3 - correct,
            total: 3,
            finished_at: SystemTime::UNIX_EPOCH + Duration::from_secs(finished_secs),
        }
    }

    #[tokio::test]
    async fn created_quiz_is_listed_for_its_owner_only() {
        let store = InMemoryQuizStore::new();
        let id = store.create_quiz(new_quiz(7, "Maths")).await.unwrap();
        store.create_quiz(new_quiz(8, "Other")).await.unwrap();

        let listed = store.list_quizzes_by_owner(7).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].question_count, 1);

        let found = store.find_quiz(id).await.unwrap().unwrap();
        assert_eq!(found.title, "Maths");
        assert!(store.find_quiz(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn offline_store_fails_every_operation() {
        let store = InMemoryQuizStore::new();
        store.set_offline(true);
        assert!(store.create_quiz(new_quiz(1, "x")).await.is_err());
        assert!(store.health_check().await.is_err());
        store.set_offline(false);
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn top_results_are_sorted_and_limited() {
        let store = InMemoryQuizStore::new();
        let quiz_id = Uuid::new_v4();
        store.save_result(result(quiz_id, 1, 1, 10)).await.unwrap();
        store.save_result(result(quiz_id, 2, 3, 30)).await.unwrap();
        store.save_result(result(quiz_id, 3, 3, 20)).await.unwrap();
        store.save_result(result(Uuid::new_v4(), 4, 3, 5)).await.unwrap();

        let top = store.top_results(quiz_id, 2).await.unwrap();
        let users: Vec<i64> = top.iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec![3, 2]);
    }
}
