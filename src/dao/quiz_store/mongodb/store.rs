use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoQuizDocument, MongoResultDocument, doc_id},
};
use crate::dao::{
    models::{NewQuizEntity, QuizEntity, QuizSummaryEntity, ResultEntity},
    quiz_store::QuizStore,
    storage::StorageResult,
};

const QUIZ_COLLECTION_NAME: &str = "quizzes";
const RESULT_COLLECTION_NAME: &str = "results";

/// MongoDB-backed [`QuizStore`] implementation.
#[derive(Clone)]
pub struct MongoQuizStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = establish_connection(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoQuizStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = establish_connection(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let owner_index = mongodb::IndexModel::builder()
            .keys(doc! {"owner_id": 1, "created_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("quiz_owner_idx".to_owned()))
                    .build(),
            )
            .build();

        self.quiz_collection()
            .await
            .create_index(owner_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUIZ_COLLECTION_NAME,
                index: "owner_id,created_at",
                source,
            })?;

        let leaderboard_index = mongodb::IndexModel::builder()
            .keys(doc! {"quiz_id": 1, "correct": -1, "finished_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("result_leaderboard_idx".to_owned()))
                    .build(),
            )
            .build();

        self.result_collection()
            .await
            .create_index(leaderboard_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: RESULT_COLLECTION_NAME,
                index: "quiz_id,correct,finished_at",
                source,
            })?;

        Ok(())
    }

    async fn quiz_collection(&self) -> Collection<MongoQuizDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoQuizDocument>(QUIZ_COLLECTION_NAME)
    }

    async fn result_collection(&self) -> Collection<MongoResultDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoResultDocument>(RESULT_COLLECTION_NAME)
    }

    async fn create_quiz(&self, quiz: NewQuizEntity) -> MongoResult<Uuid> {
        let id = Uuid::new_v4();
        let document: MongoQuizDocument = quiz.into_entity(id, SystemTime::now()).into();

        self.quiz_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveQuiz { id, source })?;

        debug!(quiz_id = %id, "quiz document inserted");
        Ok(id)
    }

    async fn list_quizzes_by_owner(&self, owner_id: i64) -> MongoResult<Vec<QuizSummaryEntity>> {
        let documents: Vec<MongoQuizDocument> = self
            .quiz_collection()
            .await
            .find(doc! {"owner_id": owner_id})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListQuizzes { owner_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListQuizzes { owner_id, source })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_quiz(&self, id: Uuid) -> MongoResult<Option<QuizEntity>> {
        let document = self
            .quiz_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadQuiz { id, source })?;

        document.map(TryInto::try_into).transpose()
    }

    async fn save_result(&self, result: ResultEntity) -> MongoResult<()> {
        let id = result.id;
        let document: MongoResultDocument = result.into();

        self.result_collection()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveResult { id, source })?;

        Ok(())
    }

    async fn top_results(&self, quiz_id: Uuid, limit: usize) -> MongoResult<Vec<ResultEntity>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let documents: Vec<MongoResultDocument> = self
            .result_collection()
            .await
            .find(doc! {"quiz_id": quiz_id.to_string()})
            .sort(doc! {"correct": -1, "finished_at": 1})
            .limit(limit)
            .await
            .map_err(|source| MongoDaoError::LoadResults { quiz_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadResults { quiz_id, source })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }
}

impl QuizStore for MongoQuizStore {
    fn create_quiz(&self, quiz: NewQuizEntity) -> BoxFuture<'static, StorageResult<Uuid>> {
        let store = self.clone();
        Box::pin(async move { store.create_quiz(quiz).await.map_err(Into::into) })
    }

    fn list_quizzes_by_owner(
        &self,
        owner_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizSummaryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_quizzes_by_owner(owner_id)
                .await
                .map_err(Into::into)
        })
    }

    fn find_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_quiz(id).await.map_err(Into::into) })
    }

    fn save_result(&self, result: ResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_result(result).await.map_err(Into::into) })
    }

    fn top_results(
        &self,
        quiz_id: Uuid,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ResultEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.top_results(quiz_id, limit).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
