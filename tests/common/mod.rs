#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, SystemTime},
};

use futures::future::BoxFuture;
use quiz_bot_back::{
    config::AppConfig,
    dao::{
        models::{NewQuizEntity, QuestionEntity, QuizEntity, QuizSummaryEntity, ResultEntity},
        quiz_store::{InMemoryQuizStore, QuizStore},
        storage::StorageResult,
    },
    dto::chat::Keyboard,
    services::transport::{OutboundQuestion, Transport, TransportError},
    state::{AppState, SharedState, quiz::ChatId, session::SessionReport},
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Everything the bot said, in order.
#[derive(Debug, Clone)]
pub enum Sent {
    Question {
        chat_id: ChatId,
        token: String,
        question: OutboundQuestion,
    },
    Text {
        chat_id: ChatId,
        text: String,
    },
    Prompt {
        chat_id: ChatId,
        text: String,
        keyboard: Keyboard,
    },
    Report {
        chat_id: ChatId,
        text: String,
        report: SessionReport,
    },
}

/// Transport recording outbound traffic on a channel, with deterministic tokens.
pub struct RecordingTransport {
    sent: mpsc::UnboundedSender<Sent>,
    issued: AtomicUsize,
    /// Question emissions from this (0-based) count onwards fail.
    fail_questions_from: Option<usize>,
}

impl RecordingTransport {
    fn push(&self, item: Sent) {
        let _ = self.sent.send(item);
    }
}

impl Transport for RecordingTransport {
    fn emit_question(
        &self,
        chat_id: ChatId,
        question: OutboundQuestion,
    ) -> BoxFuture<'static, Result<String, TransportError>> {
        let issued = self.issued.fetch_add(1, Ordering::SeqCst);
        let result = match self.fail_questions_from {
            Some(limit) if issued >= limit => Err(TransportError::Rejected {
                chat_id,
                reason: "chat unreachable".into(),
            }),
            _ => {
                let token = format!("tok-{issued}");
                self.push(Sent::Question {
                    chat_id,
                    token: token.clone(),
                    question,
                });
                Ok(token)
            }
        };
        Box::pin(async move { result })
    }

    fn emit_text(
        &self,
        chat_id: ChatId,
        text: String,
    ) -> BoxFuture<'static, Result<(), TransportError>> {
        self.push(Sent::Text { chat_id, text });
        Box::pin(async { Ok(()) })
    }

    fn emit_prompt(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: Keyboard,
    ) -> BoxFuture<'static, Result<(), TransportError>> {
        self.push(Sent::Prompt {
            chat_id,
            text,
            keyboard,
        });
        Box::pin(async { Ok(()) })
    }

    fn emit_report(
        &self,
        chat_id: ChatId,
        text: String,
        report: SessionReport,
    ) -> BoxFuture<'static, Result<(), TransportError>> {
        self.push(Sent::Report {
            chat_id,
            text,
            report,
        });
        Box::pin(async { Ok(()) })
    }
}

/// In-memory store whose quiz creation takes `delay` to complete.
#[derive(Clone)]
pub struct SlowSaveStore {
    inner: InMemoryQuizStore,
    delay: Duration,
}

impl QuizStore for SlowSaveStore {
    fn create_quiz(&self, quiz: NewQuizEntity) -> BoxFuture<'static, StorageResult<Uuid>> {
        let write = self.inner.create_quiz(quiz);
        let delay = self.delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            write.await
        })
    }

    fn list_quizzes_by_owner(
        &self,
        owner_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizSummaryEntity>>> {
        self.inner.list_quizzes_by_owner(owner_id)
    }

    fn find_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        self.inner.find_quiz(id)
    }

    fn save_result(&self, result: ResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.save_result(result)
    }

    fn top_results(
        &self,
        quiz_id: Uuid,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ResultEntity>>> {
        self.inner.top_results(quiz_id, limit)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.try_reconnect()
    }
}

pub struct Harness {
    pub state: SharedState,
    pub store: InMemoryQuizStore,
    pub outbox: mpsc::UnboundedReceiver<Sent>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::build(None).await
    }

    /// Harness whose store takes `delay` to persist a new quiz.
    pub async fn with_slow_saves(delay: Duration) -> Self {
        let harness = Self::build(None).await;
        let slow = SlowSaveStore {
            inner: harness.store.clone(),
            delay,
        };
        harness.state.set_quiz_store(Arc::new(slow)).await;
        harness
    }

    /// Harness whose transport rejects every question after the first `limit`.
    pub async fn failing_questions_after(limit: usize) -> Self {
        Self::build(Some(limit)).await
    }

    async fn build(fail_questions_from: Option<usize>) -> Self {
        let (sent, outbox) = mpsc::unbounded_channel();
        let transport = RecordingTransport {
            sent,
            issued: AtomicUsize::new(0),
            fail_questions_from,
        };
        let state = AppState::with_transport(AppConfig::default(), Arc::new(transport));
        let store = InMemoryQuizStore::new();
        state.set_quiz_store(Arc::new(store.clone())).await;
        Self {
            state,
            store,
            outbox,
        }
    }

    pub async fn next(&mut self) -> Sent {
        match self.outbox.recv().await {
            Some(item) => item,
            None => panic!("transport closed"),
        }
    }

    /// Wait for the next question, skipping other traffic.
    pub async fn next_question(&mut self) -> (String, OutboundQuestion) {
        loop {
            if let Sent::Question {
                token, question, ..
            } = self.next().await
            {
                self.wait_registered(&token).await;
                return (token, question);
            }
        }
    }

    /// Wait for the next report, skipping other traffic.
    pub async fn next_report(&mut self) -> SessionReport {
        loop {
            if let Sent::Report { report, .. } = self.next().await {
                return report;
            }
        }
    }

    /// Let the session task finish registering `token` after emitting it.
    pub async fn wait_registered(&self, token: &str) {
        for _ in 0..100 {
            if self.state.registry().contains(token) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("token {token} was never registered");
    }

    /// Drain everything sent so far without waiting.
    pub fn drain(&mut self) -> Vec<Sent> {
        let mut items = Vec::new();
        while let Ok(item) = self.outbox.try_recv() {
            items.push(item);
        }
        items
    }
}

pub fn question(text: &str, options: &[&str], correct_index: usize) -> QuestionEntity {
    QuestionEntity {
        text: text.into(),
        options: options.iter().map(|option| option.to_string()).collect(),
        correct_index,
    }
}

pub fn quiz(owner_id: i64, title: &str, questions: Vec<QuestionEntity>) -> QuizEntity {
    QuizEntity {
        id: Uuid::new_v4(),
        owner_id,
        title: title.into(),
        description: String::new(),
        questions,
        created_at: SystemTime::now(),
    }
}

/// Two-question capitals quiz.
pub fn capitals(owner_id: i64) -> QuizEntity {
    quiz(
        owner_id,
        "Capitals",
        vec![
            question("Capital of France?", &["Paris", "Lyon", "Nice"], 0),
            question("Capital of Italy?", &["Milan", "Rome"], 1),
        ],
    )
}
