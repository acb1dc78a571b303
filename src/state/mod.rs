pub mod authoring;
pub mod quiz;
pub mod registry;
pub mod scores;
pub mod session;
pub mod shuffle;
pub mod sse;
pub mod state_machine;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::quiz_store::QuizStore,
    error::ServiceError,
    services::transport::{SseTransport, Transport},
};

pub use self::sse::{ChatEvent, SseHub};
use self::{
    authoring::AuthoringState, quiz::UserId, registry::SessionRegistry, scores::ScoreTracker,
    session::PlaySession,
};

pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, chat plumbing and per-user conversations.
pub struct AppState {
    quiz_store: RwLock<Option<Arc<dyn QuizStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    sse: SseHub,
    transport: Arc<dyn Transport>,
    authoring: DashMap<UserId, AuthoringState>,
    sessions: DashMap<UserId, PlaySession>,
    registry: SessionRegistry,
    scores: ScoreTracker,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Outbound chat traffic goes to the SSE hub. The application starts in degraded
    /// mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let sse = SseHub::new(config.chat_event_capacity);
        let transport = Arc::new(SseTransport::new(sse.clone()));
        Self::build(config, sse, transport)
    }

    /// Same as [`AppState::new`] but delivering outbound traffic through `transport`.
    pub fn with_transport(config: AppConfig, transport: Arc<dyn Transport>) -> SharedState {
        let sse = SseHub::new(config.chat_event_capacity);
        Self::build(config, sse, transport)
    }

    fn build(config: AppConfig, sse: SseHub, transport: Arc<dyn Transport>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            quiz_store: RwLock::new(None),
            degraded: degraded_tx,
            config,
            sse,
            transport,
            authoring: DashMap::new(),
            sessions: DashMap::new(),
            registry: SessionRegistry::new(),
            scores: ScoreTracker::new(),
        })
    }

    /// Obtain a handle to the current quiz store, if one is installed.
    pub async fn quiz_store(&self) -> Option<Arc<dyn QuizStore>> {
        let guard = self.quiz_store.read().await;
        guard.as_ref().cloned()
    }

    /// Quiz store or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_quiz_store(&self) -> Result<Arc<dyn QuizStore>, ServiceError> {
        self.quiz_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new quiz store implementation and leave degraded mode.
    pub async fn set_quiz_store(&self, store: Arc<dyn QuizStore>) {
        {
            let mut guard = self.quiz_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current quiz store and enter degraded mode.
    pub async fn clear_quiz_store(&self) {
        {
            let mut guard = self.quiz_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Broadcast hub feeding the per-chat SSE streams.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Authoring conversations keyed by author.
    pub fn authoring(&self) -> &DashMap<UserId, AuthoringState> {
        &self.authoring
    }

    /// Play sessions keyed by player; at most one per user.
    pub fn sessions(&self) -> &DashMap<UserId, PlaySession> {
        &self.sessions
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn scores(&self) -> &ScoreTracker {
        &self.scores
    }
}
