//! Per-user score cards shared between the session task and answer ingestion.
//!
//! Every read or write of a card happens while holding its mutex. The session task only
//! takes the lock transiently (token registration, finalization); it never holds it
//! across a timer.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::state::{
    quiz::UserId,
    registry::{Correlation, RegistryError, SessionId, SessionRegistry},
};

/// Mutable counters of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    pub session_id: SessionId,
    /// Correct option position per question, after shuffling.
    pub correct_indices: Vec<usize>,
    pub correct: u32,
    pub wrong: u32,
    /// Set once the session is finalized or abandoned; a closed card accepts nothing.
    pub closed: bool,
}

/// Handle to a card guarded by its user's lock.
pub type SharedCard = Arc<Mutex<ScoreCard>>;

/// Counts read once at finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalCounts {
    pub correct: u32,
    pub wrong: u32,
    /// Registry entries dropped because nobody answered them in time.
    pub purged_tokens: usize,
}

/// What happened to an incoming answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Wrong,
    /// Unknown, replayed or late token, or a token of a closed session.
    Ignored,
}

impl AnswerOutcome {
    pub fn counted(self) -> bool {
        !matches!(self, AnswerOutcome::Ignored)
    }
}

/// Registry of the live score card of each user.
#[derive(Debug, Default)]
pub struct ScoreTracker {
    cards: DashMap<UserId, SharedCard>,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a zeroed card for a new session, closing whatever card the user had.
    pub async fn open(
        &self,
        user_id: UserId,
        session_id: SessionId,
        correct_indices: Vec<usize>,
    ) -> SharedCard {
        let card = Arc::new(Mutex::new(ScoreCard {
            session_id,
            correct_indices,
            correct: 0,
            wrong: 0,
            closed: false,
        }));

        let previous = self.cards.insert(user_id, card.clone());
        if let Some(previous) = previous {
            previous.lock().await.closed = true;
        }

        card
    }

    /// Current card of a user, if a session is live.
    pub fn card(&self, user_id: UserId) -> Option<SharedCard> {
        self.cards.get(&user_id).map(|entry| entry.value().clone())
    }

    /// Register the token of an emitted question, unless the card was closed meanwhile.
    ///
    /// Returns `Ok(false)` when the session is already closed; the token is then left
    /// unregistered so any answer to it is ignored.
    pub async fn register_question(
        &self,
        card: &SharedCard,
        registry: &SessionRegistry,
        token: &str,
        correlation: Correlation,
    ) -> Result<bool, RegistryError> {
        let guard = card.lock().await;
        if guard.closed || guard.session_id != correlation.session_id {
            return Ok(false);
        }
        registry.register(token, correlation)?;
        Ok(true)
    }

    /// Score an answer event. Consumes the token first so replays are no-ops.
    pub async fn record_answer(
        &self,
        registry: &SessionRegistry,
        token: &str,
        option_index: usize,
    ) -> AnswerOutcome {
        let Some(correlation) = registry.consume(token) else {
            debug!(token, "answer for unknown or consumed token ignored");
            return AnswerOutcome::Ignored;
        };

        let Some(card) = self.card(correlation.user_id) else {
            debug!(token, user_id = correlation.user_id, "answer for finished session ignored");
            return AnswerOutcome::Ignored;
        };

        let mut guard = card.lock().await;
        if guard.closed || guard.session_id != correlation.session_id {
            return AnswerOutcome::Ignored;
        }

        let Some(&expected) = guard.correct_indices.get(correlation.question_index) else {
            return AnswerOutcome::Ignored;
        };

        if option_index == expected {
            guard.correct += 1;
            AnswerOutcome::Correct
        } else {
            guard.wrong += 1;
            AnswerOutcome::Wrong
        }
    }

    /// Close a card, read its counts once and purge the session's pending tokens.
    pub async fn finalize(
        &self,
        user_id: UserId,
        card: &SharedCard,
        registry: &SessionRegistry,
    ) -> FinalCounts {
        let counts = {
            let mut guard = card.lock().await;
            guard.closed = true;
            let purged_tokens = registry.purge_session(guard.session_id);
            FinalCounts {
                correct: guard.correct,
                wrong: guard.wrong,
                purged_tokens,
            }
        };

        self.cards
            .remove_if(&user_id, |_, current| Arc::ptr_eq(current, card));

        counts
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    async fn live_card(
        tracker: &ScoreTracker,
        registry: &SessionRegistry,
        correct_indices: Vec<usize>,
    ) -> (SharedCard, SessionId) {
        let session_id = Uuid::new_v4();
        let card = tracker.open(7, session_id, correct_indices.clone()).await;
        for (index, _) in correct_indices.iter().enumerate() {
            let registered = tracker
                .register_question(
                    &card,
                    registry,
                    &format!("{session_id}-{index}"),
                    Correlation {
                        user_id: 7,
                        session_id,
                        question_index: index,
                    },
                )
                .await
                .unwrap();
            assert!(registered);
        }
        (card, session_id)
    }

    #[tokio::test]
    async fn answers_are_scored_against_shuffled_indices() {
        let tracker = ScoreTracker::new();
        let registry = SessionRegistry::new();
        let (card, session_id) = live_card(&tracker, &registry, vec![2, 0]).await;

        assert_eq!(
            tracker
                .record_answer(&registry, &format!("{session_id}-0"), 2)
                .await,
            AnswerOutcome::Correct
        );
        assert_eq!(
            tracker
                .record_answer(&registry, &format!("{session_id}-1"), 1)
                .await,
            AnswerOutcome::Wrong
        );

        let counts = tracker.finalize(7, &card, &registry).await;
        assert_eq!((counts.correct, counts.wrong, counts.purged_tokens), (1, 1, 0));
        assert!(tracker.card(7).is_none());
    }

    #[tokio::test]
    async fn replayed_token_does_not_count_twice() {
        let tracker = ScoreTracker::new();
        let registry = SessionRegistry::new();
        let (card, session_id) = live_card(&tracker, &registry, vec![0]).await;
        let token = format!("{session_id}-0");

        assert!(tracker.record_answer(&registry, &token, 0).await.counted());
        assert_eq!(
            tracker.record_answer(&registry, &token, 0).await,
            AnswerOutcome::Ignored
        );
        assert_eq!(card.lock().await.correct, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_answers_for_one_token_count_once() {
        let tracker = Arc::new(ScoreTracker::new());
        let registry = Arc::new(SessionRegistry::new());
        let (card, session_id) = live_card(&tracker, &registry, vec![1]).await;
        let token = format!("{session_id}-0");

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let tracker = tracker.clone();
                let registry = registry.clone();
                let token = token.clone();
                tokio::spawn(async move { tracker.record_answer(&registry, &token, 1).await })
            })
            .collect();

        let mut counted = 0;
        for task in tasks {
            if task.await.unwrap().counted() {
                counted += 1;
            }
        }

        assert_eq!(counted, 1);
        let guard = card.lock().await;
        assert_eq!(guard.correct + guard.wrong, 1);
    }

    #[tokio::test]
    async fn finalized_card_ignores_late_answers_and_purges_tokens() {
        let tracker = ScoreTracker::new();
        let registry = SessionRegistry::new();
        let (card, session_id) = live_card(&tracker, &registry, vec![0, 0, 0]).await;

        let counts = tracker.finalize(7, &card, &registry).await;
        assert_eq!(counts.purged_tokens, 3);
        assert_eq!(
            tracker
                .record_answer(&registry, &format!("{session_id}-0"), 0)
                .await,
            AnswerOutcome::Ignored
        );

        let refused = tracker
            .register_question(
                &card,
                &registry,
                "late",
                Correlation {
                    user_id: 7,
                    session_id,
                    question_index: 0,
                },
            )
            .await
            .unwrap();
        assert!(!refused);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn opening_a_new_card_closes_the_previous_one() {
        let tracker = ScoreTracker::new();
        let registry = SessionRegistry::new();
        let (old_card, _) = live_card(&tracker, &registry, vec![0]).await;
        let _new_card = tracker.open(7, Uuid::new_v4(), vec![0]).await;
        assert!(old_card.lock().await.closed);
    }
}
