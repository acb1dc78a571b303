use dashmap::{DashMap, mapref::entry::Entry};
use thiserror::Error;
use uuid::Uuid;

use crate::state::quiz::UserId;

/// Identifier of one play-through.
pub type SessionId = Uuid;

/// Owner of an emitted question, resolved from its correlation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correlation {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub question_index: usize,
}

/// Raised when a token is registered twice. Token generation is expected to make this
/// impossible, so callers treat it as fatal for the operation at hand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("correlation token `{0}` is already registered")]
    DuplicateToken(String),
}

/// Maps per-question tokens to their owner. Every entry is written once and consumed at
/// most once.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: DashMap<String, Correlation>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping for a freshly emitted question.
    pub fn register(
        &self,
        token: impl Into<String>,
        correlation: Correlation,
    ) -> Result<(), RegistryError> {
        match self.entries.entry(token.into()) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateToken(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(correlation);
                Ok(())
            }
        }
    }

    /// Atomically look up and delete the mapping. `None` when the token was never
    /// registered or has already been consumed or purged.
    pub fn consume(&self, token: &str) -> Option<Correlation> {
        self.entries.remove(token).map(|(_, correlation)| correlation)
    }

    /// Drop every remaining entry of a session, returning how many were removed.
    pub fn purge_session(&self, session_id: SessionId) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, correlation| {
            let keep = correlation.session_id != session_id;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn correlation(session_id: SessionId, question_index: usize) -> Correlation {
        Correlation {
            user_id: 42,
            session_id,
            question_index,
        }
    }

    #[test]
    fn duplicate_token_is_rejected() {
        let registry = SessionRegistry::new();
        let session = Uuid::new_v4();
        registry.register("t-1", correlation(session, 0)).unwrap();
        let err = registry
            .register("t-1", correlation(session, 1))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateToken("t-1".into()));
        assert_eq!(registry.consume("t-1"), Some(correlation(session, 0)));
    }

    #[test]
    fn consume_is_once() {
        let registry = SessionRegistry::new();
        registry
            .register("t-1", correlation(Uuid::new_v4(), 0))
            .unwrap();
        assert!(registry.consume("t-1").is_some());
        assert!(registry.consume("t-1").is_none());
        assert!(registry.consume("never-registered").is_none());
    }

    #[test]
    fn purge_only_touches_one_session() {
        let registry = SessionRegistry::new();
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        registry.register("a", correlation(old, 0)).unwrap();
        registry.register("b", correlation(old, 1)).unwrap();
        registry.register("c", correlation(new, 0)).unwrap();

        assert_eq!(registry.purge_session(old), 2);
        assert!(!registry.contains("a"));
        assert!(registry.contains("c"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn purge_counts_its_own_tokens_while_others_register() {
        let registry = Arc::new(SessionRegistry::new());
        let old = Uuid::new_v4();
        for index in 0..2_000 {
            registry
                .register(format!("old-{index}"), correlation(old, index))
                .unwrap();
        }

        let writer = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                let fresh = Uuid::new_v4();
                for index in 0..2_000 {
                    registry
                        .register(format!("new-{index}"), correlation(fresh, index))
                        .unwrap();
                }
            })
        };
        let purged = registry.purge_session(old);
        writer.join().unwrap();

        assert_eq!(purged, 2_000);
        assert_eq!(registry.len(), 2_000);
    }

    #[test]
    fn concurrent_consumers_win_at_most_once() {
        let registry = Arc::new(SessionRegistry::new());
        for round in 0..200 {
            let token = format!("token-{round}");
            registry
                .register(token.clone(), correlation(Uuid::new_v4(), 0))
                .unwrap();

            let wins = Arc::new(AtomicUsize::new(0));
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let registry = registry.clone();
                    let wins = wins.clone();
                    let token = token.clone();
                    std::thread::spawn(move || {
                        if registry.consume(&token).is_some() {
                            wins.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(wins.load(Ordering::SeqCst), 1);
        }
        assert!(registry.is_empty());
    }
}
