use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{quiz_store::QuizStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Keep a quiz store installed in the shared state, toggling degraded mode while it is
/// unreachable. Runs until the process exits.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn QuizStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_quiz_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch_health(&state, store.as_ref()).await;

                warn!("storage lost; dropping the store and reconnecting from scratch");
                state.clear_quiz_store().await;
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = next_delay(delay);
    }
}

/// Poll the store until it fails and cannot be recovered in place.
async fn watch_health(state: &SharedState, store: &dyn QuizStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded().await {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false).await;
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed; entering degraded mode");
                state.update_degraded(true).await;
                if !reconnect(store).await {
                    warn!("exhausted storage reconnect attempts");
                    return;
                }
                info!("storage reconnection succeeded after health check failure");
                state.update_degraded(false).await;
            }
        }

        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Retry [`QuizStore::try_reconnect`] with exponential backoff.
async fn reconnect(store: &dyn QuizStore) -> bool {
    let mut delay = INITIAL_DELAY;
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                sleep(delay).await;
                delay = next_delay(delay);
            }
        }
    }
    false
}

fn next_delay(delay: Duration) -> Duration {
    (delay * 2).min(MAX_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::quiz_store::InMemoryQuizStore, state::AppState};

    #[test]
    fn backoff_is_capped() {
        assert_eq!(next_delay(INITIAL_DELAY), Duration::from_secs(2));
        assert_eq!(next_delay(Duration::from_secs(8)), MAX_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn supervisor_tracks_store_availability() {
        let state = AppState::new(AppConfig::default());
        let store = InMemoryQuizStore::new();
        let supervised = store.clone();
        tokio::spawn(run(state.clone(), move || {
            let store = supervised.clone();
            async move { Ok(Arc::new(store) as Arc<dyn QuizStore>) }
        }));

        let mut degraded = state.degraded_watcher();
        degraded.wait_for(|flag| !*flag).await.unwrap();
        assert!(state.quiz_store().await.is_some());

        store.set_offline(true);
        degraded.wait_for(|flag| *flag).await.unwrap();

        store.set_offline(false);
        degraded.wait_for(|flag| !*flag).await.unwrap();
        assert!(state.quiz_store().await.is_some());
    }
}
