use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping the quiz store and report degraded mode along with live engine counters.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_quiz_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    HealthResponse::new(
        state.is_degraded().await,
        state.sessions().len(),
        state.registry().len(),
    )
}
