use serde::Serialize;
use utoipa::ToSchema;

/// Liveness payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" while the quiz store is unreachable.
    pub status: String,
    /// Play sessions currently selected or running.
    pub active_sessions: usize,
    /// Answer tokens still waiting for a reply.
    pub pending_tokens: usize,
}

impl HealthResponse {
    pub fn new(degraded: bool, active_sessions: usize, pending_tokens: usize) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_string(),
            active_sessions,
            pending_tokens,
        }
    }
}
