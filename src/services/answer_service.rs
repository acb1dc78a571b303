use tracing::debug;

use crate::state::{SharedState, scores::AnswerOutcome};

/// Score an answer event. Unknown, replayed and late tokens are silently ignored.
pub async fn ingest(state: &SharedState, token: &str, option_index: usize) -> AnswerOutcome {
    let outcome = state
        .scores()
        .record_answer(state.registry(), token, option_index)
        .await;
    debug!(token, option_index, ?outcome, "answer ingested");
    outcome
}
