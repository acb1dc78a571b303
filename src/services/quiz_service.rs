use crate::{
    dao::models::{ResultEntity, leaderboard_order},
    dto::quiz::{LeaderboardEntry, QuizSummary},
    error::ServiceError,
    state::{
        SharedState,
        quiz::{QuizId, UserId},
    },
};

/// Quizzes authored by `owner_id`.
pub async fn list_for_owner(
    state: &SharedState,
    owner_id: UserId,
) -> Result<Vec<QuizSummary>, ServiceError> {
    let store = state.require_quiz_store().await?;
    let quizzes = store.list_quizzes_by_owner(owner_id).await?;
    Ok(quizzes.into_iter().map(QuizSummary::from).collect())
}

/// Best results of a quiz, most correct answers first.
pub async fn leaderboard(
    state: &SharedState,
    quiz_id: QuizId,
) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let store = state.require_quiz_store().await?;
    if store.find_quiz(quiz_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("quiz `{quiz_id}` not found")));
    }

    let mut results: Vec<ResultEntity> = store
        .top_results(quiz_id, state.config().leaderboard_size)
        .await?;
    results.sort_by(leaderboard_order);
    Ok(LeaderboardEntry::ranked(results))
}
