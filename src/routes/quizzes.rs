use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::quiz::{LeaderboardEntry, QuizSummary},
    error::AppError,
    services::quiz_service,
    state::{SharedState, quiz::UserId},
};

/// Read-only quiz listings.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/users/{user_id}/quizzes", get(list_quizzes))
        .route("/quizzes/{id}/leaderboard", get(leaderboard))
}

/// List the quizzes authored by a user.
#[utoipa::path(
    get,
    path = "/users/{user_id}/quizzes",
    tag = "quizzes",
    params(("user_id" = i64, Path, description = "Author of the quizzes")),
    responses(
        (status = 200, description = "Quizzes of the user", body = [QuizSummary]),
        (status = 503, description = "Quiz store unavailable")
    )
)]
pub async fn list_quizzes(
    State(state): State<SharedState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<QuizSummary>>, AppError> {
    Ok(Json(quiz_service::list_for_owner(&state, user_id).await?))
}

/// Best recorded results of a quiz.
#[utoipa::path(
    get,
    path = "/quizzes/{id}/leaderboard",
    tag = "quizzes",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    responses(
        (status = 200, description = "Ranked results", body = [LeaderboardEntry]),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    Ok(Json(quiz_service::leaderboard(&state, id).await?))
}
