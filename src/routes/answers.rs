use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::chat::{AnswerRequest, AnswerResponse},
    services::answer_service,
    state::SharedState,
};

/// Poll answer ingestion.
pub fn router() -> Router<SharedState> {
    Router::new().route("/answers", post(post_answer))
}

/// Submit the option picked for an emitted question.
///
/// Unknown, replayed and late tokens are accepted but not counted.
#[utoipa::path(
    post,
    path = "/answers",
    tag = "play",
    request_body = AnswerRequest,
    responses((status = 200, description = "Answer ingested", body = AnswerResponse))
)]
pub async fn post_answer(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AnswerRequest>>,
) -> Json<AnswerResponse> {
    let outcome = answer_service::ingest(&state, &payload.token, payload.option_index).await;
    Json(AnswerResponse {
        counted: outcome.counted(),
    })
}
