use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use axum_valid::Valid;

use crate::{
    dto::chat::{DispatchResponse, InboundCallback, InboundMessage},
    error::AppError,
    services::chat_service,
    state::{SharedState, quiz::ChatId},
};

/// Inbound chat updates: typed text and button presses.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/chats/{chat_id}/messages", post(post_message))
        .route("/chats/{chat_id}/callbacks", post(post_callback))
}

/// Deliver a text message or command typed in a chat.
#[utoipa::path(
    post,
    path = "/chats/{chat_id}/messages",
    tag = "chat",
    params(("chat_id" = i64, Path, description = "Chat the message was typed in")),
    request_body = InboundMessage,
    responses(
        (status = 200, description = "Message dispatched", body = DispatchResponse),
        (status = 400, description = "Invalid payload or rejected input"),
        (status = 503, description = "Quiz store unavailable")
    )
)]
pub async fn post_message(
    State(state): State<SharedState>,
    Path(chat_id): Path<ChatId>,
    Valid(Json(payload)): Valid<Json<InboundMessage>>,
) -> Result<Json<DispatchResponse>, AppError> {
    let handled =
        chat_service::handle_message(&state, chat_id, payload.user_id, &payload.text).await?;
    Ok(Json(DispatchResponse { handled }))
}

/// Deliver an inline button press.
#[utoipa::path(
    post,
    path = "/chats/{chat_id}/callbacks",
    tag = "chat",
    params(("chat_id" = i64, Path, description = "Chat holding the pressed button")),
    request_body = InboundCallback,
    responses(
        (status = 200, description = "Callback dispatched", body = DispatchResponse),
        (status = 400, description = "Unknown callback payload"),
        (status = 404, description = "Quiz not found"),
        (status = 409, description = "Action not allowed in the current play phase")
    )
)]
pub async fn post_callback(
    State(state): State<SharedState>,
    Path(chat_id): Path<ChatId>,
    Valid(Json(payload)): Valid<Json<InboundCallback>>,
) -> Result<Json<DispatchResponse>, AppError> {
    let handled =
        chat_service::handle_callback(&state, chat_id, payload.user_id, &payload.data).await?;
    Ok(Json(DispatchResponse { handled }))
}
