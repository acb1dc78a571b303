use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    services::sse_service,
    state::{SharedState, quiz::ChatId},
};

#[utoipa::path(
    get,
    path = "/chats/{chat_id}/events",
    tag = "sse",
    params(("chat_id" = i64, Path, description = "Chat to follow")),
    responses((status = 200, description = "Messages, questions and reports sent to the chat", content_type = "text/event-stream", body = String))
)]
/// Stream everything the bot sends to one chat.
pub async fn chat_stream(
    State(state): State<SharedState>,
    Path(chat_id): Path<ChatId>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    info!(chat_id, "new chat SSE connection");
    sse_service::broadcast_chat_info(state.sse(), chat_id, "chat stream connected");
    sse_service::to_sse_stream(receiver, chat_id)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/chats/{chat_id}/events", get(chat_stream))
}
