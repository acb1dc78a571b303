use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{debug, warn};

use crate::{
    dto::sse::{EVENT_MESSAGE, MessageEvent, ServerEvent},
    state::{ChatEvent, SharedState, SseHub, quiz::ChatId},
};

/// Subscribe to the events of every chat; callers filter on the chat id.
pub fn subscribe(state: &SharedState) -> broadcast::Receiver<ChatEvent> {
    state.sse().subscribe()
}

/// Keep only the events addressed to `chat_id`, skipping lagged messages.
pub fn chat_events(
    receiver: broadcast::Receiver<ChatEvent>,
    chat_id: ChatId,
) -> impl Stream<Item = ServerEvent> {
    BroadcastStream::new(receiver).filter_map(move |item| async move {
        match item {
            Ok(ChatEvent {
                chat_id: target,
                event,
            }) if target == chat_id => Some(event),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(chat_id, skipped, "chat SSE stream lagged; events dropped");
                None
            }
        }
    })
}

/// Convert a chat's events into an SSE response with keep-alive pings.
pub fn to_sse_stream(
    receiver: broadcast::Receiver<ChatEvent>,
    chat_id: ChatId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = chat_events(receiver, chat_id);
    let stream = async_stream::stream! {
        for await payload in events {
            let mut event = Event::default().data(payload.data);
            if let Some(name) = payload.event {
                event = event.event(name);
            }
            yield Ok::<Event, Infallible>(event);
        }
        debug!(chat_id, "chat SSE stream closed");
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Send a plain text notice to one chat stream.
pub fn broadcast_chat_info(hub: &SseHub, chat_id: ChatId, text: &str) {
    let payload = MessageEvent {
        chat_id,
        text: text.to_string(),
        keyboard: None,
    };
    match ServerEvent::json(Some(EVENT_MESSAGE.to_string()), &payload) {
        Ok(event) => {
            hub.broadcast(ChatEvent { chat_id, event });
        }
        Err(err) => warn!(chat_id, error = %err, "failed to serialize chat SSE payload"),
    }
}
