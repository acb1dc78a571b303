//! Outbound side of the chat: how prompts, questions and reports reach a user.

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dto::{
        chat::Keyboard,
        quiz::SessionReportDto,
        sse::{
            EVENT_MESSAGE, EVENT_QUESTION, EVENT_REPORT, MessageEvent, QuestionEvent, ReportEvent,
            ServerEvent,
        },
    },
    state::{
        SseHub,
        quiz::ChatId,
        session::SessionReport,
        sse::ChatEvent,
    },
};

/// Question as handed to the transport. `correct_index` lets platforms with native quiz
/// polls mark the answer; it is never forwarded to chat clients by [`SseTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    /// `None` for previews that are never scored.
    pub open_period_secs: Option<u64>,
}

/// Failure to deliver something to a chat.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to encode outbound payload")]
    Encode(#[from] serde_json::Error),
    #[error("chat {chat_id} rejected the message: {reason}")]
    Rejected { chat_id: ChatId, reason: String },
}

/// Sink for everything the bot says. Implementations must be cheap to call concurrently.
pub trait Transport: Send + Sync {
    /// Send a question and return the correlation token answers will carry.
    fn emit_question(
        &self,
        chat_id: ChatId,
        question: OutboundQuestion,
    ) -> BoxFuture<'static, Result<String, TransportError>>;
    fn emit_text(&self, chat_id: ChatId, text: String)
    -> BoxFuture<'static, Result<(), TransportError>>;
    /// Send a message with inline buttons.
    fn emit_prompt(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: Keyboard,
    ) -> BoxFuture<'static, Result<(), TransportError>>;
    fn emit_report(
        &self,
        chat_id: ChatId,
        text: String,
        report: SessionReport,
    ) -> BoxFuture<'static, Result<(), TransportError>>;
}

/// Transport pushing every outbound item onto the per-chat SSE streams.
#[derive(Clone)]
pub struct SseTransport {
    hub: SseHub,
}

impl SseTransport {
    pub fn new(hub: SseHub) -> Self {
        Self { hub }
    }

    fn send(&self, chat_id: ChatId, event: ServerEvent) {
        let delivered = self.hub.broadcast(ChatEvent { chat_id, event });
        debug!(chat_id, delivered, "chat event broadcast");
    }

    fn send_message(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: Option<Keyboard>,
    ) -> Result<(), TransportError> {
        let payload = MessageEvent {
            chat_id,
            text,
            keyboard,
        };
        let event = ServerEvent::json(Some(EVENT_MESSAGE.to_string()), &payload)?;
        self.send(chat_id, event);
        Ok(())
    }
}

impl Transport for SseTransport {
    fn emit_question(
        &self,
        chat_id: ChatId,
        question: OutboundQuestion,
    ) -> BoxFuture<'static, Result<String, TransportError>> {
        let token = Uuid::new_v4().simple().to_string();
        let payload = QuestionEvent {
            chat_id,
            token: token.clone(),
            text: question.text,
            options: question.options,
            open_period_secs: question.open_period_secs,
        };
        let result = ServerEvent::json(Some(EVENT_QUESTION.to_string()), &payload)
            .map(|event| {
                self.send(chat_id, event);
                token
            })
            .map_err(TransportError::from);
        Box::pin(async move { result })
    }

    fn emit_text(
        &self,
        chat_id: ChatId,
        text: String,
    ) -> BoxFuture<'static, Result<(), TransportError>> {
        let result = self.send_message(chat_id, text, None);
        Box::pin(async move { result })
    }

    fn emit_prompt(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: Keyboard,
    ) -> BoxFuture<'static, Result<(), TransportError>> {
        let result = self.send_message(chat_id, text, Some(keyboard));
        Box::pin(async move { result })
    }

    fn emit_report(
        &self,
        chat_id: ChatId,
        text: String,
        report: SessionReport,
    ) -> BoxFuture<'static, Result<(), TransportError>> {
        let payload = ReportEvent {
            chat_id,
            text,
            report: SessionReportDto::from(&report),
        };
        let result = ServerEvent::json(Some(EVENT_REPORT.to_string()), &payload)
            .map(|event| self.send(chat_id, event))
            .map_err(TransportError::from);
        Box::pin(async move { result })
    }
}
