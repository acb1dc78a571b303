use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{chat::Keyboard, quiz::SessionReportDto};

/// SSE event name for plain messages and prompts.
pub const EVENT_MESSAGE: &str = "message";
/// SSE event name for timed questions.
pub const EVENT_QUESTION: &str = "question";
/// SSE event name for final session reports.
pub const EVENT_REPORT: &str = "report";

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already encoded payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Text message sent to a chat, optionally with inline buttons.
pub struct MessageEvent {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Question sent to a chat. Answers are posted back with `token`; the correct option is
/// never disclosed.
pub struct QuestionEvent {
    pub chat_id: i64,
    pub token: String,
    pub text: String,
    pub options: Vec<String>,
    /// Seconds the question stays open; absent for previews.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_period_secs: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Final report of a play-through, with a ready-to-display summary.
pub struct ReportEvent {
    pub chat_id: i64,
    pub text: String,
    pub report: SessionReportDto,
}
