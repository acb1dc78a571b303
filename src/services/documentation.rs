use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz bot backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::chat_stream,
        crate::routes::chat::post_message,
        crate::routes::chat::post_callback,
        crate::routes::answers::post_answer,
        crate::routes::quizzes::list_quizzes,
        crate::routes::quizzes::leaderboard,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::chat::InboundMessage,
            crate::dto::chat::InboundCallback,
            crate::dto::chat::AnswerRequest,
            crate::dto::chat::AnswerResponse,
            crate::dto::chat::DispatchResponse,
            crate::dto::chat::Button,
            crate::dto::chat::Keyboard,
            crate::dto::sse::MessageEvent,
            crate::dto::sse::QuestionEvent,
            crate::dto::sse::ReportEvent,
            crate::dto::quiz::QuizSummary,
            crate::dto::quiz::LeaderboardEntry,
            crate::dto::quiz::SessionReportDto,
            crate::state::shuffle::ShuffleMode,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "chat", description = "Inbound chat messages and button presses"),
        (name = "play", description = "Answers to timed questions"),
        (name = "quizzes", description = "Quiz listings and leaderboards"),
    )
)]
pub struct ApiDoc;
