/// Poll answer ingestion and scoring.
pub mod answer_service;
/// Quiz authoring conversation and persistence.
pub mod authoring_service;
/// Chat command and button dispatch.
pub mod chat_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Play engine: session setup, timed emission and finalization.
pub mod play_service;
/// Read-only quiz listings and leaderboards.
pub mod quiz_service;
/// Server-Sent Events streaming for chat clients.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Outbound chat transport abstraction.
pub mod transport;
