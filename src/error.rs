use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    services::{play_service::PlayError, transport::TransportError},
    state::authoring::AuthoringError,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Authoring input rejected; the conversation is unchanged.
    #[error(transparent)]
    Authoring(#[from] AuthoringError),
    /// Play session could not be prepared or started.
    #[error(transparent)]
    Play(#[from] PlayError),
    /// Message could not be delivered to the chat.
    #[error("chat delivery failed")]
    Transport(#[from] TransportError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Upstream (chat delivery) failure.
    #[error("bad gateway: {0}")]
    BadGateway(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Authoring(err) => AppError::BadRequest(err.to_string()),
            ServiceError::Play(err) => match err {
                PlayError::QuizNotFound(_) | PlayError::NoSession => {
                    AppError::NotFound(err.to_string())
                }
                PlayError::EmptyQuiz(_) | PlayError::InvalidTransition(_) => {
                    AppError::Conflict(err.to_string())
                }
                PlayError::TimerNotAllowed { .. } => AppError::BadRequest(err.to_string()),
            },
            ServiceError::Transport(err) => AppError::BadGateway(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::state::authoring::ValidationIssue;

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn domain_errors_map_to_http_statuses() {
        assert_eq!(
            status_of(AuthoringError::Validation(ValidationIssue::EmptyTitle).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(PlayError::QuizNotFound(Uuid::nil()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(PlayError::EmptyQuiz(Uuid::nil()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(
                PlayError::TimerNotAllowed {
                    requested: 7,
                    allowed: vec![10]
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ServiceError::Degraded), StatusCode::SERVICE_UNAVAILABLE);
    }
}
