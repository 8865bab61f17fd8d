use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::validation::FieldErrors;
use crate::workflows::RepositoryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::fmt;

/// Failures that stop the process (bootstrap, CLI commands).
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Store(RepositoryError),
    Command(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Store(err) => write!(f, "store error: {}", err),
            AppError::Command(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Command(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Store(value)
    }
}

/// Request-level failure rendered as the standard error envelope:
///
/// ```json
/// { "error": true, "message": "...", "code": 400, "detail": { ... } }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String, detail: FieldErrors },
    #[error("authentication credentials were not provided")]
    Unauthenticated,
    #[error("invalid token")]
    InvalidToken,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn validation(detail: FieldErrors) -> Self {
        Self::Validation {
            message: "request validation failed".to_string(),
            detail,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // Conflicts share 400 with validation failures.
            ApiError::Validation { .. } | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Value {
        match self {
            ApiError::Validation { detail, .. } => detail.to_json(),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Internal(reason) = &self {
            tracing::error!(%reason, "request failed with internal error");
        }

        let body = Json(json!({
            "error": true,
            "message": self.to_string(),
            "code": status.as_u16(),
            "detail": self.detail(),
        }));
        (status, body).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ApiError::not_found("not found"),
            RepositoryError::Conflict => ApiError::conflict("record already exists"),
            RepositoryError::Constraint(reason) => {
                ApiError::validation(FieldErrors::single("non_field_errors", reason))
            }
            RepositoryError::Unavailable(reason) => ApiError::Internal(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn envelope_mirrors_status_code() {
        let response = ApiError::forbidden("only students can apply").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = read_json(response).await;
        assert_eq!(body["error"], json!(true));
        assert_eq!(body["code"], json!(403));
        assert_eq!(body["message"], json!("only students can apply"));
        assert_eq!(body["detail"]["error"], json!("only students can apply"));
    }

    #[tokio::test]
    async fn validation_detail_lists_field_messages() {
        let mut errors = FieldErrors::default();
        errors.push("cover_letter", "too short");
        let response = ApiError::validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        assert_eq!(body["code"], json!(400));
        assert_eq!(body["detail"]["cover_letter"], json!(["too short"]));
    }

    #[test]
    fn repository_errors_map_to_client_and_server_statuses() {
        assert_eq!(
            ApiError::from(RepositoryError::Conflict).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(RepositoryError::Unavailable("disk".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
