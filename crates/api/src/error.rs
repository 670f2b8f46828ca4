//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-class errors are
//! captured to Sentry before responding; clients get `{"error": "..."}` and
//! never see internal details.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::auth::TokenError;
use crate::services::ServiceError;
use crate::services::accounts::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Missing or invalid bearer credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed request body, path or query.
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) | Self::Auth(AuthError::Service(err)) => service_status(err),
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) | AuthError::MissingName | AuthError::WeakPassword => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::AccountExists => StatusCode::CONFLICT,
                AuthError::PasswordHash | AuthError::Service(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Token(TokenError::Invalid) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Token(TokenError::Encode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Service(err) | Self::Auth(AuthError::Service(err)) => match err {
                ServiceError::Cancelled => "request timed out".to_owned(),
                ServiceError::Unavailable(_) => "service unavailable".to_owned(),
                other => other.to_string(),
            },
            Self::Auth(AuthError::AccountExists) => {
                "an account with this email already exists".to_owned()
            }
            Self::Auth(AuthError::PasswordHash) | Self::Token(TokenError::Encode(_)) => {
                "internal server error".to_owned()
            }
            Self::Token(TokenError::Invalid) => "invalid token".to_owned(),
            other => other.to_string(),
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Service(ServiceError::Unavailable(_))
                | Self::Auth(
                    AuthError::PasswordHash | AuthError::Service(ServiceError::Unavailable(_))
                )
                | Self::Token(TokenError::Encode(_))
        )
    }
}

const fn service_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Forbidden => StatusCode::FORBIDDEN,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Unavailable(_) | ServiceError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if matches!(self, Self::Service(ServiceError::Cancelled)) {
            tracing::warn!("request cancelled at deadline");
        }

        let status = self.status();
        let body = Json(json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;
    use crate::db::RepositoryError;

    async fn render(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        (status, value["error"].as_str().unwrap().to_owned())
    }

    #[tokio::test]
    async fn test_service_error_statuses() {
        let cases = [
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST, "bad"),
            (ServiceError::NotFound("product not found".into()), StatusCode::NOT_FOUND, "product not found"),
            (ServiceError::Forbidden, StatusCode::FORBIDDEN, "forbidden"),
            (ServiceError::Conflict("slug already exists".into()), StatusCode::CONFLICT, "slug already exists"),
            (ServiceError::Cancelled, StatusCode::SERVICE_UNAVAILABLE, "request timed out"),
        ];
        for (err, status, message) in cases {
            assert_eq!(render(err.into()).await, (status, message.to_owned()));
        }
    }

    #[tokio::test]
    async fn test_store_failure_hides_details() {
        let err = ServiceError::Unavailable(RepositoryError::DataCorruption(
            "price -1 in row 7".into(),
        ));
        let (status, message) = render(err.into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(message, "service unavailable");
    }

    #[tokio::test]
    async fn test_auth_error_statuses() {
        assert_eq!(
            render(AuthError::InvalidCredentials.into()).await,
            (StatusCode::UNAUTHORIZED, "invalid credentials".to_owned())
        );
        assert_eq!(render(AuthError::WeakPassword.into()).await.0, StatusCode::BAD_REQUEST);
        assert_eq!(render(AuthError::AccountExists.into()).await.0, StatusCode::CONFLICT);
        assert_eq!(
            render(AuthError::PasswordHash.into()).await,
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
        );
        assert_eq!(
            render(AuthError::Service(ServiceError::Cancelled).into()).await.0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_unauthorized() {
        assert_eq!(
            render(AppError::Unauthorized("missing bearer token".into())).await,
            (StatusCode::UNAUTHORIZED, "missing bearer token".to_owned())
        );
    }
}
