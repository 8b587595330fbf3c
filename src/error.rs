use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub mod codes {
    pub const INVALID_EMAIL: &str = "INVALID_EMAIL";
    pub const INVALID_PASSWORD: &str = "INVALID_PASSWORD";
    pub const INVALID_DATE: &str = "INVALID_DATE";
    pub const INVALID_DESCRIPTION: &str = "INVALID_DESCRIPTION";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const TASK_NOT_FOUND: &str = "TASK_NOT_FOUND";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const EXISTING_USER: &str = "EXISTING_USER";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Error taxonomy surfaced to API clients. Each variant maps to a stable
/// HTTP status and machine-readable code; store failures stay internal.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        code: &'static str,
        message: String,
    },

    /// Deliberately identical for "no such user" and "wrong password".
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    InvalidToken(String),

    #[error("token has expired")]
    TokenExpired,

    /// The token verified but its user was deleted after issuance.
    #[error("user account no longer exists")]
    UserNotFound,

    #[error("you do not have access to this resource")]
    Forbidden,

    #[error("{message}")]
    NotFound {
        code: &'static str,
        message: String,
    },

    #[error("{message}")]
    Conflict { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    pub fn task_not_found() -> Self {
        Self::NotFound {
            code: codes::TASK_NOT_FOUND,
            message: "Task not found".into(),
        }
    }

    pub fn user_not_found() -> Self {
        Self::NotFound {
            code: codes::USER_NOT_FOUND,
            message: "User not found".into(),
        }
    }

    pub fn existing_user() -> Self {
        Self::Conflict {
            message: "A user with this email already exists".into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials
            | ApiError::InvalidToken(_)
            | ApiError::TokenExpired
            | ApiError::UserNotFound => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { code, .. } => code,
            ApiError::InvalidCredentials => codes::INVALID_CREDENTIALS,
            ApiError::InvalidToken(_) => codes::INVALID_TOKEN,
            ApiError::TokenExpired => codes::TOKEN_EXPIRED,
            ApiError::UserNotFound => codes::USER_NOT_FOUND,
            ApiError::Forbidden => codes::FORBIDDEN,
            ApiError::NotFound { code, .. } => code,
            ApiError::Conflict { .. } => codes::EXISTING_USER,
            ApiError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            code: self.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        if is_unique_violation(&e) {
            return ApiError::existing_user();
        }
        ApiError::Internal(e.into())
    }
}

/// Postgres unique_violation, raised when a concurrent registration wins the
/// race on the email constraint.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        let cases = [
            (
                ApiError::validation(codes::INVALID_DATE, "bad date"),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                ApiError::invalid_token("bad signature"),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::TokenExpired, StatusCode::UNAUTHORIZED),
            (ApiError::UserNotFound, StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
            (ApiError::task_not_found(), StatusCode::NOT_FOUND),
            (ApiError::existing_user(), StatusCode::CONFLICT),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "wrong status for {err:?}");
        }
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ApiError::InvalidCredentials.code(), "INVALID_CREDENTIALS");
        assert_eq!(ApiError::TokenExpired.code(), "TOKEN_EXPIRED");
        assert_eq!(ApiError::task_not_found().code(), "TASK_NOT_FOUND");
        assert_eq!(ApiError::user_not_found().code(), "USER_NOT_FOUND");
        assert_eq!(ApiError::existing_user().code(), "EXISTING_USER");
        assert_eq!(ApiError::Forbidden.code(), "FORBIDDEN");
    }

    #[test]
    fn internal_error_body_hides_detail() {
        let response = ApiError::Internal(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
