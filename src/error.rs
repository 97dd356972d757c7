use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorBody;

/// RepoError
///
/// Failures raised by the persistence layer.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A uniqueness constraint rejected the write (e.g. duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The database was unreachable or the statement failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepoError {
    /// Maps unique-constraint violations to `Conflict` and everything else to `Database`.
    pub fn classify(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return RepoError::Conflict(db_err.message().to_string());
        }
        RepoError::Database(err)
    }
}

/// AuthError
///
/// Failures raised by the identity provider while issuing or resolving sessions.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing session cookie")]
    MissingToken,

    #[error("invalid session token")]
    InvalidToken,

    #[error("session token expired")]
    ExpiredToken,

    #[error("session refers to an unknown user")]
    UnknownUser,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token encoding failed: {0}")]
    Encoding(String),

    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// ApiError
///
/// The HTTP-facing error taxonomy. Every handler and extractor returns this type, so the
/// JSON error envelope and status mapping live in one place.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, invalid or expired session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Valid session, insufficient privilege.
    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    /// Malformed request: missing field, wrong type, bad path parameter.
    #[error("{0}")]
    Validation(String),

    /// Well-formed request the service refuses (bad credentials, duplicate account).
    #[error("{0}")]
    BadRequest(String),

    /// Persistence unavailable or failing.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("{resource} {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Storage(msg) => {
                tracing::error!("storage error: {}", msg);
                "A storage error occurred".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(msg) => ApiError::BadRequest(msg),
            RepoError::Database(e) => ApiError::Storage(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::UnknownUser => ApiError::Unauthorized,
            AuthError::Hashing(msg) | AuthError::Encoding(msg) => ApiError::Internal(msg),
            AuthError::Repository(e) => e.into(),
        }
    }
}

// Extractor rejections all collapse into `Validation` so malformed input is reported
// with one status and one envelope.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
