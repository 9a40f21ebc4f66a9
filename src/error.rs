use axum::extract::multipart::MultipartError;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum ProfileError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Blocking task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Missing session cookie")]
    MissingSession,

    #[error("Session is invalid or expired")]
    InvalidSession,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Profile not found for account: {0}")]
    ProfileNotFound(String),

    /// Raised by storage when the nickname unique index rejects a write.
    #[error("Nickname already taken")]
    NicknameTaken,

    /// Raised by storage when the email primary key rejects a write.
    #[error("Email already registered")]
    EmailTaken,

    #[error("Multipart body carries no file field")]
    MissingFile,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl IntoResponse for ProfileError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            ProfileError::DatabaseError(_)
            | ProfileError::Io(_)
            | ProfileError::PasswordHash(_)
            | ProfileError::TaskJoin(_)
            | ProfileError::InvalidConfig(_) => {
                error!(error = %self, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.".to_string(),
                )
            }
            ProfileError::Multipart(e) => (e.status(), "BAD_MULTIPART", e.body_text()),
            ProfileError::MissingFile => (
                StatusCode::BAD_REQUEST,
                "MISSING_FILE",
                "No file was attached to the request.".to_string(),
            ),
            ProfileError::MissingSession | ProfileError::InvalidSession => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required.".to_string(),
            ),
            ProfileError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password.".to_string(),
            ),
            ProfileError::AccountNotFound(_) => (
                StatusCode::NOT_FOUND,
                "ACCOUNT_NOT_FOUND",
                "Account not found.".to_string(),
            ),
            ProfileError::ProfileNotFound(_) => (
                StatusCode::NOT_FOUND,
                "PROFILE_NOT_FOUND",
                "No profile image has been uploaded yet.".to_string(),
            ),
            ProfileError::NicknameTaken | ProfileError::EmailTaken => (
                StatusCode::CONFLICT,
                "CONFLICT",
                self.to_string(),
            ),
        };

        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
