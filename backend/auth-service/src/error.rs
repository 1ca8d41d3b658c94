/// Error types for the auth service
///
/// Converted to the shared `ErrorResponse` body at the HTTP boundary. Unknown
/// email and wrong password produce the same response so login cannot be used
/// to probe which accounts exist.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use crypto_core::{PasswordError, TokenError};
use ::error_types::{error_codes, error_types, reason_phrase, ErrorResponse};
use thiserror::Error;

use crate::services::directory::DirectoryError;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("credential lookup failed: {0}")]
    Directory(#[from] DirectoryError),

    #[error("password check failed: {0}")]
    Password(#[from] PasswordError),

    #[error("token issuance failed: {0}")]
    Token(#[from] TokenError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AuthError {
    fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => error_codes::MISSING_CREDENTIALS,
            AuthError::InvalidCredentials => error_codes::INVALID_CREDENTIALS,
            AuthError::Directory(_) => error_codes::UPSTREAM_FAILED,
            AuthError::Password(_) | AuthError::Token(_) | AuthError::Internal(_) => {
                error_codes::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => error_types::VALIDATION_ERROR,
            AuthError::InvalidCredentials => error_types::AUTHENTICATION_ERROR,
            _ => error_types::SERVER_ERROR,
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "login failed");
            "Server error during login".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorResponse::new(
            reason_phrase(status.as_u16()),
            &message,
            status.as_u16(),
            self.kind(),
            self.code(),
        ))
    }
}
