/// Error types for the student service
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use crypto_core::PasswordError;
use ::error_types::{error_codes, error_types, reason_phrase, ErrorResponse};
use thiserror::Error;
use validator::ValidationErrors;

use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Student with this email already exists")]
    DuplicateEmail,

    #[error("Student not found")]
    NotFound,

    #[error("password hashing failed: {0}")]
    Password(#[from] PasswordError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateEmail(_) => AppError::DuplicateEmail,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        AppError::Validation(format!("Invalid fields: {}", fields.join(", ")))
    }
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => error_codes::VALIDATION_FAILED,
            AppError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            AppError::DuplicateEmail => error_codes::DUPLICATE_RECORD,
            AppError::NotFound => error_codes::STUDENT_NOT_FOUND,
            _ => error_codes::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::InvalidRequest(_) => error_types::VALIDATION_ERROR,
            AppError::DuplicateEmail => error_types::CONFLICT_ERROR,
            AppError::NotFound => error_types::NOT_FOUND_ERROR,
            _ => error_types::SERVER_ERROR,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidRequest(_) | AppError::DuplicateEmail => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal Server Error".to_string()
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
