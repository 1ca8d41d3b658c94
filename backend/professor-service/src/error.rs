/// Error types for the professor service
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use crypto_core::PasswordError;
use ::error_types::{error_codes, error_types, reason_phrase, ErrorResponse};
use thiserror::Error;
use validator::ValidationErrors;

use crate::repository::RepositoryError;
use crate::services::UpstreamError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Email or phone already exists")]
    Duplicate,

    #[error("Professor not found")]
    NotFound,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("password hashing failed: {0}")]
    Password(#[from] PasswordError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate => AppError::Duplicate,
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
            AppError::Duplicate => error_codes::DUPLICATE_RECORD,
            AppError::NotFound => error_codes::PROFESSOR_NOT_FOUND,
            AppError::Upstream(UpstreamError::Timeout) => error_codes::UPSTREAM_TIMEOUT,
            AppError::Upstream(_) => error_codes::UPSTREAM_FAILED,
            _ => error_codes::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::InvalidRequest(_) => error_types::VALIDATION_ERROR,
            AppError::Duplicate => error_types::CONFLICT_ERROR,
            AppError::NotFound => error_types::NOT_FOUND_ERROR,
            AppError::Upstream(_) => error_types::UPSTREAM_ERROR,
            _ => error_types::SERVER_ERROR,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidRequest(_) | AppError::Duplicate => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Upstream(UpstreamError::Rejected { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Upstream(UpstreamError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // The student service's own answer is relayed as is.
        if let AppError::Upstream(UpstreamError::Rejected {
            body: Some(body), ..
        }) = self
        {
            return HttpResponse::build(status).json(body);
        }

        let message = match self {
            AppError::Upstream(UpstreamError::Rejected { .. }) => {
                "Student service rejected the request".to_string()
            }
            AppError::Upstream(err) => {
                tracing::error!(error = %err, "student service call failed");
                "Unable to fetch student data".to_string()
            }
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "request failed");
                "Internal Server Error".to_string()
            }
            _ => self.to_string(),
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
