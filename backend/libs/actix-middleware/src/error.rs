//! Rejections produced by the middleware stack.
//!
//! Every variant renders as the shared [`ErrorResponse`] body. Token failures
//! are collapsed into one 401 message so callers never learn which check
//! failed; the precise cause is logged instead.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use crypto_core::VerifyError;
use ::error_types::{error_codes, error_types, reason_phrase, ErrorResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken(#[source] VerifyError),

    #[error("Access denied: insufficient permissions")]
    Forbidden,

    #[error("Access denied: you can only access your own records")]
    NotOwner,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Too many requests, please try again later")]
    RateLimited { retry_after_secs: u64 },

    #[error("authorization unavailable: {0}")]
    Internal(String),
}

impl AuthzError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthzError::MissingToken => error_codes::TOKEN_MISSING,
            AuthzError::InvalidToken(_) | AuthzError::Unauthenticated => {
                error_codes::TOKEN_INVALID
            }
            AuthzError::Forbidden => error_codes::ACCESS_DENIED,
            AuthzError::NotOwner => error_codes::NOT_RESOURCE_OWNER,
            AuthzError::RateLimited { .. } => error_codes::RATE_LIMIT_ERROR,
            AuthzError::Internal(_) => error_codes::KEY_SET_UNAVAILABLE,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AuthzError::MissingToken | AuthzError::InvalidToken(_) | AuthzError::Unauthenticated => {
                error_types::AUTHENTICATION_ERROR
            }
            AuthzError::Forbidden | AuthzError::NotOwner => error_types::AUTHORIZATION_ERROR,
            AuthzError::RateLimited { .. } => error_types::RATE_LIMIT_ERROR,
            AuthzError::Internal(_) => error_types::SERVER_ERROR,
        }
    }

    /// Response body, tagged with the request's correlation id when known.
    pub fn to_body(&self, correlation_id: Option<String>) -> ErrorResponse {
        let status = self.status_code().as_u16();
        let message = match self {
            AuthzError::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };
        let body = ErrorResponse::new(
            reason_phrase(status),
            &message,
            status,
            self.kind(),
            self.code(),
        );
        match correlation_id {
            Some(id) => body.with_correlation_id(id),
            None => body,
        }
    }

    pub fn response_with(&self, correlation_id: Option<String>) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let AuthzError::RateLimited { retry_after_secs } = self {
            builder.insert_header(("Retry-After", retry_after_secs.to_string()));
        }
        builder.json(self.to_body(correlation_id))
    }
}

impl From<VerifyError> for AuthzError {
    fn from(err: VerifyError) -> Self {
        if err.is_internal() {
            AuthzError::Internal(err.to_string())
        } else {
            AuthzError::InvalidToken(err)
        }
    }
}

impl ResponseError for AuthzError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthzError::MissingToken | AuthzError::InvalidToken(_) | AuthzError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            AuthzError::Forbidden | AuthzError::NotOwner => StatusCode::FORBIDDEN,
            AuthzError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthzError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.response_with(None)
    }
}
