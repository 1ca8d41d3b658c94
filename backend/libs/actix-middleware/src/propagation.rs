//! Caller credential propagation for outbound HTTP calls.
//!
//! When one service calls another on behalf of a user (professor fetching
//! student profiles) the downstream service must see the same identity. The
//! caller's `Authorization` header is forwarded verbatim together with the
//! correlation id; nothing is re-signed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! async fn student_profiles(forwarded: ForwardedAuth, client: web::Data<StudentClient>) -> ... {
//!     let request = forwarded.apply(http.get(url));
//!     ...
//! }
//! ```

use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, FromRequest, HttpRequest};

use crate::correlation_id::{get_correlation_id, CORRELATION_ID_HEADER};
use crate::error::AuthzError;

/// Headers to replay on a downstream request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedAuth {
    /// Full header value, scheme included
    authorization: Option<String>,
    correlation_id: Option<String>,
}

impl ForwardedAuth {
    pub fn capture(req: &HttpRequest) -> Self {
        Self {
            authorization: req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
            correlation_id: get_correlation_id(req).map(|c| c.0),
        }
    }

    /// Credentials for a service calling on its own behalf.
    pub fn bearer(token: &str) -> Self {
        Self {
            authorization: Some(format!("Bearer {token}")),
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Attach the captured headers to an outbound request.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = match &self.authorization {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        };
        match &self.correlation_id {
            Some(id) => request.header(CORRELATION_ID_HEADER, id),
            None => request,
        }
    }
}

/// Extraction fails with 401 when there is nothing to forward.
impl FromRequest for ForwardedAuth {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let forwarded = ForwardedAuth::capture(req);
        if forwarded.authorization.is_none() {
            return ready(Err(AuthzError::MissingToken.into()));
        }
        ready(Ok(forwarded))
    }
}
