/// Client for the student service
///
/// Calls are made on behalf of the requesting professor: the caller's
/// `Authorization` header and correlation id are forwarded, so the student
/// service applies its own role checks to the original identity.
use std::time::Duration;

use actix_middleware::ForwardedAuth;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("student service timed out")]
    Timeout,

    #[error("student service unreachable: {0}")]
    Unreachable(String),

    /// 401, 403 or 404 from the student service.
    #[error("student service rejected the request with {status}")]
    Rejected { status: u16, body: Option<Value> },

    #[error("student service answered {0}")]
    Status(u16),

    #[error("student service response is invalid: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Unreachable(err.to_string())
        }
    }
}

pub struct StudentClient {
    client: reqwest::Client,
    base_url: String,
}

impl StudentClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /api/students
    pub async fn list_students(&self, auth: &ForwardedAuth) -> Result<Value, UpstreamError> {
        self.get_json("/api/students", auth).await
    }

    /// GET /api/students/{student_id}
    pub async fn get_student(
        &self,
        student_id: i64,
        auth: &ForwardedAuth,
    ) -> Result<Value, UpstreamError> {
        self.get_json(&format!("/api/students/{student_id}"), auth)
            .await
    }

    async fn get_json(&self, path: &str, auth: &ForwardedAuth) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, correlation_id = auth.correlation_id().unwrap_or(""), "calling student service");

        let response = auth.apply(self.client.get(&url)).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                debug!(%url, status = status.as_u16(), "student service rejected request");
                let body = response.json::<Value>().await.ok();
                Err(UpstreamError::Rejected {
                    status: status.as_u16(),
                    body,
                })
            }
            _ => {
                warn!(%url, status = status.as_u16(), "student service failed");
                Err(UpstreamError::Status(status.as_u16()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = StudentClient::new("http://students:5003/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://students:5003");
    }
}
