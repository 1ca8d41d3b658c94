/// Credential lookup against the student and professor services
///
/// The auth service holds no account data. Each login asks the owning service
/// for the record matching the email, authenticating itself with a
/// short-lived `AUTH_SERVICE` token minted from its own key.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use actix_middleware::ForwardedAuth;
use async_trait::async_trait;
use crypto_core::jwt::{Role, RoleSet, TokenIssuer};
use crypto_core::TokenError;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AccountKind, CredentialRecord};

/// Subject id carried by service tokens.
pub const SERVICE_SUBJECT_ID: i64 = 0;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request timed out")]
    Timeout,

    #[error("directory unreachable: {0}")]
    Unreachable(String),

    #[error("directory answered {0}")]
    Status(u16),

    #[error("directory response is invalid: {0}")]
    Decode(String),

    #[error("failed to mint service token: {0}")]
    ServiceToken(#[from] TokenError),
}

impl From<reqwest::Error> for DirectoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DirectoryError::Timeout
        } else if err.is_decode() {
            DirectoryError::Decode(err.to_string())
        } else {
            DirectoryError::Unreachable(err.to_string())
        }
    }
}

#[async_trait]
pub trait CredentialDirectory: Send + Sync {
    /// `Ok(None)` when no account uses `email`.
    async fn find(
        &self,
        kind: AccountKind,
        email: &str,
        correlation_id: Option<&str>,
    ) -> Result<Option<CredentialRecord>, DirectoryError>;
}

/// Looks credentials up over HTTP.
pub struct HttpCredentialDirectory {
    client: reqwest::Client,
    student_service_url: String,
    professor_service_url: String,
    issuer: Arc<TokenIssuer>,
    service_token_ttl: Duration,
}

impl HttpCredentialDirectory {
    pub fn new(
        student_service_url: impl Into<String>,
        professor_service_url: impl Into<String>,
        issuer: Arc<TokenIssuer>,
        service_token_ttl: Duration,
        timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            student_service_url: student_service_url.into(),
            professor_service_url: professor_service_url.into(),
            issuer,
            service_token_ttl,
        })
    }

    fn endpoint(&self, kind: AccountKind) -> String {
        let base = match kind {
            AccountKind::Student => &self.student_service_url,
            AccountKind::Professor => &self.professor_service_url,
        };
        format!(
            "{}/internal/{}/credentials",
            base.trim_end_matches('/'),
            kind.collection()
        )
    }
}

#[async_trait]
impl CredentialDirectory for HttpCredentialDirectory {
    async fn find(
        &self,
        kind: AccountKind,
        email: &str,
        correlation_id: Option<&str>,
    ) -> Result<Option<CredentialRecord>, DirectoryError> {
        let token = self.issuer.issue_with_ttl(
            SERVICE_SUBJECT_ID,
            RoleSet::from([Role::AuthService]),
            self.service_token_ttl,
        )?;

        let mut auth = ForwardedAuth::bearer(&token);
        if let Some(id) = correlation_id {
            auth = auth.with_correlation_id(id);
        }

        let url = self.endpoint(kind);
        let response = auth
            .apply(self.client.get(&url).query(&[("email", email)]))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(?kind, "no account for email");
                Ok(None)
            }
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => {
                warn!(%url, status = status.as_u16(), "credential lookup rejected");
                Err(DirectoryError::Status(status.as_u16()))
            }
        }
    }
}

/// In-memory directory for local runs and tests.
#[derive(Default)]
pub struct StaticCredentialDirectory {
    records: RwLock<HashMap<(AccountKind, String), CredentialRecord>>,
}

impl StaticCredentialDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, kind: AccountKind, record: CredentialRecord) {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.insert((kind, record.email.to_lowercase()), record);
    }
}

#[async_trait]
impl CredentialDirectory for StaticCredentialDirectory {
    async fn find(
        &self,
        kind: AccountKind,
        email: &str,
        _correlation_id: Option<&str>,
    ) -> Result<Option<CredentialRecord>, DirectoryError> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(records.get(&(kind, email.to_lowercase())).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_core::test_utils::test_key_store;

    fn directory() -> HttpCredentialDirectory {
        HttpCredentialDirectory::new(
            "http://students:5003/",
            "http://professors:5002",
            Arc::new(TokenIssuer::new(Arc::new(test_key_store()))),
            Duration::from_secs(60),
            Duration::from_millis(200),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoints() {
        let dir = directory();
        assert_eq!(
            dir.endpoint(AccountKind::Student),
            "http://students:5003/internal/students/credentials"
        );
        assert_eq!(
            dir.endpoint(AccountKind::Professor),
            "http://professors:5002/internal/professors/credentials"
        );
    }

    #[tokio::test]
    async fn test_static_directory_is_case_insensitive_and_kind_scoped() {
        let dir = StaticCredentialDirectory::new();
        dir.insert(
            AccountKind::Student,
            CredentialRecord {
                id: 1,
                name: "Ada".into(),
                email: "Ada@Campus.edu".into(),
                password_hash: "x".into(),
            },
        );

        assert!(dir.find(AccountKind::Student, "ada@campus.edu", None).await.unwrap().is_some());
        assert!(dir.find(AccountKind::Professor, "ada@campus.edu", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_directory() {
        let dir = HttpCredentialDirectory::new(
            "http://127.0.0.1:1",
            "http://127.0.0.1:1",
            Arc::new(TokenIssuer::new(Arc::new(test_key_store()))),
            Duration::from_secs(60),
            Duration::from_millis(200),
        )
        .unwrap();

        let err = dir.find(AccountKind::Student, "a@x.com", None).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Unreachable(_) | DirectoryError::Timeout));
    }
}
