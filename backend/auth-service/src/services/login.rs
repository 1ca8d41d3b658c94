/// Credential check and token issuance
use std::sync::Arc;

use crypto_core::jwt::{RoleSet, TokenIssuer};
use crypto_core::password;
use tracing::{info, warn};

use crate::error::{AuthError, Result};
use crate::models::{AccountKind, LoginResponse, UserSummary};
use crate::services::directory::CredentialDirectory;

#[derive(Clone)]
pub struct LoginService {
    directory: Arc<dyn CredentialDirectory>,
    issuer: Arc<TokenIssuer>,
}

impl LoginService {
    pub fn new(directory: Arc<dyn CredentialDirectory>, issuer: Arc<TokenIssuer>) -> Self {
        Self { directory, issuer }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub async fn login(
        &self,
        kind: AccountKind,
        email: &str,
        password: &str,
        correlation_id: Option<&str>,
    ) -> Result<LoginResponse> {
        let Some(record) = self.directory.find(kind, email, correlation_id).await? else {
            warn!(?kind, "login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        // Hash verification is CPU bound; run it on the blocking pool.
        let password = password.to_string();
        let stored_hash = record.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || {
            password::verify_password(&password, &stored_hash)
        })
        .await
        .map_err(|e| AuthError::Internal(format!("password check task failed: {e}")))??;

        if !matches {
            warn!(?kind, subject_id = record.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.issuer.issue(record.id, RoleSet::from([kind.role()]))?;
        info!(?kind, subject_id = record.id, "login succeeded");

        Ok(LoginResponse {
            access_token,
            user: UserSummary {
                id: record.id,
                name: record.name,
            },
        })
    }
}
