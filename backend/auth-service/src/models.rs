/// Request and response bodies of the login API
use crypto_core::jwt::Role;
use serde::{Deserialize, Serialize};

/// Which directory a login is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Student,
    Professor,
}

impl AccountKind {
    /// Role granted by a successful login.
    pub fn role(self) -> Role {
        match self {
            AccountKind::Student => Role::Student,
            AccountKind::Professor => Role::Professor,
        }
    }

    /// Collection segment used by the owning service's internal API.
    pub fn collection(self) -> &'static str {
        match self {
            AccountKind::Student => "students",
            AccountKind::Professor => "professors",
        }
    }
}

/// Both fields are optional at the wire level so a missing field is reported
/// as a 400 with our own body rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    /// `(email, password)` when both are present and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let email = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
        let password = self.password.as_deref().filter(|p| !p.is_empty())?;
        Some((email, password))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserSummary,
}

/// Stored credentials as returned by the student/professor services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}
