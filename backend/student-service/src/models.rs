/// Student records and the bodies of the student API
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stored student, password hash included. Never serialized directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub student_id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl StudentRecord {
    pub fn public_view(&self) -> Student {
        Student {
            student_id: self.student_id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    pub fn credentials(&self) -> CredentialRecord {
        CredentialRecord {
            id: self.student_id,
            name: self.name.clone(),
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
        }
    }
}

/// Student as returned by the public API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: i64,
    pub name: String,
    pub email: String,
}

/// Student ready to be stored; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct StudentChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Either a single object or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "email is invalid"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

impl CreateStudentRequest {
    /// Names are trimmed, emails trimmed and lowercased.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "email is invalid"))]
    pub email: Option<String>,
}

impl UpdateStudentRequest {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.as_deref().map(normalize_email),
        }
    }

    pub fn into_changes(self) -> StudentChanges {
        StudentChanges {
            name: self.name,
            email: self.email,
        }
    }
}

/// `{message, data}` envelope of update and delete.
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentMessage {
    pub message: String,
    pub data: Student,
}

/// Credentials handed to the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialQuery {
    pub email: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
