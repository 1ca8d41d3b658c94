/// Professor records and the bodies of the professor API
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfessorRecord {
    pub professor_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

impl ProfessorRecord {
    pub fn public_view(&self) -> Professor {
        Professor {
            professor_id: self.professor_id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    pub fn credentials(&self) -> CredentialRecord {
        CredentialRecord {
            id: self.professor_id,
            name: self.name.clone(),
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
        }
    }
}

/// Professor as returned by the public API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
    pub professor_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct NewProfessor {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

/// Fields to overwrite; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfessorChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
}

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
pub struct CreateProfessorRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "email is invalid"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 7, max = 20, message = "phone is invalid"))]
    pub phone: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

impl CreateProfessorRequest {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            phone: self.phone.trim().to_string(),
            password: self.password,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfessorRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "email is invalid"))]
    pub email: Option<String>,

    #[validate(length(min = 7, max = 20, message = "phone is invalid"))]
    pub phone: Option<String>,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: Option<String>,
}

impl UpdateProfessorRequest {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.as_deref().map(normalize_email),
            phone: self.phone.map(|p| p.trim().to_string()),
            password: self.password,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProfessors {
    pub message: String,
    pub saved_professor: Vec<Professor>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedProfessor {
    pub message: String,
    pub professor: Professor,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedProfessor {
    pub message: String,
    pub deleted_professor: Professor,
}

/// Student payloads are passed through as the student service sent them.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfiles {
    pub message: String,
    pub all_students: Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub message: String,
    pub student_data: Value,
}

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
