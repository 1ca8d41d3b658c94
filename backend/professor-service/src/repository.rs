/// Professor storage
///
/// Email and phone are each unique across all professors.
use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{NewProfessor, ProfessorChanges, ProfessorRecord};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("email or phone already registered")]
    Duplicate,
}

#[async_trait]
pub trait ProfessorRepository: Send + Sync {
    /// Store all professors or none of them.
    async fn create_many(
        &self,
        professors: Vec<NewProfessor>,
    ) -> Result<Vec<ProfessorRecord>, RepositoryError>;

    async fn list(&self) -> Result<Vec<ProfessorRecord>, RepositoryError>;

    async fn find(&self, professor_id: i64) -> Result<Option<ProfessorRecord>, RepositoryError>;

    async fn find_by_email(&self, email: &str)
        -> Result<Option<ProfessorRecord>, RepositoryError>;

    /// Whether any professor other than `except` uses `email` or `phone`.
    async fn contact_taken(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        except: Option<i64>,
    ) -> Result<bool, RepositoryError>;

    async fn update(
        &self,
        professor_id: i64,
        changes: ProfessorChanges,
    ) -> Result<Option<ProfessorRecord>, RepositoryError>;

    async fn delete(&self, professor_id: i64) -> Result<Option<ProfessorRecord>, RepositoryError>;
}

#[derive(Default)]
struct Inner {
    last_id: i64,
    records: BTreeMap<i64, ProfessorRecord>,
}

impl Inner {
    fn taken(&self, email: Option<&str>, phone: Option<&str>, except: Option<i64>) -> bool {
        self.records.values().any(|r| {
            Some(r.professor_id) != except
                && (email == Some(r.email.as_str()) || phone == Some(r.phone.as_str()))
        })
    }
}

#[derive(Default)]
pub struct InMemoryProfessorRepository {
    inner: RwLock<Inner>,
}

impl InMemoryProfessorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfessorRepository for InMemoryProfessorRepository {
    async fn create_many(
        &self,
        professors: Vec<NewProfessor>,
    ) -> Result<Vec<ProfessorRecord>, RepositoryError> {
        let mut inner = self.inner.write().await;

        {
            let mut emails = HashSet::new();
            let mut phones = HashSet::new();
            for p in &professors {
                if inner.taken(Some(&p.email), Some(&p.phone), None)
                    || !emails.insert(p.email.as_str())
                    || !phones.insert(p.phone.as_str())
                {
                    return Err(RepositoryError::Duplicate);
                }
            }
        }

        let mut created = Vec::with_capacity(professors.len());
        for p in professors {
            inner.last_id += 1;
            let record = ProfessorRecord {
                professor_id: inner.last_id,
                name: p.name,
                email: p.email,
                phone: p.phone,
                password_hash: p.password_hash,
            };
            inner.records.insert(record.professor_id, record.clone());
            created.push(record);
        }
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<ProfessorRecord>, RepositoryError> {
        Ok(self.inner.read().await.records.values().cloned().collect())
    }

    async fn find(&self, professor_id: i64) -> Result<Option<ProfessorRecord>, RepositoryError> {
        Ok(self.inner.read().await.records.get(&professor_id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProfessorRecord>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.records.values().find(|r| r.email == email).cloned())
    }

    async fn contact_taken(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        except: Option<i64>,
    ) -> Result<bool, RepositoryError> {
        Ok(self.inner.read().await.taken(email, phone, except))
    }

    async fn update(
        &self,
        professor_id: i64,
        changes: ProfessorChanges,
    ) -> Result<Option<ProfessorRecord>, RepositoryError> {
        let mut inner = self.inner.write().await;

        if inner.taken(
            changes.email.as_deref(),
            changes.phone.as_deref(),
            Some(professor_id),
        ) {
            return Err(RepositoryError::Duplicate);
        }

        let Some(record) = inner.records.get_mut(&professor_id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            record.name = name;
        }
        if let Some(email) = changes.email {
            record.email = email;
        }
        if let Some(phone) = changes.phone {
            record.phone = phone;
        }
        if let Some(hash) = changes.password_hash {
            record.password_hash = hash;
        }
        Ok(Some(record.clone()))
    }

    async fn delete(&self, professor_id: i64) -> Result<Option<ProfessorRecord>, RepositoryError> {
        Ok(self.inner.write().await.records.remove(&professor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_professor(email: &str, phone: &str) -> NewProfessor {
        NewProfessor {
            name: "Prof".into(),
            email: email.into(),
            phone: phone.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn test_email_and_phone_are_unique() {
        let repo = InMemoryProfessorRepository::new();
        repo.create_many(vec![new_professor("a@x.com", "555-0001")])
            .await
            .unwrap();

        let same_phone = repo
            .create_many(vec![new_professor("b@x.com", "555-0001")])
            .await;
        assert!(matches!(same_phone, Err(RepositoryError::Duplicate)));

        let same_batch = repo
            .create_many(vec![
                new_professor("c@x.com", "555-0003"),
                new_professor("c@x.com", "555-0004"),
            ])
            .await;
        assert!(same_batch.is_err());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let repo = InMemoryProfessorRepository::new();
        repo.create_many(vec![
            new_professor("a@x.com", "555-0001"),
            new_professor("b@x.com", "555-0002"),
        ])
        .await
        .unwrap();

        let updated = repo
            .update(
                1,
                ProfessorChanges {
                    phone: Some("555-0009".into()),
                    password_hash: Some("rehashed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.email, "a@x.com");
        assert_eq!(updated.phone, "555-0009");
        assert_eq!(updated.password_hash, "rehashed");

        // Keeping one's own phone is not a conflict.
        assert!(repo
            .update(
                2,
                ProfessorChanges {
                    phone: Some("555-0002".into()),
                    ..Default::default()
                },
            )
            .await
            .is_ok());
        assert!(repo
            .contact_taken(Some("b@x.com"), None, Some(1))
            .await
            .unwrap());
        assert!(!repo
            .contact_taken(Some("b@x.com"), None, Some(2))
            .await
            .unwrap());
    }
}
