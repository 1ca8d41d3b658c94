/// Student storage
///
/// The service talks to storage through [`StudentRepository`]. The in-memory
/// implementation assigns sequential ids starting at 1 and enforces email
/// uniqueness across the whole batch of a create.
use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{NewStudent, StudentChanges, StudentRecord};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("email {0} is already registered")]
    DuplicateEmail(String),
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Store all students or none of them.
    async fn create_many(
        &self,
        students: Vec<NewStudent>,
    ) -> Result<Vec<StudentRecord>, RepositoryError>;

    async fn list(&self) -> Result<Vec<StudentRecord>, RepositoryError>;

    async fn find(&self, student_id: i64) -> Result<Option<StudentRecord>, RepositoryError>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<StudentRecord>, RepositoryError>;

    async fn update(
        &self,
        student_id: i64,
        changes: StudentChanges,
    ) -> Result<Option<StudentRecord>, RepositoryError>;

    async fn delete(&self, student_id: i64) -> Result<Option<StudentRecord>, RepositoryError>;
}

#[derive(Default)]
struct Inner {
    last_id: i64,
    records: BTreeMap<i64, StudentRecord>,
}

impl Inner {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.records
            .values()
            .any(|r| r.email == email && Some(r.student_id) != except)
    }
}

#[derive(Default)]
pub struct InMemoryStudentRepository {
    inner: RwLock<Inner>,
}

impl InMemoryStudentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StudentRepository for InMemoryStudentRepository {
    async fn create_many(
        &self,
        students: Vec<NewStudent>,
    ) -> Result<Vec<StudentRecord>, RepositoryError> {
        let mut inner = self.inner.write().await;

        {
            let mut batch = HashSet::new();
            for student in &students {
                if inner.email_taken(&student.email, None) || !batch.insert(student.email.as_str())
                {
                    return Err(RepositoryError::DuplicateEmail(student.email.clone()));
                }
            }
        }

        let mut created = Vec::with_capacity(students.len());
        for student in students {
            inner.last_id += 1;
            let record = StudentRecord {
                student_id: inner.last_id,
                name: student.name,
                email: student.email,
                password_hash: student.password_hash,
            };
            inner.records.insert(record.student_id, record.clone());
            created.push(record);
        }
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<StudentRecord>, RepositoryError> {
        Ok(self.inner.read().await.records.values().cloned().collect())
    }

    async fn find(&self, student_id: i64) -> Result<Option<StudentRecord>, RepositoryError> {
        Ok(self.inner.read().await.records.get(&student_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<StudentRecord>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.records.values().find(|r| r.email == email).cloned())
    }

    async fn update(
        &self,
        student_id: i64,
        changes: StudentChanges,
    ) -> Result<Option<StudentRecord>, RepositoryError> {
        let mut inner = self.inner.write().await;

        if let Some(email) = &changes.email {
            if inner.email_taken(email, Some(student_id)) {
                return Err(RepositoryError::DuplicateEmail(email.clone()));
            }
        }

        let Some(record) = inner.records.get_mut(&student_id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            record.name = name;
        }
        if let Some(email) = changes.email {
            record.email = email;
        }
        Ok(Some(record.clone()))
    }

    async fn delete(&self, student_id: i64) -> Result<Option<StudentRecord>, RepositoryError> {
        Ok(self.inner.write().await.records.remove(&student_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_student(name: &str, email: &str) -> NewStudent {
        NewStudent {
            name: name.into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let repo = InMemoryStudentRepository::new();
        let created = repo
            .create_many(vec![new_student("Ada", "a@x.com"), new_student("Alan", "t@x.com")])
            .await
            .unwrap();
        assert_eq!(created[0].student_id, 1);
        assert_eq!(created[1].student_id, 2);

        let next = repo.create_many(vec![new_student("Grace", "g@x.com")]).await.unwrap();
        assert_eq!(next[0].student_id, 3);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejects_whole_batch() {
        let repo = InMemoryStudentRepository::new();
        repo.create_many(vec![new_student("Ada", "a@x.com")]).await.unwrap();

        let err = repo
            .create_many(vec![new_student("Alan", "t@x.com"), new_student("Ada 2", "a@x.com")])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateEmail(e) if e == "a@x.com"));
        assert!(repo.find_by_email("t@x.com").await.unwrap().is_none());

        let within_batch = repo
            .create_many(vec![new_student("B", "b@x.com"), new_student("B", "b@x.com")])
            .await;
        assert!(within_batch.is_err());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = InMemoryStudentRepository::new();
        repo.create_many(vec![new_student("Ada", "a@x.com"), new_student("Alan", "t@x.com")])
            .await
            .unwrap();

        let updated = repo
            .update(
                1,
                StudentChanges {
                    name: Some("Ada L.".into()),
                    email: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.email, "a@x.com");

        let taken = repo
            .update(
                1,
                StudentChanges {
                    name: None,
                    email: Some("t@x.com".into()),
                },
            )
            .await;
        assert!(matches!(taken, Err(RepositoryError::DuplicateEmail(_))));

        assert!(repo.update(99, StudentChanges::default()).await.unwrap().is_none());
        assert_eq!(repo.delete(2).await.unwrap().unwrap().name, "Alan");
        assert!(repo.delete(2).await.unwrap().is_none());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }
}
