//! Credential store: registry of user records keyed by email.
//!
//! `AppState` holds an `Arc<dyn CredentialStore>`. The only backend is
//! `InMemoryUserStore`, which lives for the lifetime of the process; a durable
//! backend slots in behind the same trait.

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::{NewUser, PublicUser, UserRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("a user with this email already exists")]
    EmailTaken,

    #[error("user not found")]
    NotFound,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Appends a record with a freshly assigned id. Rejects a duplicate email.
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Exact-match lookup on the email key.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// All records, without password material, in insertion order.
    async fn list(&self) -> Result<Vec<PublicUser>, StoreError>;

    /// Replaces the stored hash of an existing record.
    async fn set_password_hash(&self, email: &str, password_hash: String) -> Result<(), StoreError>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        // Check and insert under one write lock so concurrent signups cannot both win.
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<PublicUser>, StoreError> {
        Ok(self.users.read().iter().map(PublicUser::from).collect())
    }

    async fn set_password_hash(&self, email: &str, password_hash: String) -> Result<(), StoreError> {
        let mut users = self.users.write();
        let record = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or(StoreError::NotFound)?;
        record.password_hash = password_hash;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str, hash: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("A", "a@x.com", "h1")).await.unwrap();
        let b = store.create(new_user("B", "b@x.com", "h2")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_regardless_of_password() {
        let store = InMemoryUserStore::new();
        store.create(new_user("Jo", "jo@x.com", "h1")).await.unwrap();

        let err = store
            .create(new_user("Other", "jo@x.com", "completely-different"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::EmailTaken);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_email_is_exact() {
        let store = InMemoryUserStore::new();
        store.create(new_user("Jo", "jo@x.com", "h1")).await.unwrap();

        assert!(store.find_by_email("jo@x.com").await.unwrap().is_some());
        assert!(store.find_by_email("JO@x.com").await.unwrap().is_none());
        assert!(store.find_by_email("nobody@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = InMemoryUserStore::new();
        store.create(new_user("A", "a@x.com", "h")).await.unwrap();
        store.create(new_user("B", "b@x.com", "h")).await.unwrap();

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_set_password_hash() {
        let store = InMemoryUserStore::new();
        store.create(new_user("Jo", "jo@x.com", "old")).await.unwrap();

        store
            .set_password_hash("jo@x.com", "new".to_string())
            .await
            .unwrap();
        let record = store.find_by_email("jo@x.com").await.unwrap().unwrap();
        assert_eq!(record.password_hash, "new");

        let err = store
            .set_password_hash("ghost@x.com", "x".to_string())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }
}
