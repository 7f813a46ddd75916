use serde::{Deserialize, Serialize};

/// A registered user as held by the credential store.
/// `password_hash` is an argon2 PHC string; plaintext is never kept.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Outward view of a user record. Has no password field at all, so it cannot leak one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&UserRecord> for PublicUser {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
        }
    }
}

/// Input for creating a record. The caller hashes the password first.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}
