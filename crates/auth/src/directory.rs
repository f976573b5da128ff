//! User directory contract consumed by login.
//!
//! The directory is backed by the user repository in production; this crate
//! only needs credential lookup by name and a read view by id.

use std::sync::OnceLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::password::{hash_password, verify_password};
use crate::{Identity, Role, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub identity: Identity,
    pub password_hash: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),

    #[error("user '{0}' already exists")]
    Duplicate(String),

    #[error("invalid registration: {0}")]
    Invalid(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DirectoryError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, DirectoryError>;

    async fn list(&self) -> Result<Vec<UserRecord>, DirectoryError>;

    /// Create a user under the next free id.
    ///
    /// Fails with `Duplicate` when the username is taken.
    async fn register(
        &self,
        username: &str,
        password: &str,
        roles: Vec<Role>,
    ) -> Result<Identity, DirectoryError>;
}

/// Check a username/password pair. `Ok(None)` means bad credentials.
pub async fn authenticate(
    directory: &dyn UserDirectory,
    username: &str,
    password: &str,
) -> Result<Option<Identity>, DirectoryError> {
    let Some(record) = directory.find_by_username(username).await? else {
        // Match the argon2 cost of a known user.
        if let Some(phc) = dummy_hash() {
            verify_password(password, phc);
        }
        return Ok(None);
    };

    if verify_password(password, &record.password_hash) {
        Ok(Some(record.identity))
    } else {
        Ok(None)
    }
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("larder-unknown-user").ok())
        .as_deref()
}
