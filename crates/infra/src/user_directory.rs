use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use larder_auth::{DirectoryError, Identity, Role, UserDirectory, UserId, UserRecord, hash_password};

/// In-memory user directory for tests/dev and the bootstrap admin account.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<BTreeMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user, hashing `password` with argon2.
    pub fn insert(&self, identity: Identity, password: &str) -> Result<(), DirectoryError> {
        let password_hash = hash(password)?;

        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&identity.user_id()) {
            return Err(DirectoryError::Duplicate(identity.username().to_string()));
        }
        store(&mut map, identity, password_hash)
    }
}

fn hash(password: &str) -> Result<String, DirectoryError> {
    hash_password(password).map_err(|e| DirectoryError::Unavailable(e.to_string()))
}

fn store(
    map: &mut BTreeMap<UserId, UserRecord>,
    identity: Identity,
    password_hash: String,
) -> Result<(), DirectoryError> {
    if map.values().any(|r| r.identity.username() == identity.username()) {
        return Err(DirectoryError::Duplicate(identity.username().to_string()));
    }

    map.insert(
        identity.user_id(),
        UserRecord {
            identity,
            password_hash,
        },
    );
    Ok(())
}

fn poisoned() -> DirectoryError {
    DirectoryError::Unavailable("user map lock poisoned".to_string())
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|r| r.identity.username() == username).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&user_id).cloned())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
        roles: Vec<Role>,
    ) -> Result<Identity, DirectoryError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DirectoryError::Invalid("username must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(DirectoryError::Invalid("password must not be empty".to_string()));
        }

        let password_hash = hash(password)?;

        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let next = map.keys().next_back().map_or(1, |id| id.get().saturating_add(1));
        let user_id = UserId::new(next).map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        let identity = Identity::new(user_id, username, roles);
        store(&mut map, identity.clone(), password_hash)?;
        tracing::info!(user_id = %user_id, username, "user registered");
        Ok(identity)
    }
}
