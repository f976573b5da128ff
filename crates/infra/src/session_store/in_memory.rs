use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use larder_auth::{SessionId, SessionRecord, SessionStore, SessionStoreError};

/// In-memory session store for tests/dev.
///
/// Expired records are invisible to readers and pruned on every write.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        match self.inner.read() {
            Ok(map) => map.values().filter(|r| r.is_live(now)).count(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> SessionStoreError {
    SessionStoreError::Unavailable("session map lock poisoned".to_string())
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, record: SessionRecord) -> Result<(), SessionStoreError> {
        let now = Utc::now();
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.retain(|_, r| r.is_live(now));
        if record.is_live(now) {
            map.insert(record.session_id, record);
        }
        Ok(())
    }

    async fn get(&self, session_id: SessionId) -> Result<Option<SessionRecord>, SessionStoreError> {
        let now = Utc::now();
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&session_id).filter(|r| r.is_live(now)).cloned())
    }

    async fn revoke(&self, session_id: SessionId) -> Result<bool, SessionStoreError> {
        let now = Utc::now();
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let removed = map.remove(&session_id).is_some_and(|r| r.is_live(now));
        tracing::debug!(session_id = %session_id, removed, "session revoked");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use larder_auth::UserId;

    use super::*;

    fn record(expires_in: Duration) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            session_id: SessionId::new(),
            user_id: UserId::new(1).unwrap(),
            issued_at: now,
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn put_get_revoke() {
        let store = InMemorySessionStore::new();
        let rec = record(Duration::minutes(15));

        store.put(rec.clone()).await.unwrap();
        assert_eq!(store.get(rec.session_id).await.unwrap(), Some(rec.clone()));
        assert!(store.is_active(rec.session_id, Utc::now()).await.unwrap());

        assert!(store.revoke(rec.session_id).await.unwrap());
        assert_eq!(store.get(rec.session_id).await.unwrap(), None);
        assert!(!store.revoke(rec.session_id).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn expired_records_are_invisible_and_pruned() {
        let store = InMemorySessionStore::new();
        let stale = record(Duration::seconds(-5));
        let live = record(Duration::minutes(5));

        store.put(stale.clone()).await.unwrap();
        assert_eq!(store.get(stale.session_id).await.unwrap(), None);

        store.put(live.clone()).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(!store.is_active(stale.session_id, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_session_is_inactive() {
        let store = InMemorySessionStore::new();
        assert!(!store.is_active(SessionId::new(), Utc::now()).await.unwrap());
    }
}
